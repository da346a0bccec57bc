use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported hardware: {0}")]
    UnsupportedHardware(String),

    #[error("MSR device unavailable: {0}")]
    MsrDevice(String),

    #[error("MSR operation failed: {0}")]
    Msr(#[from] vidflow_raw::MsrError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VidflowError>;
