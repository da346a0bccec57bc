//! Register transport seam over the raw MSR device
//!
//! Everything above this module talks to hardware through [`RegisterIo`],
//! so the orchestrator and reporters can be driven against an in-memory
//! register file in tests.

use crate::error::{Result, VidflowError};

/// Read/write access to one 64-bit register on one core.
pub trait RegisterIo {
    fn read(&self, core: u32, addr: u64) -> Result<u64>;
    fn write(&self, core: u32, addr: u64, value: u64) -> Result<()>;
}

/// Transport backed by `/dev/cpu/N/msr`.
#[derive(Debug, Default)]
pub struct DevMsr;

impl DevMsr {
    pub fn new() -> Self {
        Self
    }

    /// Check that the MSR device exists and is openable.
    ///
    /// Run before any register work so a missing module or missing
    /// privilege surfaces as a setup error rather than a mid-run failure.
    pub fn check_available() -> Result<()> {
        let path = "/dev/cpu/0/msr";
        if std::fs::metadata(path).is_err() {
            return Err(VidflowError::MsrDevice(format!(
                "cannot stat {path}; is the msr kernel module loaded? (modprobe msr)"
            )));
        }
        if let Err(e) = std::fs::File::open(path) {
            return Err(VidflowError::MsrDevice(format!(
                "cannot open {path}: {e}; root or CAP_SYS_RAWIO is required"
            )));
        }
        Ok(())
    }
}

impl RegisterIo for DevMsr {
    fn read(&self, core: u32, addr: u64) -> Result<u64> {
        let value = vidflow_raw::read_msr(core, addr)?;
        tracing::debug!("MSR read: CPU {} MSR 0x{:08X} = 0x{:016X}", core, addr, value);
        Ok(value)
    }

    fn write(&self, core: u32, addr: u64, value: u64) -> Result<()> {
        tracing::debug!("MSR write: CPU {} MSR 0x{:08X} = 0x{:016X}", core, addr, value);
        vidflow_raw::write_msr(core, addr, value)?;
        Ok(())
    }
}
