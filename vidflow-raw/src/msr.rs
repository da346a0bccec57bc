//! MSR (Model-Specific Register) read/write primitives
//!
//! This module provides low-level MSR access through `/dev/cpu/*/msr`.
//! Higher-level orchestration (bounds checks, merge-and-write) lives in
//! vidflow-cli.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;

pub type Result<T> = std::result::Result<T, MsrError>;

/// Errors that can occur during MSR operations
#[derive(Debug, thiserror::Error)]
pub enum MsrError {
    #[error("Failed to open MSR device for CPU {cpu}: {source}")]
    OpenFailed { cpu: u32, source: std::io::Error },

    #[error("Failed to read MSR 0x{msr:X} on CPU {cpu}: {source}")]
    ReadFailed {
        cpu: u32,
        msr: u64,
        source: std::io::Error,
    },

    #[error("Failed to write MSR 0x{msr:X} on CPU {cpu}: {source}")]
    WriteFailed {
        cpu: u32,
        msr: u64,
        source: std::io::Error,
    },

    #[error("Failed to seek to MSR 0x{msr:X} on CPU {cpu}: {source}")]
    SeekFailed {
        cpu: u32,
        msr: u64,
        source: std::io::Error,
    },
}

/// Read a 64-bit value from an MSR
///
/// # Arguments
///
/// * `cpu` - CPU core number (0-indexed)
/// * `msr` - MSR address (e.g., 0xC0010064 for the P-state 0 configuration)
///
/// # Errors
///
/// Returns an error if:
/// - The MSR device cannot be opened (requires root/CAP_SYS_RAWIO)
/// - The MSR address is invalid
/// - The MSR is not readable
///
/// # Example
///
/// ```ignore
/// use vidflow_raw::read_msr;
///
/// let value = read_msr(0, 0xC0010064)?;
/// println!("MSR 0xC0010064 = 0x{:016X}", value);
/// ```
pub fn read_msr(cpu: u32, msr: u64) -> Result<u64> {
    let path = format!("/dev/cpu/{cpu}/msr");
    let mut file = File::open(&path).map_err(|e| MsrError::OpenFailed { cpu, source: e })?;

    file.seek(SeekFrom::Start(msr))
        .map_err(|e| MsrError::SeekFailed {
            cpu,
            msr,
            source: e,
        })?;

    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)
        .map_err(|e| MsrError::ReadFailed {
            cpu,
            msr,
            source: e,
        })?;

    Ok(u64::from_le_bytes(buffer))
}

/// Write a 64-bit value to an MSR
///
/// # Arguments
///
/// * `cpu` - CPU core number (0-indexed)
/// * `msr` - MSR address (e.g., 0xC0010064 for the P-state 0 configuration)
/// * `value` - 64-bit value to write
///
/// # Errors
///
/// Returns an error if:
/// - The MSR device cannot be opened (requires root/CAP_SYS_RAWIO)
/// - The MSR address is invalid
/// - The MSR is read-only
///
/// # Safety
///
/// Writing incorrect values to MSRs can cause system instability or crashes.
/// In particular, a too-low VID can hang the machine outright. Callers must
/// only write values derived from a fresh read of the same register, with
/// unrelated bits preserved.
///
/// # Example
///
/// ```ignore
/// use vidflow_raw::{read_msr, write_msr};
/// use vidflow_raw::current_arch::pstate;
///
/// let old = read_msr(0, pstate::msr::PSTATE_CONFIG[2])?;
/// let new = (old & !pstate::VID_MASK) | ((0x30 as u64) << pstate::VID_SHIFT);
///
/// write_msr(0, pstate::msr::PSTATE_CONFIG[2], new)?;
/// ```
pub fn write_msr(cpu: u32, msr: u64, value: u64) -> Result<()> {
    let path = format!("/dev/cpu/{cpu}/msr");
    let mut file = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_SYNC) // Ensure synchronous writes
        .open(&path)
        .map_err(|e| MsrError::OpenFailed { cpu, source: e })?;

    file.seek(SeekFrom::Start(msr))
        .map_err(|e| MsrError::SeekFailed {
            cpu,
            msr,
            source: e,
        })?;

    file.write_all(&value.to_le_bytes())
        .map_err(|e| MsrError::WriteFailed {
            cpu,
            msr,
            source: e,
        })?;

    Ok(())
}
