//! # vidflow-raw
//!
//! Hardware register definitions for AMD P-state voltage and frequency control.
//!
//! This crate provides type-safe abstractions over MSR (Model-Specific Register)
//! access and hardware-specific constants for AMD processor families that expose
//! software P-state control, starting with Family 14h (Ontario/Zacate APUs:
//! C-30, C-50, C-60, E-240, E-350, E-450).
//!
//! ## Features
//!
//! Select the target processor family via feature flags:
//! - `family14h` (default) - AMD Family 14h Models 00h-0Fh register definitions
//!
//! ## Usage
//!
//! ```ignore
//! use vidflow_raw::current_arch::pstate;
//! use vidflow_raw::{read_msr, RegisterLayout};
//!
//! // Decode the P-state 0 configuration register
//! let raw = read_msr(0, pstate::msr::PSTATE_CONFIG[0])?;
//! let config = pstate::PstateConfig::from_msr_value(raw);
//!
//! println!("P-state 0: vid 0x{:02X} ({:.4} V)", config.cpu_vid, config.voltage());
//! ```

pub mod arch;
pub mod msr;
pub mod register;

// Re-export for convenience
pub use msr::{read_msr, write_msr, MsrError, Result};
pub use register::RegisterLayout;

// Export current processor family based on feature flag
#[cfg(feature = "family14h")]
pub use arch::family14h as current_arch;
