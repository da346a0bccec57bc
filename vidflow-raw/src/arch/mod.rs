//! Architecture-specific register definitions
//!
//! Each AMD processor family places its P-state machinery at different MSR
//! addresses and encodes VID/divisor fields differently. This module provides
//! family-specific definitions organized by CPU family.
//!
//! ## Supported Families
//!
//! - **Family 14h** (`family14h` feature) - Ontario/Zacate APUs
//!   (C-30, C-50, C-60, E-240, E-350, E-450)

#[cfg(feature = "family14h")]
pub mod family14h;
