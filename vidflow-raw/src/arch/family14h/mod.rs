//! AMD Family 14h (Ontario/Zacate) register definitions
//!
//! This module provides hardware register definitions for AMD Family 14h
//! Models 00h-0Fh processors (model names C-30, C-50, C-60, E-240, E-350,
//! E-450).
//!
//! ## P-state Machinery
//!
//! - **P-state configuration** - eight per-P-state registers holding the
//!   serial-VID voltage code and the two-part clock divisor
//! - **P-state current limit** - hardware-enforced minimum and maximum
//!   usable P-state indices
//! - **COFVID status** - per-core currently active P-state, VID and divisor
//!
//! ## References
//!
//! - BIOS and Kernel Developer's Guide for AMD Family 14h Models 00h-0Fh
//!   Processors, 43170 Rev 3.06
//! - BIOS and Kernel Developer's Guide for AMD Family 10h Processors
//!   (serial VID voltage encoding)

pub mod pstate;
