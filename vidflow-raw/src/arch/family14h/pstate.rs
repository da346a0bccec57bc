//! P-state register definitions for AMD Family 14h
//!
//! Family 14h exposes up to eight software-visible P-states. Each has a
//! configuration register holding the serial-VID voltage code and a two-part
//! clock divisor (DID). A shared limit register reports which P-state indices
//! the hardware actually allows, and a per-core status register reports the
//! P-state a core is currently running in.
//!
//! ## References
//!
//! - BIOS and Kernel Developer's Guide for AMD Family 14h Models 00h-0Fh
//!   Processors, 43170 Rev 3.06 - Section 2.5: P-states
//! - BIOS and Kernel Developer's Guide for AMD Family 10h Processors
//!   (serial VID encoding; the Family 14h formula matches it)

use crate::register::RegisterLayout;

/// MSR addresses for Family 14h P-state control
pub mod msr {
    /// P-state configuration registers, indexed by P-state number.
    ///
    /// One register per P-state, core-local but backed by a shared
    /// voltage/divisor plane.
    pub const PSTATE_CONFIG: [u64; 8] = [
        0xC001_0064,
        0xC001_0065,
        0xC001_0066,
        0xC001_0067,
        0xC001_0068,
        0xC001_0069,
        0xC001_006A,
        0xC001_006B,
    ];

    /// P-state Current Limit - hardware-enforced min/max usable P-state
    pub const PSTATE_CURRENT_LIMIT: u64 = 0xC001_0061;

    /// COFVID Status - per-core active P-state, VID and divisor
    pub const COFVID_STATUS: u64 = 0xC001_0071;
}

/// Bit position of the VID field in configuration and status registers
pub const VID_SHIFT: u32 = 9;

/// Mask selecting the VID field (bits 9-15)
pub const VID_MASK: u64 = 0x7F << VID_SHIFT;

/// Mask selecting the whole DID field (bits 0-8: MSD in 4-8, LSD in 0-3)
pub const DID_MASK: u64 = 0x1FF;

/// First VID code of the "voltage off" band
pub const VID_OFF_MIN: u8 = 0x7C;

/// Last VID code of the "voltage off" band
pub const VID_OFF_MAX: u8 = 0x7F;

/// Highest DID integer part the BKDG documents for this family
pub const DID_MSD_DOCUMENTED_MAX: u8 = 0x19;

/// Decode a 7-bit serial VID into volts.
///
/// VID codes 0x7C-0x7F encode "voltage rail off" and decode to 0 V. All
/// other codes follow the strictly decreasing SVI formula from the Family
/// 10h BKDG: `1.550 - 0.0125 * vid`.
///
/// The input is masked to 7 bits; the function is total over `u8`.
pub fn vid_voltage(vid: u8) -> f64 {
    let vid = vid & 0x7F;
    if (VID_OFF_MIN..=VID_OFF_MAX).contains(&vid) {
        0.0
    } else {
        1.550 - 0.0125 * f64::from(vid)
    }
}

/// Two-part clock divisor field (DID)
///
/// The divisor is split into an integer part ("MSD", bits 4-8) and a
/// fractional part in quarter steps ("LSD", bits 0-3, of which only the low
/// two bits are meaningful). The effective divisor is
/// `msd + lsd * 0.25 + 1`, so the minimum encodable divisor is 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DidField {
    /// Integer part of the divisor, minus one (bits 4-8)
    pub msd: u8,

    /// Fractional part of the divisor in quarter steps (bits 0-3)
    pub lsd: u8,
}

impl DidField {
    /// Extract the DID field from the low 9 bits of a register value.
    pub fn from_bits(value: u64) -> Self {
        Self {
            msd: ((value >> 4) & 0x1F) as u8,
            lsd: (value & 0xF) as u8,
        }
    }

    /// Pack the field into its bit positions (bits 0-8).
    pub fn bits(&self) -> u64 {
        (u64::from(self.msd & 0x1F) << 4) | u64::from(self.lsd & 0xF)
    }

    /// Effective clock divisor encoded by this field.
    pub fn divisor(&self) -> f64 {
        f64::from(self.msd) + f64::from(self.lsd) * 0.25 + 1.0
    }

    /// Encode a divisor value into MSD/LSD parts.
    ///
    /// Divisors below 1.0 are not encodable; the MSD saturates at zero.
    /// Fractional parts are rounded to the nearest quarter step.
    pub fn from_divisor(divisor: f64) -> Self {
        let whole = divisor.floor();
        Self {
            msd: (whole as u8).saturating_sub(1),
            lsd: ((divisor - whole) * 4.0).round() as u8,
        }
    }

    /// Whether both parts fall inside the range the BKDG documents.
    ///
    /// Out-of-range values have been observed on real parts; callers should
    /// warn but must not refuse to decode them.
    pub fn in_documented_range(&self) -> bool {
        self.msd <= DID_MSD_DOCUMENTED_MAX && self.lsd <= 3
    }
}

/// P-state configuration register layout (MSRC001_0064 through 6B)
///
/// ## Register Format
///
/// | Bits   | Field    | Description                                |
/// |--------|----------|--------------------------------------------|
/// | 0-3    | did_lsd  | Divisor fractional part (quarter steps)    |
/// | 4-8    | did_msd  | Divisor integer part, minus one            |
/// | 9-15   | cpu_vid  | Serial VID voltage code                    |
/// | 16-63  | reserved | Enable bit and IDD fields, left untouched  |
#[derive(Debug, Clone, Copy, Default)]
pub struct PstateConfig {
    /// Serial VID voltage code (7 bits)
    pub cpu_vid: u8,

    /// Clock divisor field
    pub did: DidField,
}

impl RegisterLayout for PstateConfig {
    fn to_msr_value(&self) -> u64 {
        (u64::from(self.cpu_vid & 0x7F) << VID_SHIFT) | (self.did.bits() & DID_MASK)
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            cpu_vid: ((value >> VID_SHIFT) & 0x7F) as u8,
            did: DidField::from_bits(value),
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.cpu_vid > 0x7F {
            return Err("VID must be <= 0x7F (7 bits)");
        }
        if self.did.msd > 0x1F {
            return Err("DID MSD must be <= 0x1F (5 bits)");
        }
        if self.did.lsd > 0xF {
            return Err("DID LSD must be <= 0xF (4 bits)");
        }
        Ok(())
    }
}

impl PstateConfig {
    /// Voltage encoded by the VID field, in volts.
    pub fn voltage(&self) -> f64 {
        vid_voltage(self.cpu_vid)
    }

    /// Effective clock divisor encoded by the DID field.
    pub fn divisor(&self) -> f64 {
        self.did.divisor()
    }
}

/// P-state Current Limit register layout (MSRC001_0061)
///
/// ## Register Format
///
/// | Bits   | Field          | Description                          |
/// |--------|----------------|--------------------------------------|
/// | 0-2    | min_pstate     | Lowest usable P-state index          |
/// | 3      | reserved       |                                      |
/// | 4-6    | max_pstate     | Highest usable P-state index         |
/// | 7-63   | reserved       |                                      |
///
/// A nonzero `min_pstate` means firmware has disabled the
/// highest-performance P-states.
#[derive(Debug, Clone, Copy, Default)]
pub struct PstateLimit {
    /// Lowest usable P-state index
    pub min_pstate: u8,

    /// Highest usable P-state index
    pub max_pstate: u8,
}

impl RegisterLayout for PstateLimit {
    fn to_msr_value(&self) -> u64 {
        u64::from(self.min_pstate & 0x7) | (u64::from(self.max_pstate & 0x7) << 4)
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            min_pstate: (value & 0x7) as u8,
            max_pstate: ((value >> 4) & 0x7) as u8,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.min_pstate > 7 || self.max_pstate > 7 {
            return Err("P-state indices must be <= 7 (3 bits)");
        }
        if self.min_pstate > self.max_pstate {
            return Err("min P-state must not exceed max P-state");
        }
        Ok(())
    }
}

/// COFVID Status register layout (MSRC001_0071)
///
/// ## Register Format
///
/// | Bits   | Field           | Description                         |
/// |--------|-----------------|-------------------------------------|
/// | 0-3    | did_lsd         | Current divisor fractional part     |
/// | 4-8    | did_msd         | Current divisor integer part        |
/// | 9-15   | cpu_vid         | Current serial VID                  |
/// | 16-17  | current_pstate  | Currently active P-state index      |
/// | 18-63  | reserved        |                                     |
#[derive(Debug, Clone, Copy, Default)]
pub struct CofvidStatus {
    /// Currently active P-state index
    pub current_pstate: u8,

    /// Current serial VID voltage code
    pub cpu_vid: u8,

    /// Current clock divisor field
    pub did: DidField,
}

impl RegisterLayout for CofvidStatus {
    fn to_msr_value(&self) -> u64 {
        (u64::from(self.current_pstate & 0x3) << 16)
            | (u64::from(self.cpu_vid & 0x7F) << VID_SHIFT)
            | (self.did.bits() & DID_MASK)
    }

    fn from_msr_value(value: u64) -> Self {
        Self {
            current_pstate: ((value >> 16) & 0x3) as u8,
            cpu_vid: ((value >> VID_SHIFT) & 0x7F) as u8,
            did: DidField::from_bits(value),
        }
    }
}

impl CofvidStatus {
    /// Voltage encoded by the current VID, in volts.
    pub fn voltage(&self) -> f64 {
        vid_voltage(self.cpu_vid)
    }

    /// Effective clock divisor currently in force.
    pub fn divisor(&self) -> f64 {
        self.did.divisor()
    }
}
