//! CPU identification via `/proc/cpuinfo`
//!
//! The supported parts are identified from the text interface rather than
//! the cpuid instruction, the same way the stock tooling for these APUs
//! does. Writing P-state registers on an unsupported part could brick the
//! boot, so identification failures stop the run before any register access.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::error::{Result, VidflowError};

const SUPPORTED_VENDOR: &str = "AuthenticAMD";
const SUPPORTED_FAMILY: u32 = 0x14;

// Model 1 is the B0 stepping (C-30, C-50, E-350), model 2 the C0 stepping
// (C-60, E-450).
const SUPPORTED_MODELS: [u32; 2] = [1, 2];

/// Identification result for a supported processor.
#[derive(Debug, Clone, Copy)]
pub struct CpuInfo {
    /// Number of physical cores, each with its own MSR device node
    pub cores: u32,

    /// Family 14h model number (stepping selector)
    pub model: u32,
}

/// Identify the processor from `/proc/cpuinfo`.
pub fn probe() -> Result<CpuInfo> {
    let file = File::open("/proc/cpuinfo")?;
    parse_cpuinfo(BufReader::new(file))
}

/// Parse cpuinfo-format text and check it against the supported set.
///
/// Scanning stops after the first processor block has produced all four
/// facts; the remaining blocks repeat them.
pub fn parse_cpuinfo(reader: impl BufRead) -> Result<CpuInfo> {
    let mut vendor_ok = false;
    let mut family_ok = false;
    let mut model = None;
    let mut cores = None;

    for line in reader.lines() {
        let line = line?;
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "vendor_id" => {
                if value != SUPPORTED_VENDOR {
                    return Err(VidflowError::UnsupportedHardware(format!(
                        "vendor_id {value} is not supported"
                    )));
                }
                vendor_ok = true;
            }
            "cpu family" => {
                let family: u32 = value.parse().map_err(|_| {
                    VidflowError::UnsupportedHardware(format!(
                        "could not parse cpu family '{value}'"
                    ))
                })?;
                if family != SUPPORTED_FAMILY {
                    return Err(VidflowError::UnsupportedHardware(format!(
                        "cpu family {family} is not supported (need {SUPPORTED_FAMILY})"
                    )));
                }
                family_ok = true;
            }
            "model" => {
                let m: u32 = value.parse().map_err(|_| {
                    VidflowError::UnsupportedHardware(format!(
                        "could not parse cpu model '{value}'"
                    ))
                })?;
                if !SUPPORTED_MODELS.contains(&m) {
                    return Err(VidflowError::UnsupportedHardware(format!(
                        "cpu model {m} is not supported"
                    )));
                }
                model = Some(m);
            }
            "cpu cores" => {
                cores = value.parse::<u32>().ok().filter(|&n| n > 0);
                if cores.is_none() {
                    return Err(VidflowError::UnsupportedHardware(format!(
                        "could not read the number of cores from '{value}'"
                    )));
                }
            }
            _ => {}
        }

        if vendor_ok && family_ok && model.is_some() && cores.is_some() {
            break;
        }
    }

    match (vendor_ok && family_ok, model, cores) {
        (true, Some(model), Some(cores)) => Ok(CpuInfo { cores, model }),
        _ => Err(VidflowError::UnsupportedHardware(
            "could not identify a supported CPU from /proc/cpuinfo".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E450_CPUINFO: &str = "\
processor\t: 0
vendor_id\t: AuthenticAMD
cpu family\t: 20
model\t\t: 2
model name\t: AMD E-450 APU with Radeon(tm) HD Graphics
stepping\t: 0
cpu MHz\t\t: 1650.000
cache size\t: 512 KB
cpu cores\t: 2
power management: ts ttp tm stc 100mhzsteps hwpstate
";

    #[test]
    fn test_parse_supported_cpu() {
        let info = parse_cpuinfo(E450_CPUINFO.as_bytes()).unwrap();
        assert_eq!(info.cores, 2);
        assert_eq!(info.model, 2);
    }

    #[test]
    fn test_parse_rejects_wrong_vendor() {
        let text = E450_CPUINFO.replace("AuthenticAMD", "GenuineIntel");
        let err = parse_cpuinfo(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("GenuineIntel"));
    }

    #[test]
    fn test_parse_rejects_wrong_family() {
        let text = E450_CPUINFO.replace("cpu family\t: 20", "cpu family\t: 21");
        assert!(parse_cpuinfo(text.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_model() {
        let text = E450_CPUINFO.replace("model\t\t: 2", "model\t\t: 3");
        assert!(parse_cpuinfo(text.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_requires_core_count() {
        let text = E450_CPUINFO.replace("cpu cores\t: 2\n", "");
        assert!(parse_cpuinfo(text.as_bytes()).is_err());
    }

    #[test]
    fn test_model_name_line_does_not_shadow_model() {
        // "model name" must not be parsed as the "model" key.
        let info = parse_cpuinfo(E450_CPUINFO.as_bytes()).unwrap();
        assert_eq!(info.model, 2);
    }
}
