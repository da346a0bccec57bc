use std::collections::BTreeMap;

use crate::error::{Result, VidflowError};

/// Family 14h defines at most eight software-visible P-states.
pub const PSTATE_COUNT: u8 = 8;

/// A requested change to one P-state's configuration.
///
/// An absent divisor means "leave the divisor bits as read". There is no
/// sentinel VID; a request always carries the VID to write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PstateRequest {
    /// Serial VID voltage code to set (7 bits)
    pub vid: u8,

    /// Clock divisor to set, if any
    pub divisor: Option<f64>,
}

/// Sparse mapping from P-state index to a requested change.
///
/// Indices with no request are simply absent. Iteration yields requests in
/// ascending P-state order.
#[derive(Debug, Default)]
pub struct RequestTable {
    requests: BTreeMap<u8, PstateRequest>,
}

impl RequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request for one P-state.
    ///
    /// Rejects indices outside 0-7 and duplicate requests for the same
    /// index; a duplicate indicates ambiguous user intent.
    pub fn insert(&mut self, pstate: u8, request: PstateRequest) -> Result<()> {
        if pstate >= PSTATE_COUNT {
            return Err(VidflowError::Config(format!(
                "P-state {pstate} is out of bounds (expected 0-{})",
                PSTATE_COUNT - 1
            )));
        }
        if self.requests.contains_key(&pstate) {
            return Err(VidflowError::Config(format!(
                "Duplicate request for P-state {pstate}"
            )));
        }
        self.requests.insert(pstate, request);
        Ok(())
    }

    /// Parse a `<pstate>:<vid>[,<div>]` spec and add it to the table.
    pub fn add_spec(&mut self, spec: &str) -> Result<()> {
        let (pstate, request) = parse_request(spec)?;
        self.insert(pstate, request)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &PstateRequest)> + '_ {
        self.requests.iter().map(|(&pstate, request)| (pstate, request))
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}

/// Largest divisor the DID field can encode (MSD 0x1F, LSD 3).
pub const DIVISOR_MAX: f64 = 32.75;

/// Parse a `<pstate>:<vid>[,<div>]` request spec.
///
/// The VID accepts decimal or `0x`-prefixed hex and must fit in 7 bits. The
/// divisor, when present, must be a finite value the DID field can encode
/// (1.0 through 32.75).
pub fn parse_request(spec: &str) -> Result<(u8, PstateRequest)> {
    let (pstate_str, rest) = spec.split_once(':').ok_or_else(|| {
        VidflowError::Config(format!(
            "Error parsing '{spec}', expected <pstate>:<vid>[,<div>]"
        ))
    })?;

    let pstate = pstate_str.trim().parse::<u8>().map_err(|_| {
        VidflowError::Config(format!("Invalid P-state index '{}'", pstate_str.trim()))
    })?;

    let (vid_str, div_str) = match rest.split_once(',') {
        Some((vid, div)) => (vid.trim(), Some(div.trim())),
        None => (rest.trim(), None),
    };

    let vid = parse_int(vid_str)?;
    if vid > 0x7F {
        return Err(VidflowError::Config(format!(
            "VID 0x{vid:X} does not fit in 7 bits"
        )));
    }

    let divisor = match div_str {
        Some(div) => Some(div.parse::<f64>().map_err(|_| {
            VidflowError::Config(format!("Invalid divisor '{div}'"))
        })?),
        None => None,
    };
    if let Some(div) = divisor {
        // NaN fails every ordered comparison, so check finiteness first.
        if !div.is_finite() || div < 1.0 || div > DIVISOR_MAX {
            return Err(VidflowError::Config(format!(
                "Divisor {div} is not encodable (expected 1.0 through {DIVISOR_MAX})"
            )));
        }
    }

    Ok((
        pstate,
        PstateRequest {
            vid: vid as u8,
            divisor,
        },
    ))
}

fn parse_int(s: &str) -> Result<u32> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|_| VidflowError::Config(format!("Invalid number '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vid_only() {
        let (pstate, request) = parse_request("2:0x08").unwrap();
        assert_eq!(pstate, 2);
        assert_eq!(request.vid, 0x08);
        assert_eq!(request.divisor, None);
    }

    #[test]
    fn test_parse_decimal_vid_and_divisor() {
        let (pstate, request) = parse_request("4:38,3.5").unwrap();
        assert_eq!(pstate, 4);
        assert_eq!(request.vid, 38);
        assert_eq!(request.divisor, Some(3.5));
    }

    #[test]
    fn test_parse_rejects_malformed_spec() {
        assert!(parse_request("2").is_err());
        assert!(parse_request("two:0x08").is_err());
        assert!(parse_request("2:vid").is_err());
        assert!(parse_request("2:0x08,fast").is_err());
    }

    #[test]
    fn test_parse_rejects_wide_vid() {
        assert!(parse_request("2:0x80").is_err());
    }

    #[test]
    fn test_parse_rejects_sub_unity_divisor() {
        assert!(parse_request("2:0x08,0.5").is_err());
    }

    #[test]
    fn test_parse_rejects_non_finite_divisor() {
        assert!(parse_request("2:0x08,nan").is_err());
        assert!(parse_request("2:0x08,inf").is_err());
        assert!(parse_request("2:0x08,-inf").is_err());
    }

    #[test]
    fn test_parse_rejects_divisor_above_field_maximum() {
        assert!(parse_request("2:0x08,33.0").is_err());
        assert!(parse_request("2:0x08,32.75").is_ok());
    }

    #[test]
    fn test_table_rejects_duplicate_pstate() {
        let mut table = RequestTable::new();
        table.add_spec("2:0x08").unwrap();
        let err = table.add_spec("2:0x10").unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_rejects_out_of_range_index() {
        let mut table = RequestTable::new();
        assert!(table.add_spec("8:0x08").is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_table_iterates_in_ascending_order() {
        let mut table = RequestTable::new();
        table.add_spec("5:0x20").unwrap();
        table.add_spec("1:0x10").unwrap();
        table.add_spec("3:0x18").unwrap();
        let order: Vec<u8> = table.iter().map(|(pstate, _)| pstate).collect();
        assert_eq!(order, vec![1, 3, 5]);
    }
}
