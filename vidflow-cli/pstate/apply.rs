//! Read-merge-write orchestration for P-state configuration changes
//!
//! The core-local P-state registers are backed by a shared voltage/divisor
//! plane on this family, so a single write may be enough. The orchestrator
//! still updates every core: if the sharing assumption is wrong for a given
//! variant, nothing is left stale.

use vidflow_raw::current_arch::pstate::{
    msr, vid_voltage, DidField, PstateConfig, DID_MASK, VID_MASK, VID_SHIFT,
};
use vidflow_raw::RegisterLayout;

use super::{warn_undocumented_did, PstateBounds};
use crate::common::msr::RegisterIo;
use crate::config::{PstateRequest, RequestTable};
use crate::error::Result;

/// Outcome of one apply run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// P-state indices written on every core
    pub applied: Vec<u8>,

    /// Requested indices outside the hardware bounds, reported and skipped
    pub rejected: Vec<u8>,
}

/// Merge a requested VID, and optionally a divisor field, into a register
/// value read from hardware.
///
/// Clears bits 9-15 and ORs in the VID. When a divisor field is supplied,
/// also clears bits 0-8 and ORs in the encoded field. Every other bit of
/// `old` is preserved; the result is only valid to write back to the same
/// register on the same core it was read from.
pub fn merge(old: u64, vid: u8, did: Option<DidField>) -> u64 {
    let mut value = (old & !VID_MASK) | (u64::from(vid & 0x7F) << VID_SHIFT);
    if let Some(did) = did {
        value = (value & !DID_MASK) | (did.bits() & DID_MASK);
    }
    value
}

/// Validate the request table against the hardware bounds and apply every
/// in-range request to every core.
///
/// Out-of-bounds requests are reported and excluded; they never abort the
/// run. P-states are processed in ascending order, cores in ascending order
/// within each P-state, one read-merge-write at a time. The first failed
/// read or write aborts immediately; earlier writes stay in place, since
/// register writes are not transactional.
pub fn apply_requests(
    io: &dyn RegisterIo,
    bounds: PstateBounds,
    cores: u32,
    table: &RequestTable,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    // Validation pass: decide up front which requests are applicable, so
    // the apply pass does not re-derive the bounds check.
    for (pstate, _) in table.iter() {
        if !bounds.contains(pstate) {
            tracing::warn!(
                "P-state {} is outside the hardware limits ({}-{}), skipping",
                pstate,
                bounds.min,
                bounds.max
            );
            summary.rejected.push(pstate);
        }
    }

    for (pstate, request) in table.iter() {
        if summary.rejected.contains(&pstate) {
            continue;
        }

        let did = request.divisor.map(encode_divisor);
        let address = msr::PSTATE_CONFIG[pstate as usize];

        for core in 0..cores {
            let old = io.read(core, address)?;
            let previous = PstateConfig::from_msr_value(old);
            let new = merge(old, request.vid, did);
            io.write(core, address, new)?;
            print_transition(pstate, core, &previous, request, did);
        }

        summary.applied.push(pstate);
    }

    Ok(summary)
}

fn encode_divisor(divisor: f64) -> DidField {
    let did = DidField::from_divisor(divisor);
    warn_undocumented_did(&format!("Requested divisor {divisor:.2}:"), did);
    did
}

fn print_transition(
    pstate: u8,
    core: u32,
    previous: &PstateConfig,
    request: &PstateRequest,
    did: Option<DidField>,
) {
    warn_undocumented_did(&format!("P-state {pstate}, core {core}: previous"), previous.did);
    let mut line = format!(
        "P-state {pstate}, core {core}: vid 0x{:02X}/{:.4}V -> 0x{:02X}/{:.4}V",
        previous.cpu_vid,
        previous.voltage(),
        request.vid,
        vid_voltage(request.vid)
    );
    if let Some(did) = did {
        line.push_str(&format!(
            ", div {:.2} -> {:.2}",
            previous.divisor(),
            did.divisor()
        ));
    }
    println!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::msr::testing::{FakeMsr, Op};
    use crate::config::RequestTable;

    fn table_of(specs: &[&str]) -> RequestTable {
        let mut table = RequestTable::new();
        for spec in specs {
            table.add_spec(spec).unwrap();
        }
        table
    }

    #[test]
    fn test_merge_vid_only_keeps_divisor_bits() {
        let old = 0x0000_0000_0000_00AA;
        let new = merge(old, 0x10, None);
        assert_eq!((new >> VID_SHIFT) & 0x7F, 0x10);
        assert_eq!(new & DID_MASK, old & DID_MASK);
    }

    #[test]
    fn test_merge_preserves_reserved_bits() {
        // Enable bit and IDD fields live above bit 15; they must survive.
        let old = (1u64 << 63) | (0x2Au64 << 32) | (0x55u64 << VID_SHIFT) | 0x131;
        let new = merge(old, 0x08, Some(DidField { msd: 2, lsd: 1 }));
        assert_eq!(new >> 16, old >> 16);
        assert_eq!((new >> VID_SHIFT) & 0x7F, 0x08);
        assert_eq!(new & DID_MASK, 0x21);
    }

    #[test]
    fn test_merge_without_divisor_is_divisor_neutral() {
        let old = 0xFFFF_FFFF_FFFF_FFFF;
        let new = merge(old, 0x00, None);
        assert_eq!(new, old & !VID_MASK);
    }

    #[test]
    fn test_out_of_bounds_request_excluded_valid_applied() {
        let io = FakeMsr::new();
        let bounds = PstateBounds { min: 0, max: 3 };
        let table = table_of(&["2:0x08", "7:0x10"]);

        let summary = apply_requests(&io, bounds, 1, &table).unwrap();

        assert_eq!(summary.applied, vec![2]);
        assert_eq!(summary.rejected, vec![7]);

        let writes = io.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, msr::PSTATE_CONFIG[2]);
        assert!(writes.iter().all(|&(_, addr, _)| addr != msr::PSTATE_CONFIG[7]));
    }

    #[test]
    fn test_end_to_end_vid_change_on_two_cores() {
        let io = FakeMsr::new();
        let address = msr::PSTATE_CONFIG[2];
        // Distinct pre-existing values per core, with reserved bits set.
        let old0 = (1u64 << 63) | (0x26u64 << VID_SHIFT) | 0x31;
        let old1 = (1u64 << 63) | (0x30u64 << VID_SHIFT) | 0x42;
        io.set(0, address, old0);
        io.set(1, address, old1);

        let bounds = PstateBounds { min: 0, max: 4 };
        let table = table_of(&["2:0x08"]);

        let summary = apply_requests(&io, bounds, 2, &table).unwrap();
        assert_eq!(summary.applied, vec![2]);
        assert!(summary.rejected.is_empty());

        let writes = io.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, 0);
        assert_eq!(writes[1].0, 1);
        for (&(_, addr, value), &old) in writes.iter().zip([old0, old1].iter()) {
            assert_eq!(addr, address);
            assert_eq!((value >> VID_SHIFT) & 0x7F, 0x08);
            // Divisor bits and reserved bits preserved per core.
            assert_eq!(value & DID_MASK, old & DID_MASK);
            assert_eq!(value >> 16, old >> 16);
        }

        // Decoded voltage for vid 0x08.
        assert!((vid_voltage(0x08) - 1.450).abs() < 1e-9);
    }

    #[test]
    fn test_divisor_request_rewrites_did_bits() {
        let io = FakeMsr::new();
        let address = msr::PSTATE_CONFIG[1];
        io.set(0, address, (0x26u64 << VID_SHIFT) | 0x131);

        let bounds = PstateBounds { min: 0, max: 4 };
        let table = table_of(&["1:0x20,3.5"]);

        apply_requests(&io, bounds, 1, &table).unwrap();

        let value = io.get(0, address);
        assert_eq!((value >> VID_SHIFT) & 0x7F, 0x20);
        // 3.5 encodes as msd=2, lsd=2.
        assert_eq!(value & DID_MASK, 0x22);
    }

    #[test]
    fn test_apply_tolerates_undocumented_previous_did_field() {
        let io = FakeMsr::new();
        let address = msr::PSTATE_CONFIG[2];
        // Pre-existing DID past the documented limits; the transition
        // record warns, the VID-only write still lands and keeps it.
        let old = (0x26u64 << VID_SHIFT) | 0x1F5;
        io.set(0, address, old);

        let bounds = PstateBounds { min: 0, max: 4 };
        let table = table_of(&["2:0x08"]);

        let summary = apply_requests(&io, bounds, 1, &table).unwrap();
        assert_eq!(summary.applied, vec![2]);

        let value = io.get(0, address);
        assert_eq!((value >> VID_SHIFT) & 0x7F, 0x08);
        assert_eq!(value & DID_MASK, old & DID_MASK);
    }

    #[test]
    fn test_read_failure_aborts_without_further_writes() {
        let io = FakeMsr::new();
        let address = msr::PSTATE_CONFIG[2];
        io.fail_on(1, address);

        let bounds = PstateBounds { min: 0, max: 4 };
        let table = table_of(&["2:0x08"]);

        let err = apply_requests(&io, bounds, 2, &table).unwrap_err();
        assert!(err.to_string().contains("0xC0010066"));

        // Core 0 was written before the failure on core 1; no write after.
        let writes = io.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, 0);
    }

    #[test]
    fn test_write_failure_aborts() {
        let io = FakeMsr::new();
        let address = msr::PSTATE_CONFIG[3];
        io.fail_write_on(0, address);

        let bounds = PstateBounds { min: 0, max: 4 };
        let table = table_of(&["3:0x08"]);

        assert!(apply_requests(&io, bounds, 1, &table).is_err());
        assert_eq!(io.get(0, address), 0);
    }

    #[test]
    fn test_ascending_pstate_then_core_order() {
        let io = FakeMsr::new();
        let bounds = PstateBounds { min: 0, max: 7 };
        let table = table_of(&["3:0x10", "1:0x08"]);

        apply_requests(&io, bounds, 2, &table).unwrap();

        let sequence: Vec<(u32, u64)> = io
            .log()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write { core, addr, .. } => Some((core, addr)),
                Op::Read { .. } => None,
            })
            .collect();
        assert_eq!(
            sequence,
            vec![
                (0, msr::PSTATE_CONFIG[1]),
                (1, msr::PSTATE_CONFIG[1]),
                (0, msr::PSTATE_CONFIG[3]),
                (1, msr::PSTATE_CONFIG[3]),
            ]
        );
    }

    #[test]
    fn test_each_write_follows_its_own_read() {
        let io = FakeMsr::new();
        let bounds = PstateBounds { min: 0, max: 7 };
        let table = table_of(&["2:0x08"]);

        apply_requests(&io, bounds, 2, &table).unwrap();

        let log = io.log();
        let address = msr::PSTATE_CONFIG[2];
        assert_eq!(
            log,
            vec![
                Op::Read { core: 0, addr: address },
                Op::Write { core: 0, addr: address, value: 0x08 << VID_SHIFT },
                Op::Read { core: 1, addr: address },
                Op::Write { core: 1, addr: address, value: 0x08 << VID_SHIFT },
            ]
        );
    }
}
