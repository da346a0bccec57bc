//! Read-only views of the configured and active P-states

use vidflow_raw::current_arch::pstate::{msr, CofvidStatus, PstateConfig};
use vidflow_raw::RegisterLayout;

use super::{warn_undocumented_did, PstateBounds};
use crate::common::msr::RegisterIo;
use crate::error::Result;

/// Print the configured VID, voltage and divisor for every usable P-state.
///
/// The configuration plane is shared, so core 0's registers are
/// representative. Any read failure is fatal; a partial table would be
/// misleading.
pub fn dump_pstates(io: &dyn RegisterIo, bounds: PstateBounds) -> Result<()> {
    println!("P-state\tVid\tVoltage\t\tdiv");
    for pstate in bounds.min..=bounds.max {
        let raw = io.read(0, msr::PSTATE_CONFIG[pstate as usize])?;
        let config = PstateConfig::from_msr_value(raw);
        warn_undocumented_did(&format!("P-state {pstate}"), config.did);
        println!(
            "  {}\t0x{:02X}\t{:.4}V\t\t{:.2}",
            pstate,
            config.cpu_vid,
            config.voltage(),
            config.divisor()
        );
    }
    Ok(())
}

/// Print the currently active P-state, VID and divisor for every core.
pub fn current_states(io: &dyn RegisterIo, cores: u32) -> Result<()> {
    for core in 0..cores {
        let raw = io.read(core, msr::COFVID_STATUS)?;
        let status = CofvidStatus::from_msr_value(raw);
        warn_undocumented_did(&format!("CPU {core}"), status.did);
        println!(
            "CPU {}: current P-state: {}, current vid: 0x{:02X}/{}/{:.4}V, current div: {:.2}",
            core,
            status.current_pstate,
            status.cpu_vid,
            status.cpu_vid,
            status.voltage(),
            status.divisor()
        );
    }
    Ok(())
}
