//! P-state bounds resolution, update orchestration and reporting

pub mod apply;
pub mod report;

use vidflow_raw::current_arch::pstate::{msr, DidField, PstateLimit};
use vidflow_raw::RegisterLayout;

use crate::common::msr::RegisterIo;
use crate::error::Result;

/// Warn when a DID field falls outside the documented range.
///
/// Out-of-range fields have been observed on real parts; they are
/// reported on every encode and decode but never block the operation.
pub(crate) fn warn_undocumented_did(context: &str, did: DidField) {
    if !did.in_documented_range() {
        tracing::warn!(
            "{} DID MSD 0x{:X} / LSD {} is outside the documented range (MSD <= 0x19, LSD <= 3)",
            context,
            did.msd,
            did.lsd
        );
    }
}

/// Hardware-enforced range of usable P-state indices, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PstateBounds {
    pub min: u8,
    pub max: u8,
}

impl PstateBounds {
    /// Read the P-state Current Limit register and decode the usable range.
    ///
    /// The limit is shared across cores, so reading it on core 0 suffices.
    /// A nonzero minimum is informational only: it means firmware has
    /// disabled the highest-performance P-states, not that anything is
    /// wrong.
    pub fn resolve(io: &dyn RegisterIo) -> Result<Self> {
        let raw = io.read(0, msr::PSTATE_CURRENT_LIMIT)?;
        let limit = PstateLimit::from_msr_value(raw);
        if limit.min_pstate != 0 {
            tracing::info!(
                "Highest-performance P-states are disabled by firmware (lowest usable P-state is {})",
                limit.min_pstate
            );
        }
        Ok(Self {
            min: limit.min_pstate,
            max: limit.max_pstate,
        })
    }

    pub fn contains(&self, pstate: u8) -> bool {
        (self.min..=self.max).contains(&pstate)
    }
}
