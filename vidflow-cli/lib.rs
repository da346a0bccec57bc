pub mod common;
pub mod config;
pub mod error;
pub mod pstate;

pub use config::{PstateRequest, RequestTable};
pub use error::{Result, VidflowError};
pub use pstate::PstateBounds;
