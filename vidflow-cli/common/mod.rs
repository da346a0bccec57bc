pub mod cpuinfo;
pub mod msr;
