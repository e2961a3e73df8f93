//! Shared data model for ampcover: target regions, designed primer pairs,
//! pools and the design-constraint bundle handed to the primer engine.

pub mod params;
pub mod primer;
pub mod region;

pub use params::{Bounds, DesignParameters};
pub use primer::{Pool, PoolId, PrimerCandidate};
pub use region::{Region, RegionSet};
