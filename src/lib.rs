//! Adaptive multiplex PCR panel design.
//!
//! The optimization loop lives in `ampcover-engine`; this crate supplies the
//! pieces that touch the outside world: BED IO, the JSON run configuration,
//! the external design engine and in-silico PCR validator, and the output
//! files.

pub mod about;
pub mod bed;
pub mod config;
pub mod dedup;
pub mod design_engine;
pub mod external_designer;
pub mod ispcr;
pub mod report;
pub mod tool_overrides;

pub use ampcover_engine as engine;
pub use ampcover_protocol as protocol;
pub use config::RunConfig;
pub use external_designer::ExternalDesigner;
pub use report::FileOutputWriter;
