//! Deterministic coverage-optimization core.
//!
//! The engine repeatedly asks a [`PrimerDesigner`] for primer pools under a
//! fixed, monotonically relaxing parameter schedule, keeps the pools that are
//! large enough to multiplex, and recomputes which target regions are still
//! uncovered after every accepted batch.
//!
//! - [`schedule`]: relaxation steps and run settings
//! - [`acceptance`]: pool-size threshold
//! - [`ledger::KeptPrimerLedger`]: run-wide pool numbering
//! - [`coverage::CoverageTracker`]: uncovered-set recomputation
//! - [`optimizer::CoverageOptimizer`]: the loop itself
//!
//! Design-engine invocation and output files live behind the
//! [`PrimerDesigner`] and [`OutputWriter`] traits.

pub mod acceptance;
pub mod coverage;
pub mod designer;
pub mod error;
pub mod ledger;
pub mod optimizer;
pub mod output;
pub mod schedule;

#[cfg(test)]
pub(crate) mod test_support;

pub use designer::{DesignOutcome, PrimerDesigner};
pub use error::{EngineError, ErrorCode};
pub use ledger::KeptPrimerLedger;
pub use optimizer::{CoverageOptimizer, CycleOutcome, CycleRecord, RunState, RunSummary};
pub use output::{OutputWriter, RunSnapshot};
pub use schedule::{ScheduleSettings, SubRound};
