//! Boundary to the external primer-design engine.

use crate::error::EngineError;
use ampcover_protocol::{DesignParameters, Pool, RegionSet};

/// Result of one design invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignOutcome {
    Pools(Vec<Pool>),
    /// The constraints admit no primers for the given targets. Not an error.
    NoResult,
}

impl DesignOutcome {
    pub fn pool_count(&self) -> usize {
        match self {
            DesignOutcome::Pools(pools) => pools.len(),
            DesignOutcome::NoResult => 0,
        }
    }
}

/// Produces candidate pools for a target set under one parameter snapshot.
///
/// Implementations pre-filter pools smaller than their own configured pool
/// minimum and report `NoResult` when nothing survives. Output the
/// implementation cannot interpret is an `Err` with
/// [`ErrorCode::MalformedOutput`](crate::error::ErrorCode::MalformedOutput).
pub trait PrimerDesigner {
    fn name(&self) -> &str;

    fn design(
        &mut self,
        targets: &RegionSet,
        params: &DesignParameters,
    ) -> Result<DesignOutcome, EngineError>;
}

impl<D: PrimerDesigner + ?Sized> PrimerDesigner for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn design(
        &mut self,
        targets: &RegionSet,
        params: &DesignParameters,
    ) -> Result<DesignOutcome, EngineError> {
        (**self).design(targets, params)
    }
}
