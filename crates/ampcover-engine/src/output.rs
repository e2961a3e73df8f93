use crate::error::EngineError;
use ampcover_protocol::{DesignParameters, PrimerCandidate, RegionSet};
use serde::{Deserialize, Serialize};

/// Run progress as handed to an [`OutputWriter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub iteration: usize,
    pub parameters: DesignParameters,
    pub primers: Vec<PrimerCandidate>,
    pub original: RegionSet,
    pub uncovered: RegionSet,
}

impl RunSnapshot {
    pub fn load_from_path(path: &str) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::io(format!("Could not read snapshot '{path}': {e}")))?;
        serde_json::from_str(&text).map_err(|e| {
            EngineError::invalid_input(format!("Could not parse snapshot JSON '{path}': {e}"))
        })
    }

    pub fn save_to_path(&self, path: &str) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| {
            EngineError::new(
                crate::error::ErrorCode::Internal,
                format!("Could not serialize snapshot: {e}"),
            )
        })?;
        std::fs::write(path, text)
            .map_err(|e| EngineError::io(format!("Could not write snapshot '{path}': {e}")))
    }
}

/// Receives intermediate snapshots and the final result.
pub trait OutputWriter {
    /// Called after every coverage recompute.
    fn write_snapshot(&mut self, snapshot: &RunSnapshot) -> Result<(), EngineError>;

    /// Called exactly once, after the salvage round.
    fn write_final(&mut self, snapshot: &RunSnapshot) -> Result<(), EngineError>;
}
