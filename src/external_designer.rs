//! [`PrimerDesigner`] backed by the external design engine and the in-silico
//! PCR validator.

use crate::bed::write_region_set;
use crate::config::RunConfig;
use crate::design_engine::{DesignRequest, EngineRun, read_candidate_table, run_design_engine};
use crate::ispcr;
use crate::tool_overrides::{
    DEFAULT_DESIGN_BIN, DEFAULT_VALIDATOR_BIN, DESIGN_BIN_ENV, VALIDATOR_BIN_ENV,
    active_resolution_label, design_executable, validator_executable,
};
use ampcover_engine::{DesignOutcome, EngineError, PrimerDesigner};
use ampcover_protocol::{DesignParameters, Pool, PrimerCandidate, RegionSet};
use itertools::Itertools;
use std::path::{Path, PathBuf};

const DESIGNER_NAME: &str = "external";

#[derive(Debug, Clone)]
pub struct ExternalDesigner {
    design_bin: String,
    validator_bin: String,
    reference_index: PathBuf,
    variant_index: Option<PathBuf>,
    pool_min: usize,
    validator_max_size: usize,
    invocations: usize,
}

impl ExternalDesigner {
    pub fn new(
        design_bin: impl Into<String>,
        validator_bin: impl Into<String>,
        reference_index: impl Into<PathBuf>,
        pool_min: usize,
    ) -> Self {
        Self {
            design_bin: design_bin.into(),
            validator_bin: validator_bin.into(),
            reference_index: reference_index.into(),
            variant_index: None,
            pool_min,
            validator_max_size: 4_000,
            invocations: 0,
        }
    }

    /// Resolves executables through the tool overrides, so configuration
    /// entries and environment variables both apply.
    pub fn from_config(config: &RunConfig) -> Result<Self, EngineError> {
        config.apply_tool_overrides();
        let reference = config.resources.reference_index.as_deref().ok_or_else(|| {
            EngineError::invalid_input("resources.reference_index is not configured")
        })?;
        let mut designer = Self::new(
            design_executable(),
            validator_executable(),
            reference,
            config.prefilter_pool_min(),
        );
        designer.variant_index = config.resources.variant_index.as_ref().map(PathBuf::from);
        designer.validator_max_size = config.resources.validator_max_size;
        tracing::info!(
            design = %active_resolution_label(DESIGN_BIN_ENV, DEFAULT_DESIGN_BIN),
            validator = %active_resolution_label(VALIDATOR_BIN_ENV, DEFAULT_VALIDATOR_BIN),
            pool_min = designer.pool_min,
            "External tools"
        );
        Ok(designer)
    }

    pub fn pool_min(&self) -> usize {
        self.pool_min
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }

    fn validate_candidates(
        &self,
        workdir: &Path,
        candidates: Vec<PrimerCandidate>,
    ) -> Result<Vec<PrimerCandidate>, EngineError> {
        let query = workdir.join("ispcr.txt");
        let hits_path = workdir.join("ispcr.bed");
        std::fs::write(&query, ispcr::query_listing(&candidates)).map_err(|e| {
            EngineError::io(format!("Could not write validator query '{}': {e}", query.display()))
        })?;
        let text = ispcr::run_validator(
            &self.validator_bin,
            &self.reference_index,
            &query,
            &hits_path,
            self.validator_max_size,
        )?;
        let hits = ispcr::parse_hits(&text)?;
        Ok(ispcr::retain_specific(candidates, &hits))
    }
}

/// Groups candidates by batch-local pool id, in ascending id order, and
/// drops pools below `pool_min`.
pub fn group_pools(candidates: Vec<PrimerCandidate>, pool_min: usize) -> Vec<Pool> {
    candidates
        .into_iter()
        .into_group_map_by(|c| c.pool)
        .into_iter()
        .sorted_by_key(|(id, _)| *id)
        .filter(|(_, members)| members.len() >= pool_min)
        .map(|(id, members)| Pool::new(id, members))
        .collect()
}

impl PrimerDesigner for ExternalDesigner {
    fn name(&self) -> &str {
        DESIGNER_NAME
    }

    fn design(
        &mut self,
        targets: &RegionSet,
        params: &DesignParameters,
    ) -> Result<DesignOutcome, EngineError> {
        self.invocations += 1;
        let workdir = tempfile::tempdir()
            .map_err(|e| EngineError::io(format!("Could not create working directory: {e}")))?;
        let targets_bed = workdir.path().join("targets.bed");
        write_region_set(&targets_bed, targets)?;
        let output = workdir.path().join("design.tsv");
        let request = DesignRequest {
            targets_bed: &targets_bed,
            reference: &self.reference_index,
            variants: self.variant_index.as_deref(),
            output: &output,
        };

        let table = match run_design_engine(&self.design_bin, &request, params)? {
            EngineRun::Finished(path) => path,
            EngineRun::Failed {
                status,
                stderr_tail,
            } => {
                tracing::warn!(
                    engine = %self.design_bin,
                    %status,
                    stderr = %stderr_tail,
                    "Design engine found no solution"
                );
                return Ok(DesignOutcome::NoResult);
            }
        };
        let candidates = read_candidate_table(&table)?;
        if candidates.is_empty() {
            return Ok(DesignOutcome::NoResult);
        }
        let designed = candidates.len();
        let specific = self.validate_candidates(workdir.path(), candidates)?;
        let pools = group_pools(specific, self.pool_min);
        tracing::debug!(
            invocation = self.invocations,
            designed,
            pools = pools.len(),
            "Design invocation finished"
        );
        if pools.is_empty() {
            return Ok(DesignOutcome::NoResult);
        }
        Ok(DesignOutcome::Pools(pools))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn member(name: &str, pool: u32) -> PrimerCandidate {
        PrimerCandidate {
            name: name.to_string(),
            pool,
            chrom: "chr1".to_string(),
            start: 0,
            end: 200,
            forward: "ACGT".to_string(),
            reverse: "TGCA".to_string(),
            forward_tm: 60.0,
            reverse_tm: 60.0,
            forward_gc: 50.0,
            reverse_gc: 50.0,
            target: None,
        }
    }

    #[test]
    fn test_group_pools_orders_and_prefilters() {
        let pools = group_pools(
            vec![
                member("b1", 2),
                member("a1", 0),
                member("b2", 2),
                member("c1", 1),
                member("a2", 0),
            ],
            2,
        );
        let shape: Vec<(u32, Vec<&str>)> = pools
            .iter()
            .map(|p| (p.local_id, p.members.iter().map(|m| m.name.as_str()).collect()))
            .collect();
        assert_eq!(shape, vec![(0, vec!["a1", "a2"]), (2, vec!["b1", "b2"])]);
    }

    #[test]
    fn test_from_config_needs_reference() {
        let config = RunConfig::default();
        assert!(ExternalDesigner::from_config(&config).is_err());
    }

    #[test]
    fn test_missing_engine_is_io_error() {
        let mut designer = ExternalDesigner::new(
            "/nonexistent/ampcover-design-engine",
            "/nonexistent/isPcr",
            "/nonexistent/ref.2bit",
            1,
        );
        let targets =
            RegionSet::from_regions(vec![ampcover_protocol::Region::new("chr1", 0, 100)]).unwrap();
        let err = designer
            .design(&targets, &DesignParameters::default())
            .unwrap_err();
        assert_eq!(err.code, ampcover_engine::ErrorCode::Io);
        assert_eq!(designer.invocations(), 1);
    }
}
