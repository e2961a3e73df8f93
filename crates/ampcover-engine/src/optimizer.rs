//! The coverage-optimization loop.
//!
//! ```text
//! for iteration in 0..iter_max
//!     for sub_round in [widen-amplicon, widen-tm, double-tm-step, final]
//!         design -> accept(pool_min) -> commit -> recompute coverage
//!         relax(sub_round)
//! design -> accept(1) -> commit -> recompute coverage      (salvage)
//! write final output
//! ```

use crate::acceptance::accept_pools;
use crate::coverage::CoverageTracker;
use crate::designer::{DesignOutcome, PrimerDesigner};
use crate::error::EngineError;
use crate::ledger::KeptPrimerLedger;
use crate::output::{OutputWriter, RunSnapshot};
use crate::schedule::{ScheduleSettings, SubRound};
use ampcover_protocol::{DesignParameters, PoolId, RegionSet};
use serde::{Deserialize, Serialize};

macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Everything the loop mutates, passed explicitly between steps.
#[derive(Debug, Clone)]
pub struct RunState {
    pub params: DesignParameters,
    pub ledger: KeptPrimerLedger,
    /// `None` until the first batch is committed. Only written by coverage
    /// recomputation.
    uncovered: Option<RegionSet>,
    pub iteration: usize,
    original: RegionSet,
}

impl RunState {
    pub fn new(original: RegionSet, params: DesignParameters) -> Result<Self, EngineError> {
        if original.is_empty() {
            return Err(EngineError::invalid_input("Target region set is empty"));
        }
        params
            .validate()
            .map_err(|e| EngineError::invalid_input(format!("Invalid design parameters: {e}")))?;
        Ok(Self {
            params,
            ledger: KeptPrimerLedger::new(),
            uncovered: None,
            iteration: 0,
            original,
        })
    }

    /// Continues from a snapshot: its primers seed the ledger and coverage
    /// is recomputed before the schedule starts over.
    pub fn resume(snapshot: RunSnapshot) -> Result<Self, EngineError> {
        let mut state = Self::new(snapshot.original, snapshot.parameters)?;
        state.ledger = KeptPrimerLedger::from_primers(snapshot.primers);
        if !state.ledger.is_empty() {
            let tracker = CoverageTracker::new(state.params.pad);
            state.uncovered = Some(tracker.uncovered(&state.original, state.ledger.primers())?);
        }
        Ok(state)
    }

    pub fn uncovered(&self) -> Option<&RegionSet> {
        self.uncovered.as_ref()
    }

    pub fn original(&self) -> &RegionSet {
        &self.original
    }

    /// Design input for the next cycle: the uncovered set if it has anything
    /// in it, otherwise the original targets.
    pub fn current_target(&self) -> &RegionSet {
        match &self.uncovered {
            Some(uncovered) if !uncovered.is_empty() => uncovered,
            _ => &self.original,
        }
    }

    /// Uncovered regions as reported to the user. Before any commit this is
    /// the whole original set.
    pub fn reported_uncovered(&self) -> &RegionSet {
        self.uncovered.as_ref().unwrap_or(&self.original)
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            iteration: self.iteration,
            parameters: self.params.clone(),
            primers: self.ledger.primers().to_vec(),
            original: self.original.clone(),
            uncovered: self.reported_uncovered().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CycleOutcome {
    /// Invocation switched off.
    Disabled,
    NoResult,
    NoneAccepted { rejected: usize },
    Accepted {
        pool_ids: Vec<PoolId>,
        primers: usize,
        rejected: usize,
        uncovered_regions: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub iteration: usize,
    pub sub_round: SubRound,
    pub threshold: usize,
    pub outcome: CycleOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub cycles: Vec<CycleRecord>,
    pub pool_count: usize,
    pub primer_count: usize,
    pub parameters: DesignParameters,
    pub uncovered: RegionSet,
}

impl RunSummary {
    pub fn cycles_executed(&self) -> usize {
        self.cycles.len()
    }

    pub fn accepted_cycles(&self) -> usize {
        self.cycles
            .iter()
            .filter(|c| matches!(c.outcome, CycleOutcome::Accepted { .. }))
            .count()
    }
}

pub struct CoverageOptimizer<D, W> {
    designer: D,
    writer: W,
    settings: ScheduleSettings,
}

impl<D: PrimerDesigner, W: OutputWriter> CoverageOptimizer<D, W> {
    pub fn new(designer: D, writer: W, settings: ScheduleSettings) -> Self {
        Self {
            designer,
            writer,
            settings,
        }
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    pub fn designer(&self) -> &D {
        &self.designer
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_parts(self) -> (D, W) {
        (self.designer, self.writer)
    }

    /// Runs the whole schedule, then the salvage round, then writes the final
    /// output. Fatal errors carry the failing iteration, sub-round and
    /// parameters.
    pub fn run(&mut self, state: &mut RunState) -> Result<RunSummary, EngineError> {
        self.settings.validate()?;
        let verbose = self.settings.verbose;
        tracing::info!(
            designer = self.designer.name(),
            targets = state.original().len(),
            iter_max = self.settings.iter_max,
            enabled = self.settings.enabled,
            "Starting coverage optimization"
        );

        let mut cycles = Vec::with_capacity(self.settings.total_cycles());
        for iteration in 0..self.settings.iter_max {
            state.iteration = iteration;
            progress!(
                verbose,
                iteration = iteration + 1,
                of = self.settings.iter_max,
                "Iteration"
            );
            for sub_round in SubRound::ALL {
                let threshold = state.params.pool_min();
                let record = self
                    .cycle(state, sub_round, threshold)
                    .map_err(|e| with_round_context(e, iteration, sub_round, &state.params))?;
                cycles.push(record);
                sub_round
                    .relax(&mut state.params, &self.settings)
                    .map_err(|e| with_round_context(e, iteration, sub_round, &state.params))?;
            }
        }

        state.iteration = self.settings.iter_max;
        let record = self
            .cycle(state, SubRound::Salvage, 1)
            .map_err(|e| with_round_context(e, state.iteration, SubRound::Salvage, &state.params))?;
        cycles.push(record);

        self.writer.write_final(&state.snapshot())?;

        let summary = RunSummary {
            cycles,
            pool_count: state.ledger.pool_count(),
            primer_count: state.ledger.primer_count(),
            parameters: state.params.clone(),
            uncovered: state.reported_uncovered().clone(),
        };
        tracing::info!(
            cycles = summary.cycles_executed(),
            accepted_cycles = summary.accepted_cycles(),
            pools = summary.pool_count,
            primers = summary.primer_count,
            uncovered = summary.uncovered.len(),
            "Coverage optimization finished"
        );
        Ok(summary)
    }

    /// One design/accept cycle. Non-fatal empty outcomes leave `state`
    /// untouched.
    pub fn cycle(
        &mut self,
        state: &mut RunState,
        sub_round: SubRound,
        threshold: usize,
    ) -> Result<CycleRecord, EngineError> {
        let verbose = self.settings.verbose;
        let iteration = state.iteration;
        let record = move |outcome| CycleRecord {
            iteration,
            sub_round,
            threshold,
            outcome,
        };

        if !self.settings.enabled {
            progress!(verbose, %sub_round, "Design invocation disabled, skipping cycle");
            return Ok(record(CycleOutcome::Disabled));
        }

        let outcome = self
            .designer
            .design(state.current_target(), &state.params)?;
        let pools = match outcome {
            DesignOutcome::NoResult => {
                progress!(verbose, %sub_round, "No primers for this round");
                return Ok(record(CycleOutcome::NoResult));
            }
            DesignOutcome::Pools(pools) => pools,
        };

        let acceptance = accept_pools(pools, threshold);
        let rejected = acceptance.rejected;
        let Some(commit) = state.ledger.commit(acceptance.accepted) else {
            progress!(
                verbose,
                %sub_round,
                threshold,
                rejected,
                "No pool met the size threshold"
            );
            return Ok(record(CycleOutcome::NoneAccepted { rejected }));
        };

        let tracker = CoverageTracker::new(state.params.pad);
        let uncovered = tracker.uncovered(state.original(), state.ledger.primers())?;
        let uncovered_regions = uncovered.len();
        state.uncovered = Some(uncovered);
        self.writer.write_snapshot(&state.snapshot())?;

        progress!(
            verbose,
            %sub_round,
            pools = commit.pool_ids.len(),
            primers = commit.primers,
            rejected,
            uncovered = uncovered_regions,
            "Kept primer pools"
        );
        Ok(record(CycleOutcome::Accepted {
            pool_ids: commit.pool_ids,
            primers: commit.primers,
            rejected,
            uncovered_regions,
        }))
    }
}

fn with_round_context(
    err: EngineError,
    iteration: usize,
    sub_round: SubRound,
    params: &DesignParameters,
) -> EngineError {
    let params = serde_json::to_string(params).unwrap_or_default();
    err.context(format!(
        "iteration {}, sub-round {} ({sub_round}), parameters {params}",
        iteration + 1,
        sub_round.ordinal()
    ))
}
