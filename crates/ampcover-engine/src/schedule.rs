//! The fixed relaxation schedule.
//!
//! Every iteration runs four design/accept cycles; the first three are each
//! followed by one relaxation step. Relaxation happens whether or not the
//! cycle kept anything.

use crate::error::{EngineError, ErrorCode};
use ampcover_protocol::DesignParameters;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub iter_max: usize,
    /// Added to the amplicon maximum and taken off the minimum.
    pub incr_amp_size: usize,
    /// Added to the Tm maximum and taken off the minimum.
    pub incr_tm: f64,
    /// When false every cycle is a no-op.
    pub enabled: bool,
    pub verbose: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            iter_max: 10,
            incr_amp_size: 20,
            incr_tm: 1.0,
            enabled: true,
            verbose: false,
        }
    }
}

impl ScheduleSettings {
    /// Cycles one full run executes, salvage round included.
    pub fn total_cycles(&self) -> usize {
        SubRound::ALL.len() * self.iter_max + 1
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.incr_tm.is_nan() || self.incr_tm < 0.0 {
            return Err(EngineError::invalid_input(format!(
                "Tm increment must be >= 0, got {}",
                self.incr_tm
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubRound {
    WidenAmplicon,
    WidenTm,
    DoubleTmStep,
    Final,
    /// The single threshold-1 cycle after the last iteration.
    Salvage,
}

impl SubRound {
    pub const ALL: [SubRound; 4] = [
        SubRound::WidenAmplicon,
        SubRound::WidenTm,
        SubRound::DoubleTmStep,
        SubRound::Final,
    ];

    /// 1-based position inside an iteration; the salvage round reports 0.
    pub fn ordinal(self) -> usize {
        match self {
            SubRound::WidenAmplicon => 1,
            SubRound::WidenTm => 2,
            SubRound::DoubleTmStep => 3,
            SubRound::Final => 4,
            SubRound::Salvage => 0,
        }
    }

    /// Applies the relaxation that follows this sub-round's cycle.
    pub fn relax(
        self,
        params: &mut DesignParameters,
        settings: &ScheduleSettings,
    ) -> Result<(), EngineError> {
        match self {
            SubRound::WidenAmplicon => params.widen_amplicon(settings.incr_amp_size),
            SubRound::WidenTm => params.widen_tm(settings.incr_tm),
            SubRound::DoubleTmStep => params.double_tm_step(),
            SubRound::Final | SubRound::Salvage => return Ok(()),
        }
        params.validate().map_err(|e| {
            EngineError::new(
                ErrorCode::ParameterInvariant,
                format!("after relaxing {self}: {e}"),
            )
        })
    }
}

impl fmt::Display for SubRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubRound::WidenAmplicon => "widen-amplicon",
            SubRound::WidenTm => "widen-tm",
            SubRound::DoubleTmStep => "double-tm-step",
            SubRound::Final => "final",
            SubRound::Salvage => "salvage",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampcover_protocol::Bounds;

    #[test]
    fn test_each_relaxation_strictly_widens_its_bound() {
        let settings = ScheduleSettings::default();
        let mut params = DesignParameters::default();
        for _ in 0..settings.iter_max {
            for sub in SubRound::ALL {
                let before = params.clone();
                sub.relax(&mut params, &settings).unwrap();
                assert!(params.validate().is_ok());
                match sub {
                    SubRound::WidenAmplicon => {
                        assert!(params.amplicon_size.max > before.amplicon_size.max);
                        assert!(params.amplicon_size.min <= before.amplicon_size.min);
                    }
                    SubRound::WidenTm => {
                        assert!(params.tm.max > before.tm.max);
                        assert!(params.tm.min < before.tm.min);
                    }
                    SubRound::DoubleTmStep => assert!(params.tm_step > before.tm_step),
                    SubRound::Final | SubRound::Salvage => assert_eq!(params, before),
                }
            }
        }
    }

    #[test]
    fn test_relaxation_only_touches_its_own_bound() {
        let settings = ScheduleSettings::default();
        let mut params = DesignParameters::default();
        SubRound::WidenTm.relax(&mut params, &settings).unwrap();
        let defaults = DesignParameters::default();
        assert_eq!(params.amplicon_size, defaults.amplicon_size);
        assert_eq!(params.tm, Bounds::new(57.0, 63.0));
        assert_eq!(params.tm_step, defaults.tm_step);
    }

    #[test]
    fn test_invariant_violation_is_reported() {
        let settings = ScheduleSettings::default();
        let mut params = DesignParameters::default();
        params.tm_step = -1.0;
        let err = SubRound::DoubleTmStep.relax(&mut params, &settings).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParameterInvariant);
    }

    #[test]
    fn test_total_cycles() {
        let settings = ScheduleSettings {
            iter_max: 3,
            ..ScheduleSettings::default()
        };
        assert_eq!(settings.total_cycles(), 13);
    }
}
