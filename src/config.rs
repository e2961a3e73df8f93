use crate::tool_overrides::{DESIGN_BIN_ENV, VALIDATOR_BIN_ENV, set_tool_override};
use ampcover_engine::{EngineError, ErrorCode, ScheduleSettings};
use ampcover_protocol::DesignParameters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_DIR: &str = "ampcover_out";
pub const DEFAULT_OUTPUT_PREFIX: &str = "ampcover";

/// Reference data and tool locations handed to the external designer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    /// Reference sequence index used by the validator (e.g. a `.2bit` file).
    pub reference_index: Option<String>,
    /// Duplicate / common-variant site index passed to the design engine.
    pub variant_index: Option<String>,
    pub design_bin: Option<String>,
    pub validator_bin: Option<String>,
    /// Pools below this size are dropped before acceptance. Defaults to the
    /// pool-size minimum of the design parameters.
    pub prefilter_pool_min: Option<usize>,
    /// Largest product the validator reports.
    pub validator_max_size: usize,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            reference_index: None,
            variant_index: None,
            design_bin: None,
            validator_bin: None,
            prefilter_pool_min: None,
            validator_max_size: 4_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: String,
    pub prefix: String,
    pub write_snapshots: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: DEFAULT_OUTPUT_DIR.to_string(),
            prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            write_snapshots: true,
        }
    }
}

impl OutputSettings {
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub parameters: DesignParameters,
    pub schedule: ScheduleSettings,
    pub resources: ResourceSettings,
    pub output: OutputSettings,
}

impl RunConfig {
    pub fn load_from_path(path: &str) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::io(format!("Could not read config file '{path}': {e}")))?;
        serde_json::from_str(&text).map_err(|e| {
            EngineError::invalid_input(format!("Could not parse config JSON '{path}': {e}"))
        })
    }

    pub fn save_to_path(&self, path: &str) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| {
            EngineError::new(ErrorCode::Internal, format!("Could not serialize config: {e}"))
        })?;
        std::fs::write(path, text)
            .map_err(|e| EngineError::io(format!("Could not write config file '{path}': {e}")))
    }

    pub fn prefilter_pool_min(&self) -> usize {
        self.resources
            .prefilter_pool_min
            .unwrap_or_else(|| self.parameters.pool_min())
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.parameters
            .validate()
            .map_err(|e| EngineError::invalid_input(format!("Invalid design parameters: {e}")))?;
        self.schedule.validate()?;
        if self.output.prefix.trim().is_empty() {
            return Err(EngineError::invalid_input("Output prefix must not be empty"));
        }
        if self.schedule.enabled && self.resources.reference_index.is_none() {
            return Err(EngineError::invalid_input(
                "resources.reference_index is required unless invocation is disabled",
            ));
        }
        Ok(())
    }

    /// Registers configured executables so tool resolution picks them up.
    pub fn apply_tool_overrides(&self) {
        if let Some(bin) = &self.resources.design_bin {
            set_tool_override(DESIGN_BIN_ENV, bin);
        }
        if let Some(bin) = &self.resources.validator_bin {
            set_tool_override(VALIDATOR_BIN_ENV, bin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{
                "schedule": {"iter_max": 3},
                "resources": {"reference_index": "hg38.2bit"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.schedule.iter_max, 3);
        assert_eq!(config.schedule.incr_amp_size, 20);
        assert!(config.schedule.enabled);
        assert_eq!(config.output.prefix, DEFAULT_OUTPUT_PREFIX);
        assert_eq!(config.prefilter_pool_min(), config.parameters.pool_min());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_run_needs_reference() {
        let config = RunConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("reference_index"));

        let mut dry = RunConfig::default();
        dry.schedule.enabled = false;
        assert!(dry.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let path = path.to_str().unwrap();
        let mut config = RunConfig::default();
        config.resources.prefilter_pool_min = Some(1);
        config.parameters.pad = 25;
        config.save_to_path(path).unwrap();

        let loaded = RunConfig::load_from_path(path).unwrap();
        assert_eq!(loaded.prefilter_pool_min(), 1);
        assert_eq!(loaded.parameters, config.parameters);
    }

    #[test]
    fn test_bad_json_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = RunConfig::load_from_path(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
