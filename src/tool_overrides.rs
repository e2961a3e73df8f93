//! Executable resolution for the external design engine and validator.
//!
//! Lookup order: explicit override (from the run configuration), then the
//! tool's environment variable, then the bare binary name for `PATH` lookup.

use std::{
    collections::HashMap,
    sync::{LazyLock, PoisonError, RwLock},
};

pub const DESIGN_BIN_ENV: &str = "AMPCOVER_DESIGN_BIN";
pub const VALIDATOR_BIN_ENV: &str = "AMPCOVER_ISPCR_BIN";
pub const DEFAULT_DESIGN_BIN: &str = "mpprimer";
pub const DEFAULT_VALIDATOR_BIN: &str = "isPcr";

static TOOL_OVERRIDES: LazyLock<RwLock<HashMap<String, String>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn normalized_non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sets or (with an empty value) clears the override for `env_var`.
pub fn set_tool_override(env_var: &str, configured: &str) {
    let mut guard = TOOL_OVERRIDES
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(value) = normalized_non_empty(configured) {
        guard.insert(env_var.to_string(), value);
    } else {
        guard.remove(env_var);
    }
}

pub fn get_tool_override(env_var: &str) -> Option<String> {
    TOOL_OVERRIDES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(env_var)
        .cloned()
}

fn configured(env_var: &str) -> Option<String> {
    get_tool_override(env_var).or_else(|| {
        std::env::var(env_var)
            .ok()
            .and_then(|v| normalized_non_empty(&v))
    })
}

pub fn resolve_tool_executable(env_var: &str, default_bin: &str) -> String {
    configured(env_var).unwrap_or_else(|| default_bin.to_string())
}

/// Human-readable description of where the executable comes from.
pub fn active_resolution_label(env_var: &str, default_bin: &str) -> String {
    configured(env_var).unwrap_or_else(|| format!("PATH lookup: {default_bin}"))
}

pub fn design_executable() -> String {
    resolve_tool_executable(DESIGN_BIN_ENV, DEFAULT_DESIGN_BIN)
}

pub fn validator_executable() -> String {
    resolve_tool_executable(VALIDATOR_BIN_ENV, DEFAULT_VALIDATOR_BIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_and_clears() {
        let var = "AMPCOVER_TEST_TOOL_OVERRIDE_ONLY";
        assert_eq!(resolve_tool_executable(var, "tool"), "tool");
        assert_eq!(active_resolution_label(var, "tool"), "PATH lookup: tool");

        set_tool_override(var, "  /opt/bin/tool  ");
        assert_eq!(resolve_tool_executable(var, "tool"), "/opt/bin/tool");

        set_tool_override(var, " ");
        assert_eq!(get_tool_override(var), None);
        assert_eq!(resolve_tool_executable(var, "tool"), "tool");
    }
}
