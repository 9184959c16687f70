//! Builder configuration
//!
//! Loaded from a TOML file or from environment variables, falling back to
//! defaults for anything not given:
//!
//! ```toml
//! failure_policy = "warn_and_skip"
//! require_classic_pipeline = true
//! log_remarks = false
//!
//! [debug]
//! enabled = true
//! synchronous = true
//! min_severity = "medium"
//! ```

use crate::debug::DebugSeverity;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::{env, path::Path};

/// What `build_with_policy` does when a compile or link step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the error to the caller
    #[default]
    Propagate,
    /// Log the diagnostic and hand back no program
    WarnAndSkip,
}

/// Driver debug output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Deliver messages on the thread and call that caused them
    pub synchronous: bool,
    /// Messages below this severity are logged at trace level only
    pub min_severity: DebugSeverity,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            synchronous: true,
            min_severity: DebugSeverity::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub failure_policy: FailurePolicy,
    /// Without a compute stage, require both a vertex and a fragment stage
    pub require_classic_pipeline: bool,
    /// Log non-empty logs of successful steps at info instead of debug
    pub log_remarks: bool,
    pub debug: DebugConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Propagate,
            require_classic_pipeline: true,
            log_remarks: false,
            debug: DebugConfig::default(),
        }
    }
}

impl BuilderConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid shader builder config")
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `SHADER_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if let Some(policy) = var("SHADER_FAILURE_POLICY") {
            self.failure_policy = match policy.trim() {
                "propagate" => FailurePolicy::Propagate,
                "warn_and_skip" | "warn" => FailurePolicy::WarnAndSkip,
                other => anyhow::bail!("unknown SHADER_FAILURE_POLICY '{other}'"),
            };
        }
        if let Some(value) = var("SHADER_REQUIRE_CLASSIC") {
            self.require_classic_pipeline = parse_flag("SHADER_REQUIRE_CLASSIC", &value)?;
        }
        if let Some(value) = var("SHADER_LOG_REMARKS") {
            self.log_remarks = parse_flag("SHADER_LOG_REMARKS", &value)?;
        }
        if let Some(value) = var("SHADER_DEBUG_OUTPUT") {
            self.debug.enabled = parse_flag("SHADER_DEBUG_OUTPUT", &value)?;
        }
        Ok(self)
    }
}

fn parse_flag(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{key} must be a boolean, got '{other}'"),
    }
}
