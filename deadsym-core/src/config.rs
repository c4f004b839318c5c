//! Configuration loading from deadsym.toml.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{DeadsymError, IoResultExt};

/// Name of the configuration file looked up at the analysis root.
pub const CONFIG_FILE: &str = "deadsym.toml";

/// Main configuration structure for deadsym.toml.
#[derive(Debug, Deserialize, Default)]
pub struct DeadsymConfig {
    /// Filename substrings whose findings are suppressed.
    pub ignore: Option<Vec<String>>,
    /// Extra directory names skipped during discovery.
    pub exclude_dirs: Option<Vec<String>>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
    /// Analysis toggles.
    pub analysis: Option<AnalysisConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

/// Analysis configuration.
#[derive(Debug, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Report unused parameters (default true).
    pub parameters: Option<bool>,
}

impl DeadsymConfig {
    /// Whether JSON output was requested.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }

    /// Whether parameter findings should be reported.
    pub fn report_parameters(&self) -> bool {
        self.analysis
            .as_ref()
            .and_then(|a| a.parameters)
            .unwrap_or(true)
    }
}

/// Loads configuration from deadsym.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<DeadsymConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg = toml::from_str(&content).map_err(|e| DeadsymError::config(&path, e.to_string()))?;
    Ok(Some(cfg))
}
