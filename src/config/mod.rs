use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::driver::AnalyzerOptions;
use crate::error::Result;
use crate::lens::Severity;

/// Top-level configuration from `.lenscan.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Include globs; empty uses the crawler default (`**/*`).
    #[serde(default)]
    pub include: Vec<String>,
    /// Extension allow-list override.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Ignore patterns merged with defaults and ignore files.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Worker pool size; absent uses the global pool.
    #[serde(default)]
    pub jobs: Option<usize>,
    /// Minimum severity that makes the CLI exit nonzero.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
}

fn default_fail_on() -> Severity {
    Severity::High
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            extensions: Vec::new(),
            ignore: Vec::new(),
            jobs: None,
            fail_on: Severity::High,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn analyzer_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            include: self.include.clone(),
            extensions: self.extensions.clone(),
            extra_ignores: self.ignore.clone(),
            jobs: self.jobs,
        }
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# lenscan configuration

# Include globs expanded under the scan root.
# include = ["src/**/*", "deploy/**/*"]

# Extra ignore patterns, merged with .lenscanignore and .gitignore.
# ignore = ["fixtures/"]

# Worker pool size. Defaults to one worker per core.
# jobs = 4

# Minimum severity that makes the scan exit nonzero (LOW, MEDIUM, HIGH, CRITICAL).
fail_on = "HIGH"
"#
    }
}
