//! Configuration loading and parsing

use anyhow::{Context, Result};
use interlock_fat::{BreakerPattern, Engine, EngineConfig, TestMode, DEFAULT_BREAKER_PATTERNS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub breakers: BreakersConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakersConfig {
    /// Regex naming conventions of circuit-breaker signals
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for BreakersConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

fn default_patterns() -> Vec<String> {
    DEFAULT_BREAKER_PATTERNS.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    pub output_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
            output_dir: None,
        }
    }
}

fn default_pretty() -> bool {
    true
}

impl AppConfig {
    /// Build an engine from this configuration; `mode` overrides `[engine] mode`
    pub fn engine(&self, mode: Option<TestMode>) -> interlock_fat::Result<Engine> {
        let mut config = self.engine.clone();
        if let Some(mode) = mode {
            config = config.with_mode(mode);
        }
        let pattern = BreakerPattern::new(self.breakers.patterns.as_slice())?;
        Ok(Engine::new(config).with_breaker_pattern(pattern))
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
