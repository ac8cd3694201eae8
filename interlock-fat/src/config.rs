//! Engine configuration types
//!
//! This module defines the configuration consumed by the engine. It covers the
//! test-case header values written into every generated document and the knobs
//! that change how raw step columns are interpreted. File loading belongs to the
//! application layer.

use crate::types::TestMode;
use serde::{Deserialize, Serialize};

/// Configuration for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Document format version written to `version`
    #[serde(default = "default_version")]
    pub version: String,

    /// Value domain of the CONTROL signals
    #[serde(default)]
    pub mode: TestMode,

    /// Timing values copied into each test case header
    #[serde(default)]
    pub timing: TimingConfig,

    /// Whether the test runner drives CONTROL values itself
    #[serde(default = "default_true")]
    pub auto_set_control_values: bool,

    /// Whether the test runner assesses results itself
    #[serde(default = "default_true")]
    pub auto_assess: bool,

    /// Optional override of the assessment value at the baseline step
    /// (default: `false` for SPC, `true` for DPC)
    #[serde(default)]
    pub initial_assessment: Option<bool>,

    /// Run the schema self-check on every generated document
    #[serde(default = "default_true")]
    pub validate_output: bool,
}

/// Timing parameters in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_seconds")]
    pub assessment_lockout_time: f64,
    #[serde(default = "default_seconds")]
    pub auto_assess_timeout: f64,
    #[serde(default = "default_seconds")]
    pub switch_operation_time: f64,
}

fn default_version() -> String {
    "1.2".to_string()
}

fn default_true() -> bool {
    true
}

fn default_seconds() -> f64 {
    1.5
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            assessment_lockout_time: default_seconds(),
            auto_assess_timeout: default_seconds(),
            switch_operation_time: default_seconds(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            mode: TestMode::default(),
            timing: TimingConfig::default(),
            auto_set_control_values: true,
            auto_assess: true,
            initial_assessment: None,
            validate_output: true,
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the document version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Builder method: set the test mode
    pub fn with_mode(mut self, mode: TestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method: set the timing values
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Builder method: override the baseline assessment value
    pub fn with_initial_assessment(mut self, value: bool) -> Self {
        self.initial_assessment = Some(value);
        self
    }

    /// Builder method: enable or disable the schema self-check
    pub fn with_output_validation(mut self, enabled: bool) -> Self {
        self.validate_output = enabled;
        self
    }

    /// Assessment value used at the baseline step
    pub fn baseline_assessment(&self) -> bool {
        self.initial_assessment
            .unwrap_or_else(|| self.mode.baseline_assessment())
    }
}
