//! Core types for the interlocking FAT engine
//!
//! This module defines the vocabulary shared by every stage of the engine:
//! signal addresses, group classification, canonical position codes, command
//! result codes, and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::SchemaError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, FatError>;

/// Hierarchical logical-node path (`device/logical-node.attribute`)
///
/// Opaque to the engine apart from its lexicographic order, which is used as
/// the tie-break inside every ordering group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalAddress(String);

impl SignalAddress {
    /// Create a new signal address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Borrow the address text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for SignalAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

/// Role of a signal inside a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupType {
    /// Switch or disconnector position driven by the test
    Control,
    /// Interlocking verdict for the device under test
    Assess,
    /// Switching command result for the device under test
    Command,
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupType::Control => write!(f, "CONTROL"),
            GroupType::Assess => write!(f, "ASSESS"),
            GroupType::Command => write!(f, "COMMAND"),
        }
    }
}

/// Value domain of the CONTROL signals in a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    /// Single-point (SPC): boolean-valued controls
    #[serde(alias = "spc")]
    SinglePoint,
    /// Double-point (DPC): positional OPEN/CLOSED controls (switchgear)
    #[default]
    #[serde(alias = "dpc")]
    DoublePoint,
}

impl TestMode {
    /// Assessment value assumed at the synthetic baseline step
    pub fn baseline_assessment(&self) -> bool {
        match self {
            TestMode::SinglePoint => false,
            TestMode::DoublePoint => true,
        }
    }

    /// True for modes whose controls carry position codes
    pub fn is_positional(&self) -> bool {
        matches!(self, TestMode::DoublePoint)
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestMode::SinglePoint => write!(f, "SPC"),
            TestMode::DoublePoint => write!(f, "DPC"),
        }
    }
}

/// Canonical double-point position code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "POS_ON")]
    On,
    #[serde(rename = "POS_OFF")]
    Off,
}

impl Position {
    /// Wire code of this position
    pub fn code(&self) -> &'static str {
        match self {
            Position::On => "POS_ON",
            Position::Off => "POS_OFF",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Normalized per-step value of a CONTROL or ASSESS signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    /// Position code (serialized as `"POS_ON"` / `"POS_OFF"`)
    Position(Position),
    /// Boolean value (serialized as a JSON boolean)
    Boolean(bool),
}

impl SignalValue {
    /// Position code, if this value is positional
    pub fn as_position(&self) -> Option<Position> {
        match self {
            SignalValue::Position(p) => Some(*p),
            SignalValue::Boolean(_) => None,
        }
    }

    /// Baseline value for the given mode: open or `false`
    pub fn baseline(mode: TestMode) -> Self {
        match mode {
            TestMode::SinglePoint => SignalValue::Boolean(false),
            TestMode::DoublePoint => SignalValue::Position(Position::Off),
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Position(p) => write!(f, "{}", p),
            SignalValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// Raw cell as delivered by the spreadsheet reader, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Bool(bool),
    Text(String),
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCell::Bool(v) => write!(f, "{}", v),
            RawCell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawCell {
    fn from(token: &str) -> Self {
        RawCell::Text(token.to_string())
    }
}

impl From<bool> for RawCell {
    fn from(value: bool) -> Self {
        RawCell::Bool(value)
    }
}

/// Command result code expected on the COMMAND signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandCode {
    #[serde(rename = "CAR_NO_OPERATION")]
    NoOperation,
    #[serde(rename = "CAR_POSITION_CHANGED")]
    PositionChanged,
    #[serde(rename = "CAR_BLOCKED_BY_INTERLOCKING")]
    BlockedByInterlocking,
}

impl CommandCode {
    /// Wire code of this command result
    pub fn code(&self) -> &'static str {
        match self {
            CommandCode::NoOperation => "CAR_NO_OPERATION",
            CommandCode::PositionChanged => "CAR_POSITION_CHANGED",
            CommandCode::BlockedByInterlocking => "CAR_BLOCKED_BY_INTERLOCKING",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur while generating a test case
#[derive(Debug, thiserror::Error)]
pub enum FatError {
    #[error("Malformed input: signal {signal} step {step}: unrecognized token {token:?}")]
    MalformedInput {
        signal: String,
        step: usize,
        token: String,
    },

    #[error("Ragged position matrix: signal {signal} has {found} steps, expected {expected}")]
    RaggedMatrix {
        signal: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid signal groups: {0}")]
    InvalidGroups(String),

    #[error("Invalid breaker naming pattern {pattern:?}: {reason}")]
    InvalidBreakerPattern { pattern: String, reason: String },

    #[error("Sequencing conflict at step {step}: closing {closing:?} while opening {opening:?}")]
    SequencingConflict {
        step: usize,
        closing: Vec<String>,
        opening: Vec<String>,
    },

    #[error("Assessment coverage: no {missing} value in assessment sequence")]
    AssessmentCoverage { missing: bool },

    #[error("Step {step} out of range for transition classification (num_test_steps = {num_test_steps})")]
    StepOutOfRange { step: usize, num_test_steps: usize },

    #[error("Invalid truth-table expression: {0}")]
    InvalidExpression(String),

    #[error("Engine defect: generated document violates schema: {0}")]
    EngineDefect(#[from] SchemaError),
}

impl FatError {
    /// True if the error stems from the engine rather than from the input data
    pub fn is_engine_defect(&self) -> bool {
        matches!(self, FatError::EngineDefect(_))
    }
}
