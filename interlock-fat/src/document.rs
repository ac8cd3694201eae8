//! Output document model
//!
//! Serde types mirroring the FAT test-definition JSON consumed by the test
//! runner. Field names are the runner's camelCase names.

use crate::config::EngineConfig;
use crate::types::{CommandCode, GroupType, SignalAddress, SignalValue};
use serde::{Deserialize, Serialize};

/// Top-level FAT document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatDocument {
    pub version: String,
    pub test_cases: Vec<TestCase>,
}

impl FatDocument {
    pub fn new(version: impl Into<String>, test_cases: Vec<TestCase>) -> Self {
        Self {
            version: version.into(),
            test_cases,
        }
    }

    /// Pretty-printed JSON (two-space indent)
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub name: String,
    pub parent: String,
    pub auto_set_control_values: bool,
    pub auto_assess: bool,
    pub assessment_lockout_time: f64,
    pub auto_assess_timeout: f64,
    pub switch_operation_time: f64,
    pub signal_groups: Vec<SignalGroup>,
    pub test_steps: Vec<TestStep>,
}

impl TestCase {
    /// Test case header from the engine configuration, with no groups or steps
    pub fn header(name: impl Into<String>, parent: impl Into<String>, config: &EngineConfig) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            auto_set_control_values: config.auto_set_control_values,
            auto_assess: config.auto_assess,
            assessment_lockout_time: config.timing.assessment_lockout_time,
            auto_assess_timeout: config.timing.auto_assess_timeout,
            switch_operation_time: config.timing.switch_operation_time,
            signal_groups: Vec::new(),
            test_steps: Vec::new(),
        }
    }
}

/// Signals of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalGroup {
    pub group_type: GroupType,
    pub signal_refs: Vec<SignalAddress>,
}

/// One test step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStep {
    pub description: String,
    pub ordered: bool,
    pub expected: Vec<Expectation>,
}

/// Expected state of one signal within a step
///
/// Serializes to exactly one of `{signalRef, value}` or
/// `{signalRef, commandResult}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    #[serde(rename_all = "camelCase")]
    Value {
        signal_ref: SignalAddress,
        value: SignalValue,
    },
    #[serde(rename_all = "camelCase")]
    Command {
        signal_ref: SignalAddress,
        command_result: CommandCode,
    },
}

impl Expectation {
    pub fn signal_ref(&self) -> &SignalAddress {
        match self {
            Expectation::Value { signal_ref, .. } => signal_ref,
            Expectation::Command { signal_ref, .. } => signal_ref,
        }
    }

    pub fn command_result(&self) -> Option<CommandCode> {
        match self {
            Expectation::Command { command_result, .. } => Some(*command_result),
            Expectation::Value { .. } => None,
        }
    }
}
