//! Test definition files
//!
//! A test definition is the tabular input of one test case: every signal
//! with its group and raw step tokens, plus the raw assessment row. TOML and
//! JSON are accepted, selected by file extension.

use anyhow::{bail, Context, Result};
use interlock_fat::{
    BreakerSet, GroupType, RawCell, RawRow, SignalAddress, SignalGroups, TestCaseInput, TestMode,
    TruthTable,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One test case as written by the test author
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// IED names used to resolve the parent when `parent` is absent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ieds: Vec<String>,
    /// Overrides `[engine] mode` for this test case
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TestMode>,
    /// Explicit breaker addresses; the naming patterns are used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakers: Option<Vec<String>>,
    /// Raw assessment per step, baseline excluded
    pub assessment: Vec<RawCell>,
    pub signals: Vec<SignalDefinition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SignalDefinition {
    pub address: String,
    pub group: GroupType,
    /// Raw step tokens (CONTROL signals only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<RawCell>,
}

impl SignalDefinition {
    fn new(address: impl Into<String>, group: GroupType, steps: Vec<RawCell>) -> Self {
        Self {
            address: address.into(),
            group,
            steps,
        }
    }
}

impl TestDefinition {
    /// Convert to engine input
    pub fn to_input(&self) -> interlock_fat::Result<TestCaseInput> {
        let groups = SignalGroups::from_classified(
            self.signals
                .iter()
                .map(|s| (SignalAddress::new(s.address.as_str()), s.group)),
        )?;

        let mut controls = Vec::new();
        for signal in &self.signals {
            match signal.group {
                GroupType::Control => {
                    controls.push(RawRow::new(signal.address.as_str(), signal.steps.clone()))
                }
                _ if !signal.steps.is_empty() => {
                    log::warn!(
                        "Ignoring step tokens of {} signal {}",
                        signal.group,
                        signal.address
                    );
                }
                _ => {}
            }
        }

        let breakers = match &self.breakers {
            Some(addresses) => Some(BreakerSet::from_addresses(
                &groups,
                addresses.iter().map(|a| SignalAddress::new(a.as_str())),
            )?),
            None => None,
        };

        let mut input = TestCaseInput::new(self.name.clone(), groups, controls, self.assessment.clone())
            .with_ieds(self.ieds.clone());
        if let Some(parent) = &self.parent {
            input = input.with_parent(parent.clone());
        }
        if let Some(breakers) = breakers {
            input = input.with_breakers(breakers);
        }
        Ok(input)
    }

    /// Skeleton definition from a truth table, with `InputK` placeholder addresses
    ///
    /// Positional skeletons also get a `Command1` COMMAND placeholder.
    pub fn from_truth_table(name: impl Into<String>, table: &TruthTable, mode: TestMode) -> Self {
        let mut signals: Vec<SignalDefinition> = (0..table.num_inputs())
            .map(|i| {
                SignalDefinition::new(
                    format!("Input{}", i + 1),
                    GroupType::Control,
                    table.input_tokens(i, mode),
                )
            })
            .collect();
        signals.push(SignalDefinition::new("Output1", GroupType::Assess, Vec::new()));
        if mode.is_positional() {
            signals.push(SignalDefinition::new("Command1", GroupType::Command, Vec::new()));
        }

        Self {
            name: name.into(),
            parent: None,
            ieds: Vec::new(),
            mode: Some(mode),
            breakers: None,
            assessment: table.assessment(),
            signals,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize test definition")
    }
}

/// Load a test definition, format chosen by extension (`.toml` or `.json`)
pub fn load_definition(path: &Path) -> Result<TestDefinition> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test definition: {:?}", path))?;

    let definition = match extension(path).as_deref() {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse test definition: {:?}", path))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse test definition: {:?}", path))?,
        _ => bail!("Unsupported test definition format: {:?} (expected .toml or .json)", path),
    };

    Ok(definition)
}

/// True if the file looks like a test definition
pub fn is_definition_file(path: &Path) -> bool {
    path.is_file() && matches!(extension(path).as_deref(), Some("toml") | Some("json"))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
