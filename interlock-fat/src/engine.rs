//! Main engine API
//!
//! The `Engine` is the entry point of the library. It turns one raw test case
//! (grouped signals, raw step columns, raw assessment row) into a `TestCase`,
//! and wraps test cases into a validated `FatDocument`.

use crate::assemble::{assemble_steps, signal_groups};
use crate::command::assign_commands;
use crate::config::EngineConfig;
use crate::document::{FatDocument, TestCase};
use crate::normalize::{normalize, NormalizedCase, RawRow};
use crate::schema::{validate_document, SchemaError};
use crate::sequence::Sequencer;
use crate::signals::{dut_from_assess, resolve_parent, BreakerPattern, BreakerSet, SignalGroups};
use crate::types::{FatError, RawCell, Result};

/// Raw input of one test case, as produced by the spreadsheet reader
#[derive(Debug, Clone)]
pub struct TestCaseInput {
    /// Test case name
    pub name: String,
    /// Parent IED; resolved from `ieds` and the DUT when absent
    pub parent: Option<String>,
    /// IED names of the substation
    pub ieds: Vec<String>,
    /// Signal classification
    pub groups: SignalGroups,
    /// Pre-computed breaker set; derived from the engine's naming pattern when absent
    pub breakers: Option<BreakerSet>,
    /// Raw step tokens, one row per CONTROL signal
    pub controls: Vec<RawRow>,
    /// Raw assessment value per step (baseline excluded)
    pub assessment: Vec<RawCell>,
}

impl TestCaseInput {
    pub fn new(
        name: impl Into<String>,
        groups: SignalGroups,
        controls: Vec<RawRow>,
        assessment: Vec<RawCell>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: None,
            ieds: Vec::new(),
            groups,
            breakers: None,
            controls,
            assessment,
        }
    }

    /// Builder method: set the parent IED explicitly
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Builder method: IED names used to resolve the parent
    pub fn with_ieds(mut self, ieds: Vec<String>) -> Self {
        self.ieds = ieds;
        self
    }

    /// Builder method: use a pre-computed breaker set
    pub fn with_breakers(mut self, breakers: BreakerSet) -> Self {
        self.breakers = Some(breakers);
        self
    }

    /// Device-under-test identifier derived from the ASSESS address
    pub fn dut(&self) -> &str {
        dut_from_assess(self.groups.assess())
    }
}

/// The engine - entry point for all generation operations
pub struct Engine {
    config: EngineConfig,
    breaker_pattern: BreakerPattern,
}

impl Engine {
    /// Create an engine with the default breaker naming convention
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            breaker_pattern: BreakerPattern::default(),
        }
    }

    /// Builder method: use a custom breaker naming convention
    pub fn with_breaker_pattern(mut self, pattern: BreakerPattern) -> Self {
        self.breaker_pattern = pattern;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate one test case
    pub fn test_case(&self, input: &TestCaseInput) -> Result<TestCase> {
        log::info!("Generating test case {:?} ({} mode)", input.name, self.config.mode);

        let groups = &input.groups;
        if self.config.mode.is_positional() && groups.command().is_none() {
            return Err(FatError::InvalidGroups(
                "positional test cases require a COMMAND signal".to_string(),
            ));
        }

        let breakers = self.breakers_for(input);
        let case = normalize(
            groups,
            &input.controls,
            &input.assessment,
            self.config.mode,
            self.config.baseline_assessment(),
        )?;

        let run = CaseRun {
            groups,
            breakers: &breakers,
            case: &case,
        };
        let parent = match &input.parent {
            Some(parent) => parent.clone(),
            None => resolve_parent(input.ieds.as_slice(), input.dut()),
        };

        let mut test_case = TestCase::header(input.name.clone(), parent, &self.config);
        test_case.signal_groups = signal_groups(groups);
        test_case.test_steps = run.steps()?;

        log::info!(
            "Test case {:?}: {} steps, {} breakers",
            input.name,
            test_case.test_steps.len(),
            breakers.len()
        );
        Ok(test_case)
    }

    /// Wrap test cases into a document, running the schema self-check if enabled
    pub fn document(&self, test_cases: Vec<TestCase>) -> Result<FatDocument> {
        let document = FatDocument::new(self.config.version.clone(), test_cases);

        if self.config.validate_output {
            let value = serde_json::to_value(&document).map_err(|e| SchemaError {
                path: "/".to_string(),
                reason: format!("document does not serialize: {}", e),
            })?;
            validate_document(&value)?;
            log::debug!("Generated document passed schema self-check");
        }

        Ok(document)
    }

    /// Generate a document with one test case per input
    pub fn generate(&self, inputs: &[TestCaseInput]) -> Result<FatDocument> {
        let test_cases = inputs
            .iter()
            .map(|input| self.test_case(input))
            .collect::<Result<Vec<_>>>()?;
        self.document(test_cases)
    }

    fn breakers_for(&self, input: &TestCaseInput) -> BreakerSet {
        if !self.config.mode.is_positional() {
            log::debug!("Boolean-valued test case: breaker ordering not applied");
            return BreakerSet::empty();
        }

        let breakers = match &input.breakers {
            Some(breakers) => breakers.clone(),
            None => self.breaker_pattern.breaker_set(&input.groups),
        };
        if breakers.is_empty() {
            log::warn!(
                "Test case {:?} has no circuit breaker; every step uses grouped order",
                input.name
            );
        }
        breakers
    }
}

/// Per-test-case context threaded through sequencing, command assignment
/// and assembly
struct CaseRun<'a> {
    groups: &'a SignalGroups,
    breakers: &'a BreakerSet,
    case: &'a NormalizedCase,
}

impl CaseRun<'_> {
    fn steps(&self) -> Result<Vec<crate::document::TestStep>> {
        let sequenced = Sequencer::new(self.groups, self.breakers).sequence_all(&self.case.matrix)?;

        let commands = match self.groups.command() {
            Some(_) => Some(assign_commands(&self.case.assessment)?),
            None => None,
        };

        assemble_steps(&sequenced, self.case, commands.as_ref())
    }
}
