//! Step sequencer
//!
//! Chooses the order in which the expectations of a step are asserted.
//! Disconnectors must reach their final position before a breaker closes, and
//! a breaker must open before disconnectors move. ASSESS and COMMAND always
//! close the step, in that order.

use crate::classify::{classify_step, StepTransitions};
use crate::normalize::PositionMatrix;
use crate::signals::{BreakerSet, SignalGroups};
use crate::types::{FatError, GroupType, Result, SignalAddress};
use std::cmp::Ordering;

/// Ordering policy applied to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Baseline step: grouped order, unordered assertion
    Initial,
    /// At least one breaker closes: breakers after the other CONTROL signals
    Closing,
    /// At least one breaker opens: breakers before the other CONTROL signals
    Opening,
    /// No breaker transition: grouped order
    Unchanged,
}

/// One signal slot of a step's `expected` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub address: SignalAddress,
    pub group: GroupType,
}

/// Ordered slots of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedStep {
    pub step: usize,
    pub ordered: bool,
    pub policy: StepPolicy,
    pub slots: Vec<Slot>,
}

/// Sequencer for one test case
pub struct Sequencer<'a> {
    groups: &'a SignalGroups,
    breakers: &'a BreakerSet,
}

impl<'a> Sequencer<'a> {
    pub fn new(groups: &'a SignalGroups, breakers: &'a BreakerSet) -> Self {
        Self { groups, breakers }
    }

    /// The baseline step (index 0)
    pub fn initial(&self) -> SequencedStep {
        SequencedStep {
            step: 0,
            ordered: false,
            policy: StepPolicy::Initial,
            slots: self.with_tail(self.groups.control().to_vec()),
        }
    }

    /// Sequence a step `i >= 1` from its classified breaker transitions
    pub fn sequence(&self, transitions: &StepTransitions) -> Result<SequencedStep> {
        let step = transitions.step;

        let policy = match (transitions.any_closing(), transitions.any_opening()) {
            (true, true) => {
                return Err(FatError::SequencingConflict {
                    step,
                    closing: transitions.closing.iter().map(|a| a.to_string()).collect(),
                    opening: transitions.opening.iter().map(|a| a.to_string()).collect(),
                });
            }
            (true, false) => StepPolicy::Closing,
            (false, true) => StepPolicy::Opening,
            (false, false) => StepPolicy::Unchanged,
        };

        let mut control = self.groups.control().to_vec();
        match policy {
            StepPolicy::Closing => control.sort_by(|a, b| self.compare(a, b, false)),
            StepPolicy::Opening => control.sort_by(|a, b| self.compare(a, b, true)),
            _ => {}
        }

        log::debug!("Step {}: {:?} order", step, policy);

        Ok(SequencedStep {
            step,
            ordered: true,
            policy,
            slots: self.with_tail(control),
        })
    }

    /// Sequence every step of the matrix, baseline first
    pub fn sequence_all(&self, matrix: &PositionMatrix) -> Result<Vec<SequencedStep>> {
        let mut steps = Vec::with_capacity(matrix.num_test_steps());
        steps.push(self.initial());
        for step in 1..matrix.num_test_steps() {
            let transitions = classify_step(self.breakers, matrix, step)?;
            steps.push(self.sequence(&transitions)?);
        }
        Ok(steps)
    }

    // Breaker group first or last, address order inside each group.
    fn compare(&self, a: &SignalAddress, b: &SignalAddress, breakers_first: bool) -> Ordering {
        let key = |x: &SignalAddress| self.breakers.contains(x) != breakers_first;
        key(a).cmp(&key(b)).then_with(|| a.cmp(b))
    }

    fn with_tail(&self, control: Vec<SignalAddress>) -> Vec<Slot> {
        let mut slots: Vec<Slot> = control
            .into_iter()
            .map(|address| Slot {
                address,
                group: GroupType::Control,
            })
            .collect();
        slots.push(Slot {
            address: self.groups.assess().clone(),
            group: GroupType::Assess,
        });
        if let Some(command) = self.groups.command() {
            slots.push(Slot {
                address: command.clone(),
                group: GroupType::Command,
            });
        }
        slots
    }
}
