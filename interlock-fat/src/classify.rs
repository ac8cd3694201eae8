//! Circuit-breaker transition classifier
//!
//! Classifies, per breaker, the move from step `i-1` to step `i`.

use crate::normalize::PositionMatrix;
use crate::signals::BreakerSet;
use crate::types::{FatError, Position, Result, SignalAddress};

/// Transition of one breaker between adjacent steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// OFF → ON
    Closing,
    /// ON → OFF
    Opening,
    /// Anything else, including ON → ON and OFF → OFF
    Unchanged,
}

impl Transition {
    /// Classify a pair of adjacent positions
    pub fn between(previous: Position, current: Position) -> Self {
        match (previous, current) {
            (Position::Off, Position::On) => Transition::Closing,
            (Position::On, Position::Off) => Transition::Opening,
            _ => Transition::Unchanged,
        }
    }
}

/// Breakers of one step, partitioned by transition
///
/// Each list is in address order; a breaker appears in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepTransitions {
    pub step: usize,
    pub closing: Vec<SignalAddress>,
    pub opening: Vec<SignalAddress>,
    pub unchanged: Vec<SignalAddress>,
}

impl StepTransitions {
    pub fn any_closing(&self) -> bool {
        !self.closing.is_empty()
    }

    pub fn any_opening(&self) -> bool {
        !self.opening.is_empty()
    }
}

/// Classify every breaker for the transition into `step` (`step >= 1`)
pub fn classify_step(
    breakers: &BreakerSet,
    matrix: &PositionMatrix,
    step: usize,
) -> Result<StepTransitions> {
    let num_test_steps = matrix.num_test_steps();
    if step == 0 || step >= num_test_steps {
        return Err(FatError::StepOutOfRange {
            step,
            num_test_steps,
        });
    }

    let mut transitions = StepTransitions {
        step,
        ..Default::default()
    };

    for breaker in breakers.iter() {
        let previous = position_at(matrix, breaker, step - 1)?;
        let current = position_at(matrix, breaker, step)?;

        match Transition::between(previous, current) {
            Transition::Closing => transitions.closing.push(breaker.clone()),
            Transition::Opening => transitions.opening.push(breaker.clone()),
            Transition::Unchanged => transitions.unchanged.push(breaker.clone()),
        }
    }

    log::trace!(
        "Step {}: closing {:?}, opening {:?}",
        step,
        transitions.closing,
        transitions.opening
    );

    Ok(transitions)
}

fn position_at(matrix: &PositionMatrix, breaker: &SignalAddress, step: usize) -> Result<Position> {
    let value = matrix.value(breaker, step).ok_or_else(|| {
        FatError::InvalidGroups(format!("breaker {} has no step row", breaker))
    })?;

    value.as_position().ok_or_else(|| FatError::MalformedInput {
        signal: breaker.to_string(),
        step,
        token: value.to_string(),
    })
}
