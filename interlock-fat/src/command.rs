//! Command assignment
//!
//! A valid test exercises both a permitted and a blocked operation: the first
//! step whose assessment is `true` expects the position to change, the first
//! step whose assessment is `false` expects the command to be blocked. Every
//! other step expects no operation.

use crate::types::{CommandCode, FatError, Result};

/// Expected command result per step, baseline included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRow {
    codes: Vec<CommandCode>,
}

impl CommandRow {
    /// A row of `num_test_steps` no-operation codes
    pub fn no_operation(num_test_steps: usize) -> Self {
        Self {
            codes: vec![CommandCode::NoOperation; num_test_steps],
        }
    }

    pub fn get(&self, step: usize) -> Option<CommandCode> {
        self.codes.get(step).copied()
    }

    pub fn as_slice(&self) -> &[CommandCode] {
        &self.codes
    }
}

/// Build the command row from the full assessment sequence
pub fn assign_commands(assessment: &[bool]) -> Result<CommandRow> {
    let idx_true = first_index(assessment, true)?;
    let idx_false = first_index(assessment, false)?;

    let mut row = CommandRow::no_operation(assessment.len());
    // Fixed order: on a collision the blocked code wins.
    row.codes[idx_true] = CommandCode::PositionChanged;
    row.codes[idx_false] = CommandCode::BlockedByInterlocking;

    log::debug!(
        "Commands: {} at step {}, {} at step {}",
        CommandCode::PositionChanged,
        idx_true,
        CommandCode::BlockedByInterlocking,
        idx_false
    );

    Ok(row)
}

fn first_index(assessment: &[bool], wanted: bool) -> Result<usize> {
    assessment
        .iter()
        .position(|&v| v == wanted)
        .ok_or(FatError::AssessmentCoverage { missing: wanted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use CommandCode::*;

    #[test]
    fn test_baseline_counts_in_search() {
        // Baseline `true` prepended to [T, T, F, T]
        let row = assign_commands(&[true, true, true, false, true]).unwrap();
        assert_eq!(
            row.as_slice(),
            &[PositionChanged, NoOperation, NoOperation, BlockedByInterlocking, NoOperation]
        );
    }

    #[test]
    fn test_false_baseline() {
        let row = assign_commands(&[false, true, true, false]).unwrap();
        assert_eq!(
            row.as_slice(),
            &[BlockedByInterlocking, PositionChanged, NoOperation, NoOperation]
        );
    }

    #[test]
    fn test_exactly_two_non_default_codes() {
        let row = assign_commands(&[true, false, false, true, false, true]).unwrap();
        let non_default = row.as_slice().iter().filter(|c| **c != NoOperation).count();
        assert_eq!(non_default, 2);
        assert_eq!(row.as_slice().len(), 6);
    }

    #[test]
    fn test_degenerate_sequences_fail() {
        assert!(matches!(
            assign_commands(&[true, true, true]),
            Err(FatError::AssessmentCoverage { missing: false })
        ));
        assert!(matches!(
            assign_commands(&[false, false]),
            Err(FatError::AssessmentCoverage { missing: true })
        ));
        assert!(matches!(
            assign_commands(&[]),
            Err(FatError::AssessmentCoverage { missing: true })
        ));
    }
}
