//! Step assembler
//!
//! Merges sequenced slots, normalized values and the command row into the
//! `testSteps` list of a test case.

use crate::command::CommandRow;
use crate::document::{Expectation, SignalGroup, TestStep};
use crate::normalize::NormalizedCase;
use crate::sequence::SequencedStep;
use crate::signals::SignalGroups;
use crate::types::{FatError, GroupType, Result, SignalValue};

/// Build one `TestStep` per sequenced step, in step-index order
///
/// `commands` may be `None` only when the test case has no COMMAND signal.
pub fn assemble_steps(
    sequenced: &[SequencedStep],
    case: &NormalizedCase,
    commands: Option<&CommandRow>,
) -> Result<Vec<TestStep>> {
    let mut steps = Vec::with_capacity(sequenced.len());

    for (expected_index, seq) in sequenced.iter().enumerate() {
        if seq.step != expected_index {
            return Err(FatError::StepOutOfRange {
                step: seq.step,
                num_test_steps: case.num_test_steps(),
            });
        }

        let expected = seq
            .slots
            .iter()
            .map(|slot| match slot.group {
                GroupType::Control => {
                    let value = case.matrix.value(&slot.address, seq.step).ok_or(
                        FatError::StepOutOfRange {
                            step: seq.step,
                            num_test_steps: case.num_test_steps(),
                        },
                    )?;
                    Ok(Expectation::Value {
                        signal_ref: slot.address.clone(),
                        value,
                    })
                }
                GroupType::Assess => {
                    let value = case.assessment.get(seq.step).copied().ok_or(
                        FatError::StepOutOfRange {
                            step: seq.step,
                            num_test_steps: case.num_test_steps(),
                        },
                    )?;
                    Ok(Expectation::Value {
                        signal_ref: slot.address.clone(),
                        value: SignalValue::Boolean(value),
                    })
                }
                GroupType::Command => {
                    let command_result = commands
                        .and_then(|row| row.get(seq.step))
                        .ok_or_else(|| {
                            FatError::InvalidGroups(format!(
                                "no command result for {} at step {}",
                                slot.address, seq.step
                            ))
                        })?;
                    Ok(Expectation::Command {
                        signal_ref: slot.address.clone(),
                        command_result,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        steps.push(TestStep {
            description: String::new(),
            ordered: seq.ordered,
            expected,
        });
    }

    Ok(steps)
}

/// The `signalGroups` block of a test case
pub fn signal_groups(groups: &SignalGroups) -> Vec<SignalGroup> {
    groups
        .metadata()
        .into_iter()
        .map(|(group_type, signal_refs)| SignalGroup {
            group_type,
            signal_refs,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::assign_commands;
    use crate::normalize::{normalize, RawRow};
    use crate::sequence::Sequencer;
    use crate::signals::BreakerSet;
    use crate::types::{CommandCode, Position, RawCell, TestMode};

    fn fixture() -> (SignalGroups, NormalizedCase) {
        let groups = SignalGroups::new(
            vec!["B1/QB1".into(), "B1/QA1".into()],
            "B1CTRL/CILO".into(),
            Some("B1CTRL/CSWI".into()),
        )
        .unwrap();
        let rows = vec![
            RawRow::new("B1/QB1", vec!["CLOSED".into(), "CLOSED".into()]),
            RawRow::new("B1/QA1", vec!["OPEN".into(), "CLOSED".into()]),
        ];
        let assessment: Vec<RawCell> = vec![true.into(), false.into()];
        let case = normalize(&groups, &rows, &assessment, TestMode::DoublePoint, true).unwrap();
        (groups, case)
    }

    #[test]
    fn test_assembled_steps() {
        let (groups, case) = fixture();
        let breakers = BreakerSet::from_addresses(&groups, vec!["B1/QA1".into()]).unwrap();
        let sequenced = Sequencer::new(&groups, &breakers)
            .sequence_all(&case.matrix)
            .unwrap();
        let commands = assign_commands(&case.assessment).unwrap();
        let steps = assemble_steps(&sequenced, &case, Some(&commands)).unwrap();

        assert_eq!(steps.len(), 3);
        assert!(!steps[0].ordered);
        assert!(steps[1].ordered && steps[2].ordered);
        assert_eq!(steps[0].description, "");

        // Step 2 closes QA1: QB1 first
        let step2 = &steps[2];
        assert_eq!(step2.expected[0].signal_ref().as_str(), "B1/QB1");
        assert_eq!(
            step2.expected[1],
            Expectation::Value {
                signal_ref: "B1/QA1".into(),
                value: SignalValue::Position(Position::On),
            }
        );
        assert_eq!(
            step2.expected[2],
            Expectation::Value {
                signal_ref: "B1CTRL/CILO".into(),
                value: SignalValue::Boolean(false),
            }
        );
        assert_eq!(
            step2.expected[3].command_result(),
            Some(CommandCode::BlockedByInterlocking)
        );
        assert_eq!(
            steps[0].expected[3].command_result(),
            Some(CommandCode::PositionChanged)
        );
    }

    #[test]
    fn test_missing_command_row_is_rejected() {
        let (groups, case) = fixture();
        let breakers = BreakerSet::empty();
        let sequenced = Sequencer::new(&groups, &breakers)
            .sequence_all(&case.matrix)
            .unwrap();
        assert!(assemble_steps(&sequenced, &case, None).is_err());
    }

    #[test]
    fn test_signal_groups_block() {
        let (groups, _) = fixture();
        let block = signal_groups(&groups);
        assert_eq!(block.len(), 3);
        assert_eq!(block[0].group_type, GroupType::Control);
        assert_eq!(block[0].signal_refs.len(), 2);
        assert_eq!(block[2].signal_refs[0].as_str(), "B1CTRL/CSWI");
    }
}
