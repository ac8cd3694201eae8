// Property-based tests for the sequencing invariants
// Random bays: 1-4 CONTROL signals, any subset of them breakers, 1-6 raw steps

use interlock_fat::{
    assign_commands, classify_step, normalize, BreakerSet, CommandCode, Engine, EngineConfig,
    FatError, Position, RawCell, RawRow, SignalAddress, SignalGroups, SignalValue, TestCaseInput,
    TestMode,
};
use proptest::collection::vec;
use proptest::prelude::*;

const ASSESS: &str = "B1CTRL/CILO";
const COMMAND: &str = "B1CTRL/CSWI";

#[derive(Debug, Clone)]
struct Bay {
    // Per CONTROL signal, per raw step; true = CLOSED
    positions: Vec<Vec<bool>>,
    breakers: Vec<bool>,
    // Raw assessment row; starts with false so DPC cases always cover both values
    assessment: Vec<bool>,
}

fn bay_strategy() -> impl Strategy<Value = Bay> {
    (1usize..=4, 1usize..=6).prop_flat_map(|(controls, steps)| {
        (
            vec(vec(any::<bool>(), steps), controls),
            vec(any::<bool>(), controls),
            vec(any::<bool>(), steps - 1),
        )
            .prop_map(|(positions, breakers, tail)| {
                let mut assessment = vec![false];
                assessment.extend(tail);
                Bay {
                    positions,
                    breakers,
                    assessment,
                }
            })
    })
}

fn control_address(i: usize) -> SignalAddress {
    SignalAddress::new(format!("B1/S{}", i))
}

impl Bay {
    fn groups(&self) -> SignalGroups {
        SignalGroups::new(
            (0..self.positions.len()).map(control_address).collect(),
            ASSESS.into(),
            Some(COMMAND.into()),
        )
        .unwrap()
    }

    fn breaker_set(&self, groups: &SignalGroups) -> BreakerSet {
        let addresses = self
            .breakers
            .iter()
            .enumerate()
            .filter(|(_, is_breaker)| **is_breaker)
            .map(|(i, _)| control_address(i));
        BreakerSet::from_addresses(groups, addresses).unwrap()
    }

    fn rows(&self) -> Vec<RawRow> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, steps)| {
                let cells = steps
                    .iter()
                    .map(|&closed| RawCell::from(if closed { "CLOSED" } else { "OPEN" }))
                    .collect();
                RawRow::new(control_address(i), cells)
            })
            .collect()
    }

    fn raw_assessment(&self) -> Vec<RawCell> {
        self.assessment.iter().map(|&v| RawCell::from(v)).collect()
    }

    fn input(&self) -> TestCaseInput {
        let groups = self.groups();
        let breakers = self.breaker_set(&groups);
        TestCaseInput::new("property", groups, self.rows(), self.raw_assessment())
            .with_breakers(breakers)
    }

    // Position of control `i` at normalized step `step` (0 = baseline OFF)
    fn closed_at(&self, i: usize, step: usize) -> bool {
        step > 0 && self.positions[i][step - 1]
    }

    fn moves(&self, step: usize) -> (bool, bool) {
        let mut closing = false;
        let mut opening = false;
        for (i, _) in self.breakers.iter().enumerate().filter(|(_, b)| **b) {
            match (self.closed_at(i, step - 1), self.closed_at(i, step)) {
                (false, true) => closing = true,
                (true, false) => opening = true,
                _ => {}
            }
        }
        (closing, opening)
    }

    fn has_conflict(&self) -> bool {
        (1..=self.assessment.len()).any(|step| self.moves(step) == (true, true))
    }
}

proptest! {
    #[test]
    fn normalizer_prepends_baseline(bay in bay_strategy()) {
        let groups = bay.groups();
        let case = normalize(&groups, &bay.rows(), &bay.raw_assessment(), TestMode::DoublePoint, true)
            .unwrap();

        prop_assert_eq!(case.num_test_steps(), bay.assessment.len() + 1);
        prop_assert_eq!(case.assessment.len(), bay.assessment.len() + 1);
        prop_assert!(case.assessment[0]);
        for (_, values) in case.matrix.rows() {
            prop_assert_eq!(values.len(), bay.assessment.len() + 1);
            prop_assert_eq!(values[0], SignalValue::Position(Position::Off));
        }
    }

    #[test]
    fn classifier_is_exclusive(bay in bay_strategy()) {
        let groups = bay.groups();
        let breakers = bay.breaker_set(&groups);
        let case = normalize(&groups, &bay.rows(), &bay.raw_assessment(), TestMode::DoublePoint, true)
            .unwrap();

        for step in 1..case.num_test_steps() {
            let t = classify_step(&breakers, &case.matrix, step).unwrap();
            prop_assert!(t.closing.iter().all(|b| !t.opening.contains(b)));
            prop_assert_eq!(t.closing.len() + t.opening.len() + t.unchanged.len(), breakers.len());
        }
    }

    #[test]
    fn generation_is_deterministic(bay in bay_strategy()) {
        let engine = Engine::new(EngineConfig::default());
        let first = engine.generate(&[bay.input()]);
        let second = engine.generate(&[bay.input()]);

        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.to_json_pretty().unwrap(), b.to_json_pretty().unwrap());
            }
            (Err(a), Err(b)) => {
                prop_assert_eq!(a.to_string(), b.to_string());
            }
            (a, b) => {
                prop_assert!(false, "diverging results: {:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn breaker_ordering_holds(bay in bay_strategy()) {
        let engine = Engine::new(EngineConfig::default());
        let result = engine.test_case(&bay.input());

        if bay.has_conflict() {
            prop_assert!(matches!(result, Err(FatError::SequencingConflict { .. })), "expected SequencingConflict");
            return Ok(());
        }

        let case = result.unwrap();
        let groups = bay.groups();
        let breakers = bay.breaker_set(&groups);
        let n = bay.positions.len();

        for (step, test_step) in case.test_steps.iter().enumerate() {
            let flags: Vec<bool> = test_step.expected[..n]
                .iter()
                .map(|e| breakers.contains(e.signal_ref()))
                .collect();

            let (closing, opening) = if step == 0 { (false, false) } else { bay.moves(step) };
            if closing {
                prop_assert!(flags.windows(2).all(|w| w[0] <= w[1]), "step {}: {:?}", step, flags);
            } else if opening {
                prop_assert!(flags.windows(2).all(|w| w[0] >= w[1]), "step {}: {:?}", step, flags);
            } else {
                let grouped: Vec<&SignalAddress> = groups.control().iter().collect();
                let actual: Vec<&SignalAddress> =
                    test_step.expected[..n].iter().map(|e| e.signal_ref()).collect();
                prop_assert_eq!(actual, grouped);
            }
        }
    }

    #[test]
    fn assess_and_command_close_every_step(bay in bay_strategy()) {
        prop_assume!(!bay.has_conflict());
        let engine = Engine::new(EngineConfig::default());
        let case = engine.test_case(&bay.input()).unwrap();

        for step in &case.test_steps {
            let n = step.expected.len();
            prop_assert_eq!(n, bay.positions.len() + 2);
            prop_assert_eq!(step.expected[n - 2].signal_ref().as_str(), ASSESS);
            prop_assert!(step.expected[n - 2].command_result().is_none());
            prop_assert_eq!(step.expected[n - 1].signal_ref().as_str(), COMMAND);
            prop_assert!(step.expected[n - 1].command_result().is_some());
        }
    }

    #[test]
    fn command_row_marks_first_true_and_first_false(assessment in vec(any::<bool>(), 1..24)) {
        let first_true = assessment.iter().position(|&v| v);
        let first_false = assessment.iter().position(|&v| !v);

        match (first_true, first_false) {
            (Some(t), Some(f)) => {
                let row = assign_commands(&assessment).unwrap();
                prop_assert_eq!(row.as_slice().len(), assessment.len());
                for (i, code) in row.as_slice().iter().enumerate() {
                    let expected = if i == t {
                        CommandCode::PositionChanged
                    } else if i == f {
                        CommandCode::BlockedByInterlocking
                    } else {
                        CommandCode::NoOperation
                    };
                    prop_assert_eq!(*code, expected);
                }
                let marked = row.as_slice().iter().filter(|c| **c != CommandCode::NoOperation).count();
                prop_assert_eq!(marked, 2);
            }
            (None, _) => {
                let is_missing_true = matches!(assign_commands(&assessment), Err(FatError::AssessmentCoverage { missing: true }));
                prop_assert!(is_missing_true);
            }
            (_, None) => {
                let is_missing_false = matches!(assign_commands(&assessment), Err(FatError::AssessmentCoverage { missing: false }));
                prop_assert!(is_missing_false);
            }
        }
    }
}
