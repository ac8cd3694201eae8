//! Position matrix normalizer
//!
//! Converts the raw step columns of a test case into canonical values and
//! prepends the synthetic baseline step (index 0).

use crate::signals::SignalGroups;
use crate::types::{FatError, Position, RawCell, Result, SignalAddress, SignalValue, TestMode};
use std::collections::HashMap;

/// One row of raw step tokens for a CONTROL signal
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub address: SignalAddress,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(address: impl Into<SignalAddress>, cells: Vec<RawCell>) -> Self {
        Self {
            address: address.into(),
            cells,
        }
    }
}

/// Normalized CONTROL values, one column per test step including the baseline
///
/// Every row has exactly `num_test_steps` values.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMatrix {
    rows: Vec<(SignalAddress, Vec<SignalValue>)>,
    index: HashMap<SignalAddress, usize>,
    num_test_steps: usize,
}

impl PositionMatrix {
    /// Number of test steps including the baseline step
    pub fn num_test_steps(&self) -> usize {
        self.num_test_steps
    }

    /// Full value sequence of a signal
    pub fn row(&self, address: &SignalAddress) -> Option<&[SignalValue]> {
        self.index
            .get(address)
            .map(|&i| self.rows[i].1.as_slice())
    }

    /// Value of a signal at a step
    pub fn value(&self, address: &SignalAddress, step: usize) -> Option<SignalValue> {
        self.row(address).and_then(|values| values.get(step).copied())
    }

    /// Rows in CONTROL order
    pub fn rows(&self) -> impl Iterator<Item = (&SignalAddress, &[SignalValue])> {
        self.rows.iter().map(|(a, v)| (a, v.as_slice()))
    }
}

/// Output of the normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCase {
    /// CONTROL positions
    pub matrix: PositionMatrix,
    /// Assessment value per step, baseline included
    pub assessment: Vec<bool>,
}

impl NormalizedCase {
    pub fn num_test_steps(&self) -> usize {
        self.matrix.num_test_steps()
    }
}

/// Normalize the raw CONTROL rows and the raw assessment row
///
/// Rows are reordered to the CONTROL order of `groups`; every CONTROL signal
/// must have exactly one row.
pub fn normalize(
    groups: &SignalGroups,
    controls: &[RawRow],
    assessment: &[RawCell],
    mode: TestMode,
    baseline_assessment: bool,
) -> Result<NormalizedCase> {
    let raw_steps = assessment.len();
    let num_test_steps = raw_steps + 1;

    let mut by_address: HashMap<&SignalAddress, &RawRow> = HashMap::new();
    for row in controls {
        if !groups.control().contains(&row.address) {
            return Err(FatError::InvalidGroups(format!(
                "step row for {} which is not a CONTROL signal",
                row.address
            )));
        }
        if by_address.insert(&row.address, row).is_some() {
            return Err(FatError::InvalidGroups(format!(
                "more than one step row for {}",
                row.address
            )));
        }
    }

    let mut rows = Vec::with_capacity(groups.control().len());
    let mut index = HashMap::with_capacity(groups.control().len());

    for address in groups.control() {
        let row = by_address.get(address).ok_or_else(|| {
            FatError::InvalidGroups(format!("no step row for CONTROL signal {}", address))
        })?;

        if row.cells.len() != raw_steps {
            return Err(FatError::RaggedMatrix {
                signal: address.to_string(),
                expected: raw_steps,
                found: row.cells.len(),
            });
        }

        let mut values = Vec::with_capacity(num_test_steps);
        values.push(SignalValue::baseline(mode));
        for (col, cell) in row.cells.iter().enumerate() {
            values.push(normalize_control(address, col + 1, cell, mode)?);
        }

        log::trace!("Normalized {}: {:?}", address, values);
        index.insert(address.clone(), rows.len());
        rows.push((address.clone(), values));
    }

    let mut assessment_values = Vec::with_capacity(num_test_steps);
    assessment_values.push(baseline_assessment);
    for (col, cell) in assessment.iter().enumerate() {
        assessment_values.push(parse_bool(cell).ok_or_else(|| FatError::MalformedInput {
            signal: groups.assess().to_string(),
            step: col + 1,
            token: cell.to_string(),
        })?);
    }

    log::debug!(
        "Normalized {} CONTROL signals over {} test steps ({} mode)",
        rows.len(),
        num_test_steps,
        mode
    );

    Ok(NormalizedCase {
        matrix: PositionMatrix {
            rows,
            index,
            num_test_steps,
        },
        assessment: assessment_values,
    })
}

fn normalize_control(
    address: &SignalAddress,
    step: usize,
    cell: &RawCell,
    mode: TestMode,
) -> Result<SignalValue> {
    let value = match mode {
        TestMode::DoublePoint => parse_position(cell).map(SignalValue::Position),
        TestMode::SinglePoint => parse_bool(cell).map(SignalValue::Boolean),
    };

    value.ok_or_else(|| FatError::MalformedInput {
        signal: address.to_string(),
        step,
        token: cell.to_string(),
    })
}

/// `CLOSED` → on, `OPEN` → off, case-insensitive
pub fn parse_position(cell: &RawCell) -> Option<Position> {
    match cell {
        RawCell::Text(token) => {
            let token = token.trim();
            if token.eq_ignore_ascii_case("closed") {
                Some(Position::On)
            } else if token.eq_ignore_ascii_case("open") {
                Some(Position::Off)
            } else {
                None
            }
        }
        RawCell::Bool(_) => None,
    }
}

/// Boolean cell or `true`/`false` token, case-insensitive
pub fn parse_bool(cell: &RawCell) -> Option<bool> {
    match cell {
        RawCell::Bool(v) => Some(*v),
        RawCell::Text(token) => {
            let token = token.trim();
            if token.eq_ignore_ascii_case("true") {
                Some(true)
            } else if token.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
    }
}
