//! Batch summary report
//!
//! One line per processed test definition plus totals, stamped with the
//! local start and finish time of the run.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;

/// Result of processing one test definition file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<Generated, Failure>,
}

/// A successfully written document
#[derive(Debug, Clone)]
pub struct Generated {
    pub output: PathBuf,
    pub test_steps: usize,
}

/// Why a test definition produced no document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The definition was rejected: unreadable file or bad test data
    Input(String),
    /// The engine produced a document that fails the schema self-check
    EngineDefect(String),
    /// Another definition in the same batch maps to the same output file
    DuplicateOutput { output: PathBuf, other: PathBuf },
}

impl Failure {
    pub fn is_engine_defect(&self) -> bool {
        matches!(self, Failure::EngineDefect(_))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Input(reason) => f.write_str(reason),
            Failure::EngineDefect(reason) => write!(f, "[engine defect] {}", reason),
            Failure::DuplicateOutput { output, other } => write!(
                f,
                "output {} is also written by {}",
                output.display(),
                other.display()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    started: DateTime<Local>,
    finished: DateTime<Local>,
    outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(started: DateTime<Local>, mut outcomes: Vec<FileOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.input.cmp(&b.input));
        Self {
            started,
            finished: Local::now(),
            outcomes,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn engine_defects(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.as_ref().is_err_and(Failure::is_engine_defect))
            .count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════")?;
        writeln!(f, "  Interlocking FAT - Batch Summary")?;
        writeln!(f, "═══════════════════════════════════════════════")?;
        writeln!(f, "Started:  {}", self.started.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Finished: {}", self.finished.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "───────────────────────────────────────────────")?;

        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(generated) => writeln!(
                    f,
                    "✓ {} -> {} ({} steps)",
                    outcome.input.display(),
                    generated.output.display(),
                    generated.test_steps
                )?,
                Err(reason) => writeln!(f, "✗ {}: {}", outcome.input.display(), reason)?,
            }
        }

        writeln!(f, "───────────────────────────────────────────────")?;
        write!(
            f,
            "{} files: {} succeeded, {} failed",
            self.outcomes.len(),
            self.succeeded(),
            self.failed()
        )?;
        match self.engine_defects() {
            0 => Ok(()),
            n => write!(f, " ({} engine defects)", n),
        }
    }
}
