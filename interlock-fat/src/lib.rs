//! Interlocking FAT Engine Library
//!
//! A stateless library that turns a substation interlocking test definition
//! (per-step switch positions plus an assessment row) into the ordered
//! test-step document consumed by the FAT runner.
//!
//! # Architecture
//!
//! Data flows strictly forward through the engine:
//! - Normalizer: raw tokens to canonical positions, synthetic baseline step
//! - Classifier: per-breaker CLOSING/OPENING/UNCHANGED transitions
//! - Sequencer: per-step assertion order
//! - Command assignment: first permitted and first blocked operation
//! - Assembler: one `TestStep` per step, ready for serialization
//!
//! The library does NOT:
//! - Read spreadsheets or test-definition files
//! - Parse plant configuration files
//! - Write anything to disk
//!
//! File handling, batch runs and reporting live in the application layer
//! (interlock-fat-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use interlock_fat::{Engine, EngineConfig, RawRow, SignalGroups, TestCaseInput};
//!
//! let groups = SignalGroups::new(
//!     vec![
//!         "AA1D1Q01A1/QB1XSWI1.Pos.stVal".into(),
//!         "AA1D1Q01A1/QA1XCBR1.Pos.stVal".into(),
//!     ],
//!     "AA1D1Q01A1CTRL/QB1CILO1.EnaCls.stVal".into(),
//!     Some("AA1D1Q01A1CTRL/QB1CSWI1.Pos.stVal".into()),
//! )
//! .unwrap();
//!
//! let input = TestCaseInput::new(
//!     "QB1 interlocking",
//!     groups,
//!     vec![
//!         RawRow::new("AA1D1Q01A1/QB1XSWI1.Pos.stVal", vec!["OPEN".into(), "CLOSED".into()]),
//!         RawRow::new("AA1D1Q01A1/QA1XCBR1.Pos.stVal", vec!["OPEN".into(), "CLOSED".into()]),
//!     ],
//!     vec![false.into(), true.into()],
//! )
//! .with_ieds(vec!["AA1D1Q01A1".into()]);
//!
//! let engine = Engine::new(EngineConfig::default());
//! let document = engine.generate(&[input]).unwrap();
//! println!("{}", document.to_json_pretty().unwrap());
//! ```

// Public modules
pub mod config;
pub mod document;
pub mod engine;
pub mod schema;
pub mod signals;
pub mod truth_table;
pub mod types;

// Re-export main types for convenience
pub use config::{EngineConfig, TimingConfig};
pub use document::{Expectation, FatDocument, SignalGroup, TestCase, TestStep};
pub use engine::{Engine, TestCaseInput};
pub use schema::{validate_document, SchemaError};
pub use signals::{
    dut_from_assess, resolve_parent, BreakerPattern, BreakerSet, SignalGroups,
    DEFAULT_BREAKER_PATTERNS,
};
pub use truth_table::{default_expression, TruthTable};
pub use types::{
    CommandCode, FatError, GroupType, Position, RawCell, Result, SignalAddress, SignalValue,
    TestMode,
};

// Engine stages; the types they hand between each other are re-exported
// below so the stages can be driven one at a time.
mod assemble;
mod classify;
mod command;
mod normalize;
mod sequence;

pub use assemble::assemble_steps;
pub use classify::{classify_step, StepTransitions, Transition};
pub use command::{assign_commands, CommandRow};
pub use normalize::{normalize, parse_bool, parse_position, NormalizedCase, PositionMatrix, RawRow};
pub use sequence::{SequencedStep, Sequencer, Slot, StepPolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
