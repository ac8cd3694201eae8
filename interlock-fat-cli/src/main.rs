//! Interlocking FAT CLI Application
//!
//! This is the command-line interface for the interlocking FAT generator.
//! It uses the interlock-fat library and adds:
//! - Test definition files (TOML/JSON)
//! - Parallel batch generation with a summary report
//! - Truth-table skeletons for logic tests
//! - Schema validation of existing documents

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use interlock_fat::{
    default_expression, validate_document, FatDocument, FatError, TestMode, TruthTable,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod config;
mod definition;
mod report;

use config::AppConfig;
use definition::TestDefinition;
use report::{BatchReport, Failure, FileOutcome, Generated};

/// Exit status when a generated document fails the schema self-check
const ENGINE_DEFECT_EXIT: u8 = 2;

/// Interlocking FAT - Generate factory acceptance test definitions
#[derive(Parser, Debug)]
#[command(name = "interlock-fat")]
#[command(about = "Generate interlocking FAT test documents from test definitions", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a FAT document from one test definition
    Generate {
        /// Test definition (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output document (default: <name>.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate one document per test definition in a directory
    Batch {
        /// Directory of test definitions
        #[arg(long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Output directory (default: [output] output_dir, else <input-dir>/output)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Print the truth table of a logic expression
    TruthTable {
        /// Number of inputs (1-10)
        #[arg(long, value_name = "N")]
        inputs: usize,

        /// Expression over Input1..InputN (default: Input1 or ... or InputN)
        #[arg(long, value_name = "EXPR")]
        expr: Option<String>,

        /// Token vocabulary of the exported steps
        #[arg(long, value_enum, default_value = "spc")]
        mode: ModeArg,

        /// Write a test definition skeleton (TOML)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check an existing FAT document against the schema
    Validate {
        #[arg(long, value_name = "FILE")]
        document: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Spc,
    Dpc,
}

impl From<ModeArg> for TestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Spc => TestMode::SinglePoint,
            ModeArg::Dpc => TestMode::DoublePoint,
        }
    }
}

fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Interlocking FAT CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using engine library v{}", interlock_fat::VERSION);

    let app = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    match args.command {
        Command::Generate { input, output } => {
            let generated = match generate_file(&app, &input, output.as_deref()) {
                Ok(generated) => generated,
                Err(e) if is_engine_defect(&e) => {
                    eprintln!("Engine defect (the input is not at fault): {:#}", e);
                    return Ok(ExitCode::from(ENGINE_DEFECT_EXIT));
                }
                Err(e) => return Err(e),
            };
            if !args.quiet {
                println!(
                    "✓ {} -> {} ({} steps)",
                    input.display(),
                    generated.output.display(),
                    generated.test_steps
                );
            }
        }
        Command::Batch {
            input_dir,
            output_dir,
        } => return batch_mode(&app, &input_dir, output_dir, args.quiet),
        Command::TruthTable {
            inputs,
            expr,
            mode,
            output,
        } => truth_table_mode(inputs, expr, mode.into(), output.as_deref())?,
        Command::Validate { document } => validate_mode(&document, args.quiet)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Load one definition, run the engine and write the document
///
/// The output path is `output` if given, else `<name>.json` in the configured
/// `[output] output_dir` or the working directory.
fn generate_file(app: &AppConfig, input: &Path, output: Option<&Path>) -> Result<Generated> {
    let definition = definition::load_definition(input)?;
    let document = generate_document(app, &definition)
        .with_context(|| format!("Failed to generate test case from {:?}", input))?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = app
                .output
                .output_dir
                .as_deref()
                .unwrap_or_else(|| Path::new("."));
            dir.join(output_file_name(&definition.name))
        }
    };
    write_document(app, &document, &output)?;

    let test_steps = document.test_cases.iter().map(|c| c.test_steps.len()).sum();
    Ok(Generated { output, test_steps })
}

fn generate_document(
    app: &AppConfig,
    definition: &TestDefinition,
) -> interlock_fat::Result<FatDocument> {
    let engine = app.engine(definition.mode)?;
    let input = definition.to_input()?;
    engine.generate(&[input])
}

fn write_document(app: &AppConfig, document: &FatDocument, path: &Path) -> Result<()> {
    let json = if app.output.pretty {
        document.to_json_pretty()
    } else {
        serde_json::to_string(document)
    }
    .context("Failed to serialize document")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write document: {:?}", path))?;
    log::debug!("Wrote {:?}", path);
    Ok(())
}

/// True if any cause in the chain is a schema failure of a generated document
fn is_engine_defect(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<FatError>()
            .is_some_and(FatError::is_engine_defect)
    })
}

fn failure(error: &anyhow::Error) -> Failure {
    let reason = format!("{:#}", error);
    if is_engine_defect(error) {
        Failure::EngineDefect(reason)
    } else {
        Failure::Input(reason)
    }
}

/// Batch documents are named after the definition file: `cases/b.toml` -> `b.json`
fn batch_output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "test_case".to_string());
    output_dir.join(format!("{}.json", stem))
}

/// For each input whose output path is shared, the first other input claiming it
fn duplicate_outputs(planned: &[(PathBuf, PathBuf)]) -> HashMap<PathBuf, PathBuf> {
    let mut claimed: HashMap<&Path, Vec<&Path>> = HashMap::new();
    for (input, output) in planned {
        claimed.entry(output.as_path()).or_default().push(input.as_path());
    }

    let mut duplicates = HashMap::new();
    for inputs in claimed.values().filter(|inputs| inputs.len() > 1) {
        for input in inputs {
            if let Some(other) = inputs.iter().find(|other| *other != input) {
                duplicates.insert(input.to_path_buf(), other.to_path_buf());
            }
        }
    }
    duplicates
}

fn output_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}.json", stem)
}

/// Batch mode - every definition in a directory, in parallel
fn batch_mode(
    app: &AppConfig,
    input_dir: &Path,
    output_dir: Option<PathBuf>,
    quiet: bool,
) -> Result<ExitCode> {
    let started = chrono::Local::now();

    let mut files: Vec<PathBuf> = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read input directory: {:?}", input_dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| definition::is_definition_file(path))
        .collect();
    files.sort();

    if files.is_empty() {
        bail!("No test definitions (*.toml, *.json) found in {:?}", input_dir);
    }

    let output_dir = output_dir
        .or_else(|| app.output.output_dir.clone())
        .unwrap_or_else(|| input_dir.join("output"));
    log::info!("Processing {} test definitions into {:?}", files.len(), output_dir);

    let planned: Vec<(PathBuf, PathBuf)> = files
        .into_iter()
        .map(|path| {
            let output = batch_output_path(&output_dir, &path);
            (path, output)
        })
        .collect();
    let duplicates = duplicate_outputs(&planned);

    let outcomes: Vec<FileOutcome> = planned
        .par_iter()
        .map(|(path, output)| {
            let result = match duplicates.get(path) {
                Some(other) => Err(Failure::DuplicateOutput {
                    output: output.clone(),
                    other: other.clone(),
                }),
                None => generate_file(app, path, Some(output.as_path())).map_err(|e| failure(&e)),
            };
            if let Err(reason) = &result {
                log::error!("{:?}: {}", path, reason);
            }
            FileOutcome {
                input: path.clone(),
                result,
            }
        })
        .collect();

    let report = BatchReport::new(started, outcomes);
    if !quiet {
        println!("{}", report);
    }

    if report.engine_defects() > 0 {
        eprintln!(
            "Engine defect: {} of {} generated documents failed the schema self-check",
            report.engine_defects(),
            report.failed() + report.succeeded()
        );
        return Ok(ExitCode::from(ENGINE_DEFECT_EXIT));
    }
    if report.failed() > 0 {
        bail!(
            "{} of {} test definitions failed",
            report.failed(),
            report.failed() + report.succeeded()
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Truth-table mode - print the table, optionally write a definition skeleton
fn truth_table_mode(
    inputs: usize,
    expr: Option<String>,
    mode: TestMode,
    output: Option<&Path>,
) -> Result<()> {
    let expression = expr.unwrap_or_else(|| default_expression(inputs));
    let table = TruthTable::generate(&expression, inputs)?;

    println!("Output1 = {}", table.expression());
    println!("{}", table);

    if let Some(path) = output {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("truth_table")
            .to_string();
        let skeleton = TestDefinition::from_truth_table(name, &table, mode);
        fs::write(path, skeleton.to_toml()?)
            .with_context(|| format!("Failed to write test definition: {:?}", path))?;
        println!("✓ Test definition skeleton written: {}", path.display());
    }

    Ok(())
}

/// Validate mode - schema check of an existing document
fn validate_mode(path: &Path, quiet: bool) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse document: {:?}", path))?;

    validate_document(&value)
        .with_context(|| format!("Document does not match the FAT schema: {:?}", path))?;

    if !quiet {
        let cases = value["testCases"].as_array().map_or(0, |c| c.len());
        println!("✓ {} is valid ({} test cases)", path.display(), cases);
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
