// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};

use anyhow::{Context, Result};
use hartlab_config::MachineConfig;
use hartlab_core::{Machine, RunOutcome, RunSummary, SimulationError};

const EXIT_PASS: u8 = 0;
const EXIT_TEST_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

// riscv-tests installs an objdump listing next to each binary.
const DUMP_SUFFIX: &str = ".dump";
const DEFAULT_SUITE_PREFIX: &str = "rv32ui-p-";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "HartLab RV32I Conformance Simulator",
    long_about = None,
    subcommand_negates_reqs = true
)]
struct Cli {
    /// Path to the test ELF binary
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Path to the machine manifest (YAML)
    #[arg(short, long, global = true)]
    machine: Option<PathBuf>,

    /// Override max steps (takes precedence over the manifest)
    #[arg(long, global = true)]
    max_steps: Option<u64>,

    /// Enable instruction-level execution tracing
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every conformance binary in a directory and write a summary artifact.
    Suite(SuiteArgs),
}

#[derive(Parser, Debug)]
struct SuiteArgs {
    /// Directory containing the test binaries
    #[arg(short, long)]
    dir: PathBuf,

    /// Only run files whose names start with this prefix
    #[arg(long, default_value = DEFAULT_SUITE_PREFIX)]
    prefix: String,

    /// Write results.json into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

/// Why a run stopped, as recorded in results.json.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StopCause {
    Pass,
    Fail,
    MaxSteps,
    MemoryOutOfBounds,
    IllegalInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct CaseResult {
    name: String,
    status: String,
    stop_reason: StopCause,
    steps: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    sha256: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SuiteResult {
    result_schema_version: String,
    status: String,
    total: usize,
    passed: usize,
    failed: usize,
    errored: usize,
    tests: Vec<CaseResult>,
}

/// Terminal state of one run before it is flattened into a record.
struct CaseOutcome {
    cause: StopCause,
    steps: u64,
    failure_code: Option<u32>,
    message: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Some(Commands::Suite(args)) => run_suite(args, cli.machine.as_deref(), cli.max_steps),
        None => run_single(cli),
    }
}

fn run_single(cli: Cli) -> ExitCode {
    info!("Starting HartLab Simulator");

    let Some(image_path) = &cli.image else {
        error!("Missing required --image argument");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    };

    let config = match load_machine_config(cli.machine.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let max_steps = cli.max_steps.unwrap_or(config.limits.max_steps);

    info!("Loading test binary: {:?}", image_path);
    let image_bytes = match std::fs::read(image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read test binary {:?}: {}", image_path, e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let started = Instant::now();
    let outcome = match run_case(&config, &image_bytes, max_steps) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    report_outcome(&outcome, started.elapsed());

    ExitCode::from(case_exit(outcome.cause))
}

fn run_suite(
    args: SuiteArgs,
    machine_path: Option<&Path>,
    max_steps_override: Option<u64>,
) -> ExitCode {
    info!("Starting HartLab suite run");

    let config = match load_machine_config(machine_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let max_steps = max_steps_override.unwrap_or(config.limits.max_steps);

    let binaries = match discover_suite(&args.dir, &args.prefix) {
        Ok(binaries) => binaries,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if binaries.is_empty() {
        error!(
            "No test binaries matching '{}*' in {:?}",
            args.prefix, args.dir
        );
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }
    info!("Discovered {} test binaries in {:?}", binaries.len(), args.dir);

    let started = Instant::now();
    let mut tests = Vec::with_capacity(binaries.len());
    let (mut passed, mut failed, mut errored) = (0usize, 0usize, 0usize);

    for path in &binaries {
        let name = case_name(path);
        let image_bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read test binary {:?}: {}", path, e);
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        };
        let outcome = match run_case(&config, &image_bytes, max_steps) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{}: {:#}", name, e);
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        };

        let status = status_label(outcome.cause);
        match status {
            "pass" => passed += 1,
            "fail" => failed += 1,
            _ => errored += 1,
        }
        info!("{:<28} {} ({} steps)", name, status, outcome.steps);

        tests.push(CaseResult {
            name,
            status: status.to_string(),
            stop_reason: outcome.cause,
            steps: outcome.steps,
            failure_code: outcome.failure_code,
            message: outcome.message,
            sha256: sha256_hex(&image_bytes),
        });
    }

    let status = if errored > 0 {
        "error"
    } else if failed > 0 {
        "fail"
    } else {
        "pass"
    };
    info!(
        "Suite finished in {:.3}s: {} passed, {} failed, {} errored",
        started.elapsed().as_secs_f64(),
        passed,
        failed,
        errored
    );

    let results = SuiteResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        total: tests.len(),
        passed,
        failed,
        errored,
        tests,
    };
    if let Some(output_dir) = &args.output_dir {
        write_results(output_dir, &results);
    }

    match status {
        "pass" => ExitCode::from(EXIT_PASS),
        "fail" => ExitCode::from(EXIT_TEST_FAIL),
        _ => ExitCode::from(EXIT_RUNTIME_ERROR),
    }
}

/// Load, place and run one test binary against a fresh machine.
///
/// Simulator aborts come back as a [`CaseOutcome`] so the caller can record
/// them; an `Err` means the case never started (bad image or configuration).
fn run_case(config: &MachineConfig, image_bytes: &[u8], max_steps: u64) -> Result<CaseOutcome> {
    let image = hartlab_loader::load_elf_bytes(image_bytes)?;
    let mut machine = Machine::from_config(config)?;
    machine
        .load_image(&image)
        .context("Test image does not fit the configured memory window")?;

    match machine.run(max_steps) {
        Ok(summary) => Ok(summarize(summary, max_steps)),
        Err(e) => {
            let cause = match e {
                SimulationError::OutOfBounds { .. } => StopCause::MemoryOutOfBounds,
                SimulationError::IllegalInstruction { .. } => StopCause::IllegalInstruction,
            };
            Ok(CaseOutcome {
                cause,
                steps: machine.steps(),
                failure_code: None,
                message: Some(e.to_string()),
            })
        }
    }
}

fn summarize(summary: RunSummary, max_steps: u64) -> CaseOutcome {
    match summary.outcome {
        RunOutcome::Pass => CaseOutcome {
            cause: StopCause::Pass,
            steps: summary.steps,
            failure_code: None,
            message: None,
        },
        RunOutcome::Fail { code } => CaseOutcome {
            cause: StopCause::Fail,
            steps: summary.steps,
            failure_code: Some(code),
            message: None,
        },
        RunOutcome::MaxSteps => CaseOutcome {
            cause: StopCause::MaxSteps,
            steps: summary.steps,
            failure_code: None,
            message: Some(format!("Step budget of {} exhausted", max_steps)),
        },
    }
}

fn load_machine_config(path: Option<&Path>) -> Result<MachineConfig> {
    match path {
        Some(path) => {
            let config = MachineConfig::from_file(path)?;
            info!("Loaded machine manifest '{}' from {:?}", config.name, path);
            Ok(config)
        }
        None => {
            let config = MachineConfig::default();
            info!("No machine manifest given, using default '{}'", config.name);
            Ok(config)
        }
    }
}

/// Collect the test binaries to run, sorted by name for stable ordering.
fn discover_suite(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read suite directory {:?}", dir))?;

    let mut binaries = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read suite directory {:?}", dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.starts_with(prefix) || name.ends_with(DUMP_SUFFIX) {
            continue;
        }
        binaries.push(path);
    }
    binaries.sort();
    Ok(binaries)
}

fn case_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("<non-utf8>")
        .to_string()
}

fn status_label(cause: StopCause) -> &'static str {
    match cause {
        StopCause::Pass => "pass",
        StopCause::Fail | StopCause::MaxSteps => "fail",
        StopCause::MemoryOutOfBounds | StopCause::IllegalInstruction => "error",
    }
}

fn case_exit(cause: StopCause) -> u8 {
    match cause {
        StopCause::Pass => EXIT_PASS,
        StopCause::Fail | StopCause::MaxSteps => EXIT_TEST_FAIL,
        StopCause::MemoryOutOfBounds | StopCause::IllegalInstruction => EXIT_RUNTIME_ERROR,
    }
}

fn report_outcome(outcome: &CaseOutcome, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = outcome.steps as f64 / secs.max(1e-9);
    info!(
        "Retired {} instructions in {:.3}s ({:.0} steps/s)",
        outcome.steps, secs, rate
    );
    match outcome.cause {
        StopCause::Pass => info!("Result: PASS"),
        StopCause::Fail => error!(
            "Result: FAIL (status code {})",
            outcome.failure_code.unwrap_or(0)
        ),
        StopCause::MaxSteps => error!("Result: FAIL (step budget exhausted)"),
        StopCause::MemoryOutOfBounds | StopCause::IllegalInstruction => error!(
            "Result: ERROR ({})",
            outcome.message.as_deref().unwrap_or("simulator aborted")
        ),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_results(output_dir: &Path, results: &SuiteResult) {
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        error!("Failed to create output directory {:?}: {}", output_dir, e);
        return;
    }
    let path = output_dir.join("results.json");
    match std::fs::File::create(&path) {
        Ok(file) => {
            if let Err(e) = serde_json::to_writer_pretty(file, results) {
                error!("Failed to write results to {:?}: {}", path, e);
            } else {
                info!("Results written to {:?}", path);
            }
        }
        Err(e) => {
            error!("Failed to create {:?}: {}", path, e);
        }
    }
}
