use crate::compare::{self, ComparisonOutcome};
use crate::config::RunnerConfig;
use crate::fixture::Fixture;
use crate::formats::render::{self, DiffStyle};
use crate::formats::tree::{self, Node};
use crate::formats::tap;
use crate::process::{self, RunError};
use crate::utils::{error, file};
use rayon::prelude::*;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::iter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub struct ReportConfig {
    pub number_of_tests: usize,
    pub format: ReportFormat,
    /// Write a diff to stderr for every output mismatch
    pub show_diff: bool,
    pub diff_style: DiffStyle,
}

pub enum ReportFormat {
    Summary { show_all_tests: bool },
    Tap,
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read expected output '{}'", .path.display())]
    ExpectedOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Run(#[from] RunError),
}

impl FixtureError {
    pub fn is_launch_error(&self) -> bool {
        match self {
            Self::Run(err) => err.is_launch_error(),
            Self::ExpectedOutput { .. } => false,
        }
    }
}

pub struct RunResult {
    pub fixture: Fixture,
    pub result: Result<ComparisonOutcome, FixtureError>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        match &self.result {
            Ok(outcome) => outcome.is_success(),
            Err(_) => false,
        }
    }
}

// RUN FIXTURES

/// Execute a single fixture and compare it against its expectations
///
/// The expected output is read first: a fixture without one is never
/// executed.
pub fn run_fixture(config: &RunnerConfig, fixture: &Fixture) -> Result<ComparisonOutcome, FixtureError> {
    let expected_path = fixture.expected_output_path();
    let expected = fs::read_to_string(expected_path).map_err(|source| FixtureError::ExpectedOutput {
        path: expected_path.to_path_buf(),
        source,
    })?;

    let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let program = file::find_executable_path(&config.runtime, current_dir)
        .map_err(|_| RunError::ProgramNotFound(config.runtime.clone()))?;

    let arguments: Vec<OsString> = config
        .runtime_arguments
        .iter()
        .map(OsString::from)
        .chain(iter::once(fixture.path().as_os_str().to_owned()))
        .collect();

    debug!(fixture = fixture.file_name(), program = %program.display(), "running fixture");
    let execution = process::run(&program, &arguments)?;

    let stripped = config.normalizer.strip(&execution.combined);

    Ok(compare::compare(
        &stripped,
        &expected,
        execution.exit_code,
        fixture.expected_exit_code(),
    ))
}

pub fn run_fixtures(
    config: &RunnerConfig,
    report_config: &ReportConfig,
    fixtures: &[Fixture],
    run_in_parallel: bool,
) -> Vec<RunResult> {
    let run = |(i, fixture): (usize, &Fixture)| -> RunResult {
        let result = run_fixture(config, fixture);

        if let Err(err) = &result {
            warn!(fixture = fixture.file_name(), error = %err, "fixture could not be checked");
        }

        report_fixture(report_config, i, fixture, &result);

        RunResult {
            fixture: fixture.clone(),
            result,
        }
    };

    info!(
        count = fixtures.len(),
        parallel = run_in_parallel,
        strip_rules = config.normalizer.rules().len(),
        "running fixtures"
    );
    report_start(report_config, &config.fixtures_dir);

    let run_results: Vec<RunResult> = if run_in_parallel {
        fixtures.par_iter().enumerate().map(run).collect()
    } else {
        fixtures.iter().enumerate().map(run).collect()
    };

    report_summary(report_config, &run_results);

    run_results
}

// REPORTING

fn report_start(report_config: &ReportConfig, fixtures_dir: &Path) {
    match report_config.format {
        ReportFormat::Summary { .. } => {
            summary_print_start(report_config.number_of_tests, fixtures_dir);
        }
        ReportFormat::Tap => {
            tap_print_start(report_config.number_of_tests);
        }
    }
}

fn report_fixture(
    report_config: &ReportConfig,
    index: usize,
    fixture: &Fixture,
    result: &Result<ComparisonOutcome, FixtureError>,
) {
    if report_config.show_diff {
        if let Ok(outcome) = result {
            print_diff(fixture, outcome, report_config.diff_style);
        }
    }

    match report_config.format {
        ReportFormat::Summary { .. } => {
            summary_print_fixture(result);
        }
        ReportFormat::Tap => {
            let test_number_indent_level = report_config.number_of_tests.to_string().len();
            tap_print_fixture(index + 1, fixture, result, test_number_indent_level);
        }
    }
}

fn report_summary(report_config: &ReportConfig, run_results: &[RunResult]) {
    match report_config.format {
        ReportFormat::Summary { show_all_tests } => {
            summary_print_summary(show_all_tests, run_results);
        }
        ReportFormat::Tap => {}
    }
}

fn print_diff(fixture: &Fixture, outcome: &ComparisonOutcome, style: DiffStyle) {
    if outcome.segments.is_empty() {
        return;
    }

    // One write, so that parallel fixtures do not interleave their diffs
    eprint!(
        "\n\n--------------diff: {}--------------\n\n{}",
        fixture.file_name(),
        render::render_diff(&outcome.segments, style)
    );
}

/// Error message followed by its chain of causes
fn error_chain(err: &FixtureError) -> (String, Vec<String>) {
    let mut messages = error::chain_messages(err).into_iter();
    (messages.next().unwrap_or_default(), messages.collect())
}

// SUMMARY HELPERS

fn summary_print_start(number_of_tests: usize, fixtures_dir: &Path) {
    let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    println!(
        "Running {} fixtures in {}:",
        number_of_tests,
        file::display_relative(fixtures_dir, current_dir)
    )
}

fn summary_print_fixture(result: &Result<ComparisonOutcome, FixtureError>) {
    match result {
        Ok(outcome) if outcome.is_success() => print!("."),
        _ => print!("F"),
    }
}

fn summary_print_summary(show_all_tests: bool, run_results: &[RunResult]) {
    println!(); // Add newline to dots

    let mut is_any_fixture_printed = false;

    for run_result in run_results {
        let fixture_failed = !run_result.is_success();
        if show_all_tests || fixture_failed {
            if !is_any_fixture_printed {
                println!();
                is_any_fixture_printed = true;
            }

            summary_print_result(run_result);
        }
    }

    let number_of_passed_tests = run_results.iter().filter(|r| r.is_success()).count();
    let number_of_failed_tests = run_results.len() - number_of_passed_tests;

    let status = if number_of_failed_tests == 0 {
        "OK"
    } else {
        "FAIL"
    };

    println!();
    println!(
        "Test result: {} ({} passed, {} failed)",
        status, number_of_passed_tests, number_of_failed_tests,
    );
}

fn summary_print_result(run_result: &RunResult) {
    let label = run_result.fixture.label();

    if run_result.is_success() {
        println!("✅ {}", label);
        return;
    }

    let header = format!("❌ {}", label);
    let children = match &run_result.result {
        Ok(outcome) => tree::tree_from_outcome(outcome),
        Err(err) => {
            let (message, causes) = error_chain(err);
            if causes.is_empty() {
                tree::tree_from_error("Failed to run fixture", vec![message])
            } else {
                tree::tree_from_error(&message, causes)
            }
        }
    };

    print!("{}", tree::draw_tree(&Node(header, children)));
}

// TAP HELPERS

fn tap_print_start(number_of_tests: usize) {
    tap::print_version();
    tap::print_plan(1, number_of_tests);
}

fn tap_print_fixture(
    test_number: usize,
    fixture: &Fixture,
    result: &Result<ComparisonOutcome, FixtureError>,
    indent_level: usize,
) {
    let label = fixture.label();

    let diagnostics = match result {
        Ok(outcome) if outcome.is_success() => {
            tap::print_ok(test_number, &label, indent_level);
            return;
        }
        Ok(outcome) => tap::outcome_diagnostics(outcome),
        Err(err) => {
            let (message, causes) = error_chain(err);
            let full_message = iter::once(message).chain(causes).collect::<Vec<_>>().join(": ");
            tap::error_diagnostics(&full_message)
        }
    };

    let diagnostics = diagnostics.unwrap_or_else(|err| {
        warn!(error = %err, "failed to serialize diagnostics");
        String::new()
    });
    tap::print_not_ok(test_number, &label, &diagnostics, indent_level)
}
