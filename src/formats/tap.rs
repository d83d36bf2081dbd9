use crate::compare::{ComparisonOutcome, ValueComparison};
use crate::formats::render::{self, DiffStyle};
use crate::utils::string;
use serde::Serialize;

pub fn print_version() {
    println!("TAP version 14")
}

pub fn print_plan(start: usize, end: usize) {
    println!("{}..{}", start, end)
}

pub fn print_ok(test_number: usize, message: &str, indent_level: usize) {
    println!(
        "ok     {:>indent$} - {}",
        test_number,
        message,
        indent = indent_level
    )
}

pub fn print_not_ok(test_number: usize, message: &str, diagnostics: &str, indent_level: usize) {
    println!(
        "not ok {:>indent$} - {}",
        test_number,
        message,
        indent = indent_level
    );
    if !diagnostics.is_empty() {
        println!("{}", diagnostics_block(diagnostics));
    }
}

pub fn print_bail_out(message: &str) {
    println!("Bail out! {}", message)
}

/// YAML block in the TAP 14 layout, indented below its test point
pub fn diagnostics_block(diagnostics: &str) -> String {
    let body = if diagnostics.ends_with('\n') {
        diagnostics.to_owned()
    } else {
        format!("{}\n", diagnostics)
    };

    string::indent_lines(&format!("---\n{}...", body), 2)
}

#[derive(Serialize)]
struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<Expectation<Option<i32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<Expectation<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Expectation<T> {
    expected: T,
    got: T,
}

fn expectation<T: Clone>(comparison: &ValueComparison<T>) -> Option<Expectation<T>> {
    match comparison {
        ValueComparison::Matches(_) => None,
        ValueComparison::Diff { expected, got } => Some(Expectation {
            expected: expected.clone(),
            got: got.clone(),
        }),
    }
}

pub fn outcome_diagnostics(outcome: &ComparisonOutcome) -> Result<String, serde_yaml::Error> {
    let diff = if outcome.segments.is_empty() {
        None
    } else {
        Some(render::render_diff(&outcome.segments, DiffStyle::Plain))
    };

    serde_yaml::to_string(&Diagnostics {
        exit_code: expectation(&outcome.exit_code),
        output: expectation(&outcome.output),
        diff,
        error: None,
    })
}

pub fn error_diagnostics(message: &str) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&Diagnostics {
        exit_code: None,
        output: None,
        diff: None,
        error: Some(message.to_owned()),
    })
}
