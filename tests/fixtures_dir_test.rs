#![cfg(unix)]

use fixture_runner::config::{self, ConfigLayer};
use fixture_runner::fixture::{self, Fixture};
use fixture_runner::formats::render::DiffStyle;
use fixture_runner::runner::{self, ReportConfig, ReportFormat};
use std::path::Path;

const FIXTURES_DIR: &str = "tests/fixtures";

fn load() -> (config::RunnerConfig, Vec<Fixture>) {
    let dir = Path::new(FIXTURES_DIR);
    let layer = config::read_config_file(&dir.join(config::DEFAULT_CONFIG_FILE)).unwrap();
    let runner_config = layer.resolve(dir).unwrap();
    let fixtures = fixture::discover(&runner_config.fixtures_dir, &runner_config.conventions).unwrap();

    (runner_config, fixtures)
}

fn quiet_report(number_of_tests: usize) -> ReportConfig {
    ReportConfig {
        number_of_tests,
        format: ReportFormat::Tap,
        show_diff: false,
        diff_style: DiffStyle::Plain,
    }
}

#[test]
fn test_discovers_checked_in_fixtures() {
    let (_, fixtures) = load();

    let names: Vec<&str> = fixtures.iter().map(Fixture::file_name).collect();
    assert_eq!(names, vec!["basic.sh", "broken_fail.sh", "timing.sh"]);

    let exit_codes: Vec<i32> = fixtures.iter().map(Fixture::expected_exit_code).collect();
    assert_eq!(exit_codes, vec![0, 1, 0]);
}

#[test]
fn test_checked_in_fixtures_pass() {
    let (runner_config, fixtures) = load();

    for fixture in &fixtures {
        let outcome = runner::run_fixture(&runner_config, fixture).unwrap();
        assert!(outcome.is_success(), "{} failed: {:?}", fixture.label(), outcome);
    }
}

#[test]
fn test_repeated_runs_give_the_same_verdicts() {
    let (runner_config, fixtures) = load();
    let report_config = quiet_report(fixtures.len());

    let verdicts = || -> Vec<bool> {
        runner::run_fixtures(&runner_config, &report_config, &fixtures, true)
            .iter()
            .map(|r| r.is_success())
            .collect()
    };

    let first = verdicts();
    assert_eq!(first, vec![true, true, true]);
    assert_eq!(verdicts(), first);
}

#[test]
fn test_wrong_convention_fails_exit_code_check() {
    let layer = ConfigLayer {
        failing_exit_code: Some(2),
        ..config::read_config_file(&Path::new(FIXTURES_DIR).join(config::DEFAULT_CONFIG_FILE)).unwrap()
    };
    let runner_config = layer.resolve(Path::new(FIXTURES_DIR)).unwrap();
    let fixture = Fixture::from_file_name(
        &runner_config.fixtures_dir,
        "broken_fail.sh",
        &runner_config.conventions,
    )
    .unwrap();

    let outcome = runner::run_fixture(&runner_config, &fixture).unwrap();

    assert!(outcome.output.is_success());
    assert!(!outcome.exit_code.is_success());
}
