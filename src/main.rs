mod cli;

use cli::error::{self, CliError};
use cli::{Args, OutputFormat};
use fixture_runner::config::{self, ConfigLayer};
use fixture_runner::fixture;
use fixture_runner::formats::render::DiffStyle;
use fixture_runner::formats::tap;
use fixture_runner::runner::{self, ReportConfig, ReportFormat};
use std::env;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = cli::parse();

    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            if let OutputFormat::Tap = args.output_format {
                tap::print_bail_out(&err.to_string());
            }
            error::print_error(&err);
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr so that stdout only carries the report
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .try_init();
}

/// Returns whether every fixture passed
fn run(args: &Args) -> Result<bool, CliError> {
    let file_layer = load_config_file(args)?;
    let runner_config = config::merge_layers(file_layer, args.config_layer())
        .resolve(&args.fixtures_dir)?;

    let mut fixtures = fixture::discover(&runner_config.fixtures_dir, &runner_config.conventions)?;
    if let Some(pattern) = &args.filter {
        fixtures = fixture::filter_fixtures(fixtures, pattern);
    }

    if fixtures.is_empty() {
        warn!(dir = %runner_config.fixtures_dir.display(), "no fixtures found");
    }

    let report_config = ReportConfig {
        number_of_tests: fixtures.len(),
        format: match args.output_format {
            OutputFormat::Summary => ReportFormat::Summary {
                show_all_tests: args.show_all_tests,
            },
            OutputFormat::Tap => ReportFormat::Tap,
        },
        show_diff: !args.no_diff,
        diff_style: diff_style(),
    };

    let run_results = runner::run_fixtures(&runner_config, &report_config, &fixtures, args.parallel);

    let all_passed = run_results.iter().all(|r| r.is_success());
    info!(all_passed, "finished");
    Ok(all_passed)
}

/// The diff goes to stderr, which keeps its escapes when redirected, unless
/// `NO_COLOR` asks for plain markers
fn diff_style() -> DiffStyle {
    let style = if env::var_os("NO_COLOR").is_some() {
        DiffStyle::Plain
    } else {
        DiffStyle::Colored
    };
    colored::control::set_override(style == DiffStyle::Colored);
    style
}

fn load_config_file(args: &Args) -> Result<ConfigLayer, CliError> {
    if let Some(path) = &args.config {
        return Ok(config::read_config_file(path)?);
    }

    let default_path = args.fixtures_dir.join(config::DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        Ok(config::read_config_file(&default_path)?)
    } else {
        Ok(ConfigLayer::default())
    }
}
