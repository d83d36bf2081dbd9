pub mod error;

use clap::Parser;
use fixture_runner::config::ConfigLayer;
use std::path::PathBuf;
use std::str::FromStr;

pub fn parse() -> Args {
    Args::parse()
}

/// Golden test runner for fixture directories
///
/// Runs `<runtime> <fixture>` for every fixture and compares the combined
/// output with `<name>_out.txt`. Fixtures named `<name>_fail.<ext>` must exit
/// with code 1, all others with code 0.
#[derive(Parser)]
#[clap(bin_name = "fixture-runner")]
pub struct Args {
    /// Directory containing fixtures and their expected output
    pub fixtures_dir: PathBuf,

    /// Program that executes each fixture [default: node]
    #[arg(long)]
    pub runtime: Option<String>,

    /// Argument passed to the runtime before the fixture path (repeatable)
    #[arg(long = "runtime-arg", allow_hyphen_values = true)]
    pub runtime_arguments: Vec<String>,

    /// File extension of fixtures [default: js]
    #[arg(long)]
    pub extension: Option<String>,

    /// Only run fixtures whose file name matches this glob
    #[arg(long)]
    pub filter: Option<glob::Pattern>,

    /// Path to config file [default: <FIXTURES_DIR>/fixtures.toml, if present]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Options: summary, tap
    #[arg(long, default_value = "summary")]
    pub output_format: OutputFormat,

    /// Show all fixtures in summary, regardless of status
    #[arg(long)]
    pub show_all_tests: bool,

    /// Run fixtures in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Do not print a colored diff for mismatching output
    #[arg(long)]
    pub no_diff: bool,

    /// Print debug logs
    #[arg(long)]
    pub verbose: bool,
}

impl Args {
    /// Settings given on the command line, which take priority over the config file
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            runtime: self.runtime.clone(),
            runtime_arguments: if self.runtime_arguments.is_empty() {
                None
            } else {
                Some(self.runtime_arguments.clone())
            },
            extension: self.extension.clone(),
            ..ConfigLayer::default()
        }
    }
}

#[derive(Clone)]
pub enum OutputFormat {
    Summary,
    Tap,
}

impl FromStr for OutputFormat {
    type Err = &'static str;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format {
            "summary" => Ok(Self::Summary),
            "tap" => Ok(Self::Tap),
            _ => Err("Invalid output format"),
        }
    }
}
