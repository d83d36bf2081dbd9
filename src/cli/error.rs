use fixture_runner::config::ConfigError;
use fixture_runner::fixture::DiscoverError;
use fixture_runner::formats::tree::{self, Leaf, Node};
use fixture_runner::utils::error::chain_messages;
use thiserror::Error;

/// Problems that stop the run before any fixture is executed
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
}

/// One line per error in the source chain
pub fn error_lines(err: &CliError) -> Vec<String> {
    let mut lines = chain_messages(err);
    lines.dedup();
    lines
}

pub fn print_error(err: &CliError) {
    let mut lines = error_lines(err).into_iter();
    let heading = format!("❌ {}", lines.next().unwrap_or_default());
    let causes: Vec<_> = lines.map(|line| Leaf(vec![line])).collect();

    eprint!("{}", tree::draw_tree(&Node(heading, causes)));
}
