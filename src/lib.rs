//! Golden test runner for fixture directories
//!
//! Every fixture is executed by a runtime, its combined output is normalized
//! and then compared against the expected-output file next to it.

pub mod compare;
pub mod config;
pub mod fixture;
pub mod formats;
pub mod normalize;
pub mod process;
pub mod runner;
pub mod text_diff;
pub mod utils;
