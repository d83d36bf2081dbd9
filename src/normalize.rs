//! Removal of volatile text from captured output
//!
//! Output that changes from run to run (timings, absolute paths, stack frames,
//! terminal colors) is rewritten before it is compared against the expected
//! file.

use regex::Regex;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Upper bound on rewrite passes, for rule sets that never settle
const MAX_PASSES: usize = 16;

const ANSI_ESCAPE: &str = r"\x1b\[[0-9;?]*[ -/]*[@-~]";
const STACK_FRAME: &str = r"(?m)^[ \t]+at [^\n]*\n?";
const DURATION: &str = r"\b\d+(?:\.\d+)?(?:ms|s)\b";

pub const DURATION_PLACEHOLDER: &str = "<duration>";
pub const FIXTURES_PLACEHOLDER: &str = "<fixtures>";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid strip pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Replaces every match of a pattern
#[derive(Clone, Debug)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
    /// Whether `$name` in the replacement refers to a capture group
    expand: bool,
}

impl Rule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Rule, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;

        Ok(Rule {
            pattern: regex,
            replacement: replacement.to_owned(),
            expand: false,
        })
    }

    fn apply(&self, text: &str) -> String {
        if self.expand {
            self.pattern
                .replace_all(text, self.replacement.as_str())
                .into_owned()
        } else {
            self.pattern
                .replace_all(text, regex::NoExpand(&self.replacement))
                .into_owned()
        }
    }
}

/// Rules every run starts with
///
/// Each replacement is chosen so that it can never be matched by its own
/// pattern.
pub fn default_rules() -> Result<Vec<Rule>, RuleError> {
    Ok(vec![
        Rule::new(ANSI_ESCAPE, "")?,
        Rule::new(STACK_FRAME, "")?,
        Rule::new(DURATION, DURATION_PLACEHOLDER)?,
    ])
}

/// Rewrites occurrences of `dir` so that output does not depend on where the
/// fixtures are checked out
///
/// Only whole path components match: `dir` followed by another character of
/// a file name (`/x/fixtures2`, `/x/fixtures.bak`) is left alone.
pub fn fixtures_dir_rule(dir: &Path) -> Result<Rule, RuleError> {
    let pattern = format!(
        r"{}(?P<end>[^\w.\-]|$)",
        regex::escape(&dir.to_string_lossy())
    );
    let rule = Rule::new(&pattern, &format!("{}${{end}}", FIXTURES_PLACEHOLDER))?;

    Ok(Rule {
        expand: true,
        ..rule
    })
}

#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    rules: Vec<Rule>,
}

impl Normalizer {
    pub fn new(rules: Vec<Rule>) -> Normalizer {
        Normalizer { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Apply the rules in order until the text stops changing
    ///
    /// Running to a fixed point makes `strip` idempotent: removing one match
    /// can join the text around it into a new match.
    pub fn strip(&self, text: &str) -> String {
        let mut current = text.to_owned();

        for _ in 0..MAX_PASSES {
            let next = self
                .rules
                .iter()
                .fold(current.clone(), |acc, rule| rule.apply(&acc));

            if next == current {
                return current;
            }
            current = next;
        }

        debug!("strip rules did not settle after {} passes", MAX_PASSES);
        current
    }
}
