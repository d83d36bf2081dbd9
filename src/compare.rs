use crate::text_diff::{self, Segment};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueComparison<T> {
    Matches(T),
    Diff { expected: T, got: T },
}

impl<T: PartialEq> ValueComparison<T> {
    pub fn new(expected: T, got: T) -> ValueComparison<T> {
        if expected == got {
            Self::Matches(got)
        } else {
            Self::Diff { expected, got }
        }
    }
}

impl<T> ValueComparison<T> {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Matches(_) => true,
            Self::Diff { .. } => false,
        }
    }
}

/// Verdict for a single fixture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonOutcome {
    pub exit_code: ValueComparison<Option<i32>>,
    pub output: ValueComparison<String>,
    /// Empty unless the output differs
    pub segments: Vec<Segment>,
}

impl ComparisonOutcome {
    pub fn is_success(&self) -> bool {
        self.exit_code.is_success() && self.output.is_success()
    }
}

/// Compare normalized output and exit code against their expectations
///
/// The expected text is used as-is, trailing newlines included.
pub fn compare(
    actual: &str,
    expected: &str,
    actual_exit_code: Option<i32>,
    expected_exit_code: i32,
) -> ComparisonOutcome {
    let exit_code = ValueComparison::new(Some(expected_exit_code), actual_exit_code);
    let output = ValueComparison::new(expected.to_owned(), actual.to_owned());

    let segments = if output.is_success() {
        vec![]
    } else {
        text_diff::diff_chars(actual, expected)
    };

    ComparisonOutcome {
        exit_code,
        output,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_diff::Change;

    #[test]
    fn test_passing_fixture() {
        let outcome = compare("hello\n", "hello\n", Some(0), 0);

        assert!(outcome.is_success());
        assert_eq!(outcome.output, ValueComparison::Matches(String::from("hello\n")));
        assert!(outcome.segments.is_empty());
    }

    #[test]
    fn test_failing_fixture_that_fails_as_expected() {
        let outcome = compare("error: bad\n", "error: bad\n", Some(1), 1);

        assert!(outcome.is_success());
    }

    #[test]
    fn test_exit_code_mismatch_fails_despite_matching_text() {
        let outcome = compare("error: bad\n", "error: bad\n", Some(0), 1);

        assert!(!outcome.is_success());
        assert!(outcome.output.is_success());
        assert_eq!(
            outcome.exit_code,
            ValueComparison::Diff {
                expected: Some(1),
                got: Some(0)
            }
        );
    }

    #[test]
    fn test_missing_exit_code_never_matches() {
        let outcome = compare("", "", None, 0);

        assert!(!outcome.exit_code.is_success());
    }

    #[test]
    fn test_text_mismatch_has_segments() {
        let outcome = compare("hello\n", "hello!\n", Some(0), 0);

        assert!(!outcome.is_success());
        assert!(outcome.exit_code.is_success());
        assert!(outcome
            .segments
            .iter()
            .any(|segment| segment.change == Change::Added && segment.value == "!"));
    }

    #[test]
    fn test_trailing_newline_matters() {
        let outcome = compare("hello", "hello\n", Some(0), 0);

        assert!(!outcome.output.is_success());
    }

    #[test]
    fn test_same_input_same_verdict() {
        let first = compare("a\nb\n", "a\nc\n", Some(0), 0);
        let second = compare("a\nb\n", "a\nc\n", Some(0), 0);

        assert_eq!(first, second);
    }
}
