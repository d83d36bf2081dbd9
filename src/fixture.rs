use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Naming conventions that tie a fixture to its expectations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conventions {
    /// Extension of executable fixtures, without the leading dot
    pub extension: String,
    /// Suffix of the fixture stem that marks an expected failure
    pub failing_marker: String,
    /// Replaces `.<extension>` to form the expected-output file name
    pub expected_suffix: String,
    pub failing_exit_code: i32,
}

impl Default for Conventions {
    fn default() -> Self {
        Conventions {
            extension: String::from("js"),
            failing_marker: String::from("_fail"),
            expected_suffix: String::from("_out.txt"),
            failing_exit_code: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixture {
    file_name: String,
    path: PathBuf,
    expected_output: PathBuf,
    expected_exit_code: i32,
}

impl Fixture {
    /// Returns `None` if `file_name` does not name a fixture under `conventions`
    pub fn from_file_name(dir: &Path, file_name: &str, conventions: &Conventions) -> Option<Fixture> {
        if file_name.ends_with(&conventions.expected_suffix) {
            return None;
        }

        let stem = file_name
            .strip_suffix(&conventions.extension)?
            .strip_suffix('.')?;
        if stem.is_empty() {
            return None;
        }

        let expected_exit_code = if stem.ends_with(&conventions.failing_marker) {
            conventions.failing_exit_code
        } else {
            0
        };

        Some(Fixture {
            file_name: file_name.to_owned(),
            path: dir.join(file_name),
            expected_output: dir.join(format!("{}{}", stem, conventions.expected_suffix)),
            expected_exit_code,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn expected_output_path(&self) -> &Path {
        &self.expected_output
    }

    pub fn expected_exit_code(&self) -> i32 {
        self.expected_exit_code
    }

    /// Name the fixture is reported under
    pub fn label(&self) -> String {
        format!("fixture case: {}", self.file_name)
    }
}

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("failed to read fixtures directory '{}'", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// List the fixtures in `dir`, sorted by file name
///
/// Only the directory itself is searched. Sub directories are skipped.
pub fn discover(dir: &Path, conventions: &Conventions) -> Result<Vec<Fixture>, DiscoverError> {
    let read_dir_error = |source| DiscoverError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut fixtures = vec![];

    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Ok(file_name) = entry.file_name().into_string() else {
            debug!(path = %path.display(), "skipping file name that is not UTF-8");
            continue;
        };

        if let Some(fixture) = Fixture::from_file_name(dir, &file_name, conventions) {
            fixtures.push(fixture);
        }
    }

    fixtures.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    debug!(dir = %dir.display(), count = fixtures.len(), "discovered fixtures");
    Ok(fixtures)
}

/// Keep the fixtures whose file name matches `pattern`
pub fn filter_fixtures(fixtures: Vec<Fixture>, pattern: &Pattern) -> Vec<Fixture> {
    fixtures
        .into_iter()
        .filter(|fixture| pattern.matches(fixture.file_name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(file_name: &str) -> Option<Fixture> {
        Fixture::from_file_name(Path::new("fixtures"), file_name, &Conventions::default())
    }

    fn touch(dir: &TempDir, file_name: &str) {
        fs::write(dir.path().join(file_name), "").unwrap();
    }

    #[test]
    fn test_passing_fixture_expects_exit_code_zero() {
        let basic = fixture("basic.js").unwrap();

        assert_eq!(basic.expected_exit_code(), 0);
        assert_eq!(basic.path(), Path::new("fixtures/basic.js"));
        assert_eq!(
            basic.expected_output_path(),
            Path::new("fixtures/basic_out.txt")
        );
        assert_eq!(basic.label(), "fixture case: basic.js");
    }

    #[test]
    fn test_failing_fixture_expects_exit_code_one() {
        let broken = fixture("broken_fail.js").unwrap();

        assert_eq!(broken.expected_exit_code(), 1);
        assert_eq!(
            broken.expected_output_path(),
            Path::new("fixtures/broken_fail_out.txt")
        );
    }

    #[test]
    fn test_failing_marker_must_end_the_stem() {
        assert_eq!(fixture("fail_early.js").unwrap().expected_exit_code(), 0);
        assert_eq!(fixture("_fail.js").unwrap().expected_exit_code(), 1);
    }

    #[test]
    fn test_other_files_are_not_fixtures() {
        assert!(fixture("basic_out.txt").is_none());
        assert!(fixture("basic.json").is_none());
        assert!(fixture("basicjs").is_none());
        assert!(fixture(".js").is_none());
        assert!(fixture("README.md").is_none());
    }

    #[test]
    fn test_custom_conventions() {
        let conventions = Conventions {
            extension: String::from("sh"),
            failing_marker: String::from("_err"),
            expected_suffix: String::from(".expected"),
            failing_exit_code: 2,
        };

        let fixture = Fixture::from_file_name(Path::new("."), "crash_err.sh", &conventions).unwrap();

        assert_eq!(fixture.expected_exit_code(), 2);
        assert_eq!(
            fixture.expected_output_path(),
            Path::new("./crash_err.expected")
        );
    }

    #[test]
    fn test_discover_is_sorted_and_skips_non_fixtures() {
        let dir = TempDir::new().unwrap();
        for file_name in ["c.js", "a_fail.js", "a_fail_out.txt", "b.js", "notes.md"] {
            touch(&dir, file_name);
        }
        fs::create_dir(dir.path().join("nested.js")).unwrap();

        let fixtures = discover(dir.path(), &Conventions::default()).unwrap();
        let names: Vec<&str> = fixtures.iter().map(Fixture::file_name).collect();

        assert_eq!(names, vec!["a_fail.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let err = discover(&missing, &Conventions::default()).unwrap_err();

        let DiscoverError::ReadDir { path, source } = err;
        assert_eq!(path, missing);
        assert_eq!(source.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_filter_fixtures() {
        let fixtures = vec![
            fixture("basic.js").unwrap(),
            fixture("broken_fail.js").unwrap(),
            fixture("nested.js").unwrap(),
        ];

        let filtered = filter_fixtures(fixtures, &Pattern::new("b*").unwrap());
        let names: Vec<&str> = filtered.iter().map(Fixture::file_name).collect();

        assert_eq!(names, vec!["basic.js", "broken_fail.js"]);
    }
}
