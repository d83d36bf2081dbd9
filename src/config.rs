use crate::fixture::Conventions;
use crate::normalize::{self, Normalizer, Rule, RuleError};
use serde::Deserialize;
use std::env::{self, VarError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Looked up in the fixtures directory when no config file is given
pub const DEFAULT_CONFIG_FILE: &str = "fixtures.toml";

pub const DEFAULT_RUNTIME: &str = "node";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}'", .path.display())]
    FailedToReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file")]
    FailedToParseTomlConfig(#[from] toml::de::Error),
    #[error("missing environment variable '{var_name}'")]
    MissingEnvVar {
        var_name: String,
        #[source]
        source: VarError,
    },
    #[error("failed to parse '{0}'")]
    FailedToParseString(String),
    #[error(transparent)]
    InvalidStripRule(#[from] RuleError),
}

// TOML STRUCTURE

#[derive(Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    runtime: Option<ConfigValue<String>>,
    runtime_arguments: Option<Vec<ConfigValue<String>>>,
    extension: Option<ConfigValue<String>>,
    failing_marker: Option<ConfigValue<String>>,
    expected_suffix: Option<ConfigValue<String>>,
    failing_exit_code: Option<ConfigValue<i32>>,
    strip: Option<Vec<StripRule>>,
}

#[derive(Deserialize, Clone)]
#[serde(untagged)]
enum ConfigValue<T> {
    Literal(T),
    WrappedLiteral { value: T },
    FetchFromEnv { env: String },
}

impl<T> ConfigValue<T>
where
    T: FromStr,
{
    fn read(self) -> Result<T, ConfigError> {
        match self {
            Self::Literal(value) => Ok(value),
            Self::WrappedLiteral { value } => Ok(value),
            Self::FetchFromEnv { env } => {
                let str = env::var(&env).map_err(|source| ConfigError::MissingEnvVar {
                    var_name: env,
                    source,
                })?;
                str.parse()
                    .map_err(|_err| ConfigError::FailedToParseString(str))
            }
        }
    }
}

fn read_from_config_value<T>(config_value: Option<ConfigValue<T>>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
{
    config_value.map(ConfigValue::read).transpose()
}

/// Extra normalization applied after the built-in rules
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StripRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

// LAYERS

/// Settings from one source; unset fields fall through to the layer below
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub runtime: Option<String>,
    pub runtime_arguments: Option<Vec<String>>,
    pub extension: Option<String>,
    pub failing_marker: Option<String>,
    pub expected_suffix: Option<String>,
    pub failing_exit_code: Option<i32>,
    pub strip_rules: Vec<StripRule>,
}

pub fn parse_config(content: &str) -> Result<ConfigLayer, ConfigError> {
    let toml_config = toml::from_str::<TomlConfig>(content)?;

    let mut runtime_arguments = None;
    if let Some(arguments) = toml_config.runtime_arguments {
        let mut values = vec![];
        for argument in arguments {
            values.push(argument.read()?);
        }
        runtime_arguments = Some(values);
    }

    Ok(ConfigLayer {
        runtime: read_from_config_value(toml_config.runtime)?,
        runtime_arguments,
        extension: read_from_config_value(toml_config.extension)?,
        failing_marker: read_from_config_value(toml_config.failing_marker)?,
        expected_suffix: read_from_config_value(toml_config.expected_suffix)?,
        failing_exit_code: read_from_config_value(toml_config.failing_exit_code)?,
        strip_rules: toml_config.strip.unwrap_or_default(),
    })
}

pub fn read_config_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::FailedToReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "read config file");
    parse_config(&content)
}

/// Values in `prioritized` win; strip rules from both layers are kept, base first
pub fn merge_layers(base: ConfigLayer, prioritized: ConfigLayer) -> ConfigLayer {
    let mut strip_rules = base.strip_rules;
    strip_rules.extend(prioritized.strip_rules);

    ConfigLayer {
        runtime: prioritized.runtime.or(base.runtime),
        runtime_arguments: prioritized.runtime_arguments.or(base.runtime_arguments),
        extension: prioritized.extension.or(base.extension),
        failing_marker: prioritized.failing_marker.or(base.failing_marker),
        expected_suffix: prioritized.expected_suffix.or(base.expected_suffix),
        failing_exit_code: prioritized.failing_exit_code.or(base.failing_exit_code),
        strip_rules,
    }
}

// RESOLVED CONFIG

/// Everything a run needs, with defaults filled in
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub fixtures_dir: PathBuf,
    pub runtime: String,
    pub runtime_arguments: Vec<String>,
    pub conventions: Conventions,
    pub normalizer: Normalizer,
}

impl ConfigLayer {
    /// Fill in defaults and compile the normalizer for `fixtures_dir`
    ///
    /// The directory is made absolute when it exists, so that fixtures are
    /// invoked by absolute path and that path can be stripped from output.
    pub fn resolve(self, fixtures_dir: &Path) -> Result<RunnerConfig, ConfigError> {
        let fixtures_dir = fs::canonicalize(fixtures_dir).unwrap_or_else(|_| fixtures_dir.to_path_buf());

        let defaults = Conventions::default();
        let conventions = Conventions {
            extension: self.extension.unwrap_or(defaults.extension),
            failing_marker: self.failing_marker.unwrap_or(defaults.failing_marker),
            expected_suffix: self.expected_suffix.unwrap_or(defaults.expected_suffix),
            failing_exit_code: self.failing_exit_code.unwrap_or(defaults.failing_exit_code),
        };

        let mut rules = vec![normalize::fixtures_dir_rule(&fixtures_dir)?];
        rules.extend(normalize::default_rules()?);
        for strip_rule in &self.strip_rules {
            rules.push(Rule::new(&strip_rule.pattern, &strip_rule.replacement)?);
        }

        Ok(RunnerConfig {
            fixtures_dir,
            runtime: self.runtime.unwrap_or_else(|| String::from(DEFAULT_RUNTIME)),
            runtime_arguments: self.runtime_arguments.unwrap_or_default(),
            conventions,
            normalizer: Normalizer::new(rules),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let content = indoc! {r#"
            runtime = "deno"
            runtime_arguments = ["run", { value = "--quiet" }]
            extension = "ts"
            failing_marker = "_error"
            expected_suffix = ".out"
            failing_exit_code = 2

            [[strip]]
            pattern = 'pid \d+'
            replacement = "pid <pid>"

            [[strip]]
            pattern = "DEBUG.*\n"
        "#};

        let layer = parse_config(content).unwrap();

        assert_eq!(
            layer,
            ConfigLayer {
                runtime: Some(String::from("deno")),
                runtime_arguments: Some(vec![String::from("run"), String::from("--quiet")]),
                extension: Some(String::from("ts")),
                failing_marker: Some(String::from("_error")),
                expected_suffix: Some(String::from(".out")),
                failing_exit_code: Some(2),
                strip_rules: vec![
                    StripRule {
                        pattern: String::from(r"pid \d+"),
                        replacement: String::from("pid <pid>"),
                    },
                    StripRule {
                        pattern: String::from("DEBUG.*\n"),
                        replacement: String::new(),
                    },
                ],
            }
        );
    }

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(parse_config("").unwrap(), ConfigLayer::default());
    }

    #[test]
    fn test_parse_unknown_field() {
        let err = parse_config("runtim = \"node\"").unwrap_err();

        assert!(matches!(err, ConfigError::FailedToParseTomlConfig(_)));
    }

    #[test]
    fn test_value_from_env() {
        env::set_var("FIXTURE_RUNNER_TEST_EXIT_CODE", "3");

        let layer = parse_config("failing_exit_code = { env = \"FIXTURE_RUNNER_TEST_EXIT_CODE\" }").unwrap();

        assert_eq!(layer.failing_exit_code, Some(3));
    }

    #[test]
    fn test_value_from_env_not_a_number() {
        env::set_var("FIXTURE_RUNNER_TEST_BAD_EXIT_CODE", "one");

        let err = parse_config("failing_exit_code = { env = \"FIXTURE_RUNNER_TEST_BAD_EXIT_CODE\" }")
            .unwrap_err();

        assert!(matches!(err, ConfigError::FailedToParseString(value) if value == "one"));
    }

    #[test]
    fn test_missing_env_var() {
        let err = parse_config("runtime = { env = \"FIXTURE_RUNNER_TEST_UNSET_VARIABLE\" }").unwrap_err();

        assert!(matches!(err, ConfigError::MissingEnvVar { var_name, .. } if var_name == "FIXTURE_RUNNER_TEST_UNSET_VARIABLE"));
    }

    #[test]
    fn test_read_missing_config_file() {
        let dir = TempDir::new().unwrap();

        let err = read_config_file(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap_err();

        assert!(matches!(err, ConfigError::FailedToReadFile { .. }));
    }

    #[test]
    fn test_merge_prefers_prioritized_layer() {
        let base = ConfigLayer {
            runtime: Some(String::from("node")),
            extension: Some(String::from("mjs")),
            strip_rules: vec![StripRule {
                pattern: String::from("a"),
                replacement: String::new(),
            }],
            ..ConfigLayer::default()
        };
        let prioritized = ConfigLayer {
            runtime: Some(String::from("bun")),
            strip_rules: vec![StripRule {
                pattern: String::from("b"),
                replacement: String::new(),
            }],
            ..ConfigLayer::default()
        };

        let merged = merge_layers(base, prioritized);

        assert_eq!(merged.runtime.as_deref(), Some("bun"));
        assert_eq!(merged.extension.as_deref(), Some("mjs"));
        let patterns: Vec<&str> = merged.strip_rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_defaults() {
        let dir = TempDir::new().unwrap();

        let config = ConfigLayer::default().resolve(dir.path()).unwrap();

        assert_eq!(config.runtime, DEFAULT_RUNTIME);
        assert!(config.runtime_arguments.is_empty());
        assert_eq!(config.conventions, Conventions::default());
        assert!(config.fixtures_dir.is_absolute());
    }

    #[test]
    fn test_resolved_normalizer_strips_fixtures_dir() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLayer::default().resolve(dir.path()).unwrap();

        let output = format!("Error at {}/basic.js\n", config.fixtures_dir.display());

        assert_eq!(config.normalizer.strip(&output), "Error at <fixtures>/basic.js\n");
    }

    #[test]
    fn test_resolve_invalid_strip_rule() {
        let layer = ConfigLayer {
            strip_rules: vec![StripRule {
                pattern: String::from("(unclosed"),
                replacement: String::new(),
            }],
            ..ConfigLayer::default()
        };

        let err = layer.resolve(Path::new(".")).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidStripRule(_)));
    }
}
