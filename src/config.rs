use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MutorError;

pub const DEFAULT_CONFIG_FILE: &str = "mutor.conf.json";

/// One external command: executable plus fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub executable: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// Project-level tool configuration, loaded from `mutor.conf.json` in the
/// project directory. Everything the core delegates to external commands is
/// declared here; the core itself never hardcodes a build system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutorConfig {
    /// Command that runs the test suite inside the staged working copy.
    pub test_command: CommandSpec,
    /// Command that builds the project for testing. Optional for toolchains
    /// where the test command builds implicitly.
    #[serde(default)]
    pub build_command: Option<CommandSpec>,
    /// Command whose stdout ends with a coverage percentage.
    #[serde(default)]
    pub coverage_command: Option<CommandSpec>,
    /// Source transformer command speaking JSON on stdin/stdout.
    #[serde(default)]
    pub transformer_command: Option<CommandSpec>,
    /// Buildable test targets; the manifest is derived from these.
    #[serde(default)]
    pub test_targets: Vec<String>,
    /// Per-target argument template for restricting the test run, with
    /// `{target}` substituted (for example `--test {target}` or
    /// `-only-testing:{target}`). Absent, target names are passed as
    /// trailing arguments.
    #[serde(default)]
    pub test_target_argument: Option<String>,
    /// File extensions considered mutable source.
    #[serde(default = "default_source_extensions")]
    pub source_file_extensions: Vec<String>,
    /// Stderr substrings that classify a failed test run as a build error
    /// rather than a killed mutant.
    #[serde(default = "default_build_failure_patterns")]
    pub build_failure_patterns: Vec<String>,
}

fn default_source_extensions() -> Vec<String> {
    vec!["rs".into()]
}

fn default_build_failure_patterns() -> Vec<String> {
    vec![
        "error[E".into(),
        "could not compile".into(),
        "SyntaxError".into(),
        "linker command failed".into(),
    ]
}

impl MutorConfig {
    /// Load configuration from an explicit path, or from the default file
    /// name under `project_dir` when no path is given.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self, MutorError> {
        let path: PathBuf = match explicit {
            Some(p) => p.to_path_buf(),
            None => project_dir.join(DEFAULT_CONFIG_FILE),
        };
        let data = std::fs::read_to_string(&path).map_err(|e| MutorError::ConfigUnreadable {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&data).map_err(|e| MutorError::ConfigUnreadable {
            path,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let json = r#"{ "test_command": { "executable": "cargo", "arguments": ["test"] } }"#;
        let config: MutorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.test_command.executable, "cargo");
        assert!(config.build_command.is_none());
        assert_eq!(config.source_file_extensions, vec!["rs".to_string()]);
        assert!(!config.build_failure_patterns.is_empty());
    }

    #[test]
    fn load_missing_file_is_config_unreadable() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = MutorConfig::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, MutorError::ConfigUnreadable { .. }));
    }

    #[test]
    fn load_malformed_file_is_config_unreadable() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();
        let err = MutorConfig::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, MutorError::ConfigUnreadable { .. }));
    }
}
