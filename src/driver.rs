use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::config::{CommandSpec, MutorConfig};
use crate::error::MutorError;
use crate::schemata::{ACTIVATION_ENV, Activation, MutationSchema};
use crate::state::TestVerdict;

const LOG_DIR: &str = "mutor_logs";

/// Structured description of the buildable test targets for one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestManifest {
    pub targets: Vec<TestTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTarget {
    pub name: String,
}

/// Produces mutation schemata for a source file and rewrites the file so
/// every schema is guarded by a runtime activation check. The rewritten
/// file with no activation set must behave exactly like the original.
pub trait SourceTransformer {
    fn discover_schemata(
        &self,
        file_path: &str,
        source: &str,
        operators: &[String],
    ) -> Result<Vec<MutationSchema>, MutorError>;

    fn embed_schemata(
        &self,
        file_path: &str,
        source: &str,
        schemata: &[MutationSchema],
    ) -> Result<String, MutorError>;
}

/// Invokes the project's native build and test toolchain.
pub trait BuildTestDriver {
    /// Build the staged copy for testing and produce its test manifest.
    fn build_for_testing(&self, workspace: &Path) -> Result<TestManifest, MutorError>;

    /// Produce the manifest for an already-built workspace (test-plan
    /// workflows that skip the build step).
    fn discover_test_manifest(&self, workspace: &Path) -> Result<TestManifest, MutorError>;

    /// Best-effort pre-flight before a cycle; a failure here is reported
    /// and the cycle still runs.
    fn activate(&self, workspace: &Path, schema: &MutationSchema) -> Result<(), String>;

    /// Run the (restricted) test manifest with the given activation.
    /// Infallible by contract: anything that prevents a verdict is a
    /// `BuildError` with the failure detail as the log.
    fn run_tests(
        &self,
        workspace: &Path,
        manifest: &TestManifest,
        activation: &Activation,
        log_name: &str,
    ) -> (TestVerdict, String);
}

pub trait CoverageProvider {
    fn coverage(&self, project: &Path) -> Result<f64, String>;
}

/// Split a command string into program and leading arguments.
pub fn parse_command(cmd: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    if parts.len() > 1 {
        (parts[0].to_string(), parts[1..].iter().map(|s| s.to_string()).collect())
    } else {
        (cmd.to_string(), vec![])
    }
}

/// Process-backed driver configured by `MutorConfig`. Activation reaches
/// the already-built artifact through the `MUTOR_ACTIVATION` environment
/// variable; nothing is recompiled between mutants.
pub struct ShellDriver {
    config: MutorConfig,
    test_filter: Vec<String>,
}

impl ShellDriver {
    pub fn new(config: MutorConfig, test_filter: Vec<String>) -> Self {
        Self { config, test_filter }
    }

    /// Manifest targets from configuration, restricted to the requested
    /// subset. Filters match either the target name or the file stem of a
    /// test-file path.
    fn manifest(&self) -> TestManifest {
        let targets = self
            .config
            .test_targets
            .iter()
            .filter(|name| {
                self.test_filter.is_empty()
                    || self.test_filter.iter().any(|f| filter_matches(f, name))
            })
            .map(|name| TestTarget { name: name.clone() })
            .collect();
        TestManifest { targets }
    }

    fn target_arguments(&self, manifest: &TestManifest) -> Vec<String> {
        let mut args = vec![];
        for target in &manifest.targets {
            match &self.config.test_target_argument {
                Some(template) => {
                    for piece in template.split_whitespace() {
                        args.push(piece.replace("{target}", &target.name));
                    }
                }
                None => args.push(target.name.clone()),
            }
        }
        args
    }

    fn save_log(&self, workspace: &Path, log_name: &str, log: &str) {
        let dir = workspace.join(LOG_DIR);
        if std::fs::create_dir_all(&dir).is_ok() {
            let _ = std::fs::write(dir.join(format!("{log_name}.log")), log);
        }
    }

    fn is_build_failure(&self, log: &str) -> bool {
        self.config
            .build_failure_patterns
            .iter()
            .any(|p| log.contains(p.as_str()))
    }
}

fn filter_matches(filter: &str, target: &str) -> bool {
    if filter == target {
        return true;
    }
    // Accept a test-file path filter by comparing its file stem
    Path::new(filter)
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem == target)
}

impl BuildTestDriver for ShellDriver {
    fn build_for_testing(&self, workspace: &Path) -> Result<TestManifest, MutorError> {
        if let Some(build) = &self.config.build_command {
            let output = Command::new(&build.executable)
                .args(&build.arguments)
                .current_dir(workspace)
                .output()
                .map_err(|e| MutorError::BuildFailed {
                    reason: format!("could not run {}: {}", build.executable, e),
                })?;
            if !output.status.success() {
                return Err(MutorError::BuildFailed {
                    reason: format!(
                        "{}\n{}",
                        String::from_utf8_lossy(&output.stdout),
                        String::from_utf8_lossy(&output.stderr)
                    ),
                });
            }
        }
        self.discover_test_manifest(workspace)
    }

    fn discover_test_manifest(&self, _workspace: &Path) -> Result<TestManifest, MutorError> {
        Ok(self.manifest())
    }

    fn activate(&self, workspace: &Path, schema: &MutationSchema) -> Result<(), String> {
        let target = workspace.join(&schema.file_path);
        if target.is_file() {
            Ok(())
        } else {
            Err(format!(
                "schema target not found in working copy: {}",
                schema.file_path
            ))
        }
    }

    fn run_tests(
        &self,
        workspace: &Path,
        manifest: &TestManifest,
        activation: &Activation,
        log_name: &str,
    ) -> (TestVerdict, String) {
        let test = &self.config.test_command;
        let mut cmd = Command::new(&test.executable);
        cmd.args(&test.arguments)
            .args(self.target_arguments(manifest))
            .current_dir(workspace)
            .env_remove(ACTIVATION_ENV);
        if let Some(id) = activation.env_value() {
            cmd.env(ACTIVATION_ENV, id);
        }

        let output = match cmd.output() {
            Ok(o) => o,
            Err(e) => {
                let log = format!("could not run {}: {}", test.executable, e);
                self.save_log(workspace, log_name, &log);
                return (TestVerdict::BuildError, log);
            }
        };

        let log = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        self.save_log(workspace, log_name, &log);

        let verdict = if output.status.success() {
            TestVerdict::Passed
        } else if self.is_build_failure(&log) {
            TestVerdict::BuildError
        } else {
            TestVerdict::Failed
        };
        (verdict, log)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformRequest<'a> {
    mode: &'a str,
    file_path: &'a str,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    operators: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schemata: Option<&'a [MutationSchema]>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformResponse {
    #[serde(default)]
    schemata: Vec<MutationSchema>,
    #[serde(default)]
    source: String,
}

/// Source transformer backed by an external command speaking one JSON
/// request on stdin and one JSON response on stdout per invocation.
pub struct CommandTransformer {
    command: CommandSpec,
}

impl CommandTransformer {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }

    fn invoke(&self, file_path: &str, request: &TransformRequest<'_>) -> Result<TransformResponse, MutorError> {
        let fail = |reason: String| MutorError::TransformFailed {
            path: file_path.into(),
            reason,
        };

        let mut child = Command::new(&self.command.executable)
            .args(&self.command.arguments)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(format!("could not run {}: {}", self.command.executable, e)))?;

        let payload = serde_json::to_vec(request).map_err(|e| fail(e.to_string()))?;
        child
            .stdin
            .take()
            .ok_or_else(|| fail("transformer stdin unavailable".into()))?
            .write_all(&payload)
            .map_err(|e| fail(e.to_string()))?;

        let output = child.wait_with_output().map_err(|e| fail(e.to_string()))?;
        if !output.status.success() {
            return Err(fail(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        serde_json::from_slice(&output.stdout).map_err(|e| fail(e.to_string()))
    }
}

impl SourceTransformer for CommandTransformer {
    fn discover_schemata(
        &self,
        file_path: &str,
        source: &str,
        operators: &[String],
    ) -> Result<Vec<MutationSchema>, MutorError> {
        let response = self.invoke(
            file_path,
            &TransformRequest {
                mode: "discover",
                file_path,
                source,
                operators: Some(operators),
                schemata: None,
            },
        )?;
        Ok(response.schemata)
    }

    fn embed_schemata(
        &self,
        file_path: &str,
        source: &str,
        schemata: &[MutationSchema],
    ) -> Result<String, MutorError> {
        let response = self.invoke(
            file_path,
            &TransformRequest {
                mode: "embed",
                file_path,
                source,
                operators: None,
                schemata: Some(schemata),
            },
        )?;
        Ok(response.source)
    }
}

/// Coverage provider that runs a configured command and reads a percentage
/// from the last numeric token of its stdout.
pub struct ShellCoverage {
    command: CommandSpec,
}

impl ShellCoverage {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl CoverageProvider for ShellCoverage {
    fn coverage(&self, project: &Path) -> Result<f64, String> {
        let output = Command::new(&self.command.executable)
            .args(&self.command.arguments)
            .current_dir(project)
            .output()
            .map_err(|e| format!("could not run {}: {}", self.command.executable, e))?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).to_string());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .split_whitespace()
            .rev()
            .find_map(|token| token.trim_end_matches('%').parse::<f64>().ok())
            .ok_or_else(|| format!("no coverage figure in output: {}", stdout.trim()))
    }
}
