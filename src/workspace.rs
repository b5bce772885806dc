use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MutorConfig;
use crate::error::MutorError;
use crate::options::RunOptions;
use crate::plan::DEFAULT_PLAN_FILE;

const SKIP_NAMES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    ".venv",
    "venv",
    "__pycache__",
    ".build",
    "target",
    "dist",
    "build",
    "DerivedData",
    DEFAULT_PLAN_FILE,
];

const MUTATED_SUFFIX: &str = "_mutated";

fn should_skip(name: &str) -> bool {
    SKIP_NAMES.iter().any(|s| *s == name) || name.ends_with(MUTATED_SUFFIX)
}

/// Destination of the staged working copy: a sibling directory named after
/// the project with a `_mutated` suffix.
pub fn mutated_project_path(project_directory: &Path) -> PathBuf {
    let name = project_directory
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string());
    let parent = project_directory.parent().unwrap_or(project_directory);
    parent.join(format!("{name}{MUTATED_SUFFIX}"))
}

/// Remove a stale working copy left by a previous (possibly interrupted)
/// run. Doing nothing when none exists is the common case.
pub fn remove_previous_run(mutated_project: &Path) -> Result<(), MutorError> {
    if !mutated_project.exists() {
        return Ok(());
    }
    fs::remove_dir_all(mutated_project).map_err(|e| MutorError::WorkspaceFailed {
        reason: format!(
            "could not remove previous working copy {}: {}",
            mutated_project.display(),
            e
        ),
    })
}

/// Stage a full filtered copy of the project. The original directory is
/// read-only for the rest of the run; all mutation happens in the copy.
pub fn copy_project(project: &Path, mutated_project: &Path) -> Result<(), MutorError> {
    copy_dir_filtered(project, mutated_project).map_err(|e| MutorError::WorkspaceFailed {
        reason: format!(
            "could not copy {} to {}: {}",
            project.display(),
            mutated_project.display(),
            e
        ),
    })
}

fn copy_dir_filtered(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if should_skip(&name.to_string_lossy()) {
            continue;
        }
        let src_path = entry.path();
        let dst_path = dst.join(&name);
        let ft = entry.file_type()?;
        if ft.is_dir() {
            copy_dir_filtered(&src_path, &dst_path)?;
        } else if ft.is_file() {
            fs::copy(&src_path, &dst_path)?;
        }
        // Symlinks and other special files are not staged
    }
    Ok(())
}

/// List the mutable source files inside the staged copy. An explicit
/// `files_to_mutate` list wins; otherwise every file with a configured
/// source extension is collected in sorted order.
pub fn discover_source_files(
    mutated_project: &Path,
    options: &RunOptions,
    config: &MutorConfig,
) -> Result<Vec<PathBuf>, MutorError> {
    if !options.files_to_mutate.is_empty() {
        let mut files = Vec::with_capacity(options.files_to_mutate.len());
        for rel in &options.files_to_mutate {
            let path = mutated_project.join(rel);
            if !path.is_file() {
                return Err(MutorError::WorkspaceFailed {
                    reason: format!("file to mutate not found in working copy: {rel}"),
                });
            }
            files.push(path);
        }
        return Ok(files);
    }

    let mut files = vec![];
    walk_sources(mutated_project, &config.source_file_extensions, &mut files).map_err(|e| {
        MutorError::WorkspaceFailed {
            reason: format!("could not walk {}: {}", mutated_project.display(), e),
        }
    })?;
    files.sort();
    Ok(files)
}

fn walk_sources(
    dir: &Path,
    extensions: &[String],
    out: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if should_skip(&name.to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk_sources(&path, extensions, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x == e))
        {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandSpec;
    use tempfile::TempDir;

    fn test_config() -> MutorConfig {
        MutorConfig {
            test_command: CommandSpec { executable: "true".into(), arguments: vec![] },
            build_command: None,
            coverage_command: None,
            transformer_command: None,
            test_targets: vec![],
            test_target_argument: None,
            source_file_extensions: vec!["rs".into()],
            build_failure_patterns: vec![],
        }
    }

    #[test]
    fn mutated_path_is_sibling_with_suffix() {
        let path = mutated_project_path(Path::new("/work/proj"));
        assert_eq!(path, PathBuf::from("/work/proj_mutated"));
    }

    #[test]
    fn copy_skips_vcs_and_build_output() {
        let src_dir = TempDir::new().unwrap();
        let src = src_dir.path();
        fs::create_dir(src.join(".git")).unwrap();
        fs::write(src.join(".git").join("HEAD"), "ref").unwrap();
        fs::create_dir(src.join("target")).unwrap();
        fs::write(src.join("target").join("out"), "bin").unwrap();
        fs::create_dir(src.join("src")).unwrap();
        fs::write(src.join("src").join("lib.rs"), "pub fn f() {}").unwrap();

        let dst_dir = TempDir::new().unwrap();
        let dst = dst_dir.path().join("copy");
        copy_project(src, &dst).unwrap();

        assert!(dst.join("src").join("lib.rs").exists());
        assert!(!dst.join(".git").exists());
        assert!(!dst.join("target").exists());
    }

    #[test]
    fn copy_skips_previous_mutated_copy_and_plan() {
        let src_dir = TempDir::new().unwrap();
        let src = src_dir.path();
        fs::create_dir(src.join("proj_mutated")).unwrap();
        fs::write(src.join("proj_mutated").join("stale"), "x").unwrap();
        fs::write(src.join(DEFAULT_PLAN_FILE), "{}").unwrap();
        fs::write(src.join("main.rs"), "fn main() {}").unwrap();

        let dst_dir = TempDir::new().unwrap();
        let dst = dst_dir.path().join("copy");
        copy_project(src, &dst).unwrap();

        assert!(dst.join("main.rs").exists());
        assert!(!dst.join("proj_mutated").exists());
        assert!(!dst.join(DEFAULT_PLAN_FILE).exists());
    }

    #[test]
    fn remove_previous_run_is_noop_without_copy() {
        let dir = TempDir::new().unwrap();
        remove_previous_run(&dir.path().join("gone_mutated")).unwrap();
    }

    #[test]
    fn discover_collects_sorted_sources_by_extension() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src").join("b.rs"), "").unwrap();
        fs::write(root.join("src").join("a.rs"), "").unwrap();
        fs::write(root.join("src").join("notes.md"), "").unwrap();

        let files =
            discover_source_files(root, &RunOptions::default(), &test_config()).unwrap();
        assert_eq!(
            files,
            vec![root.join("src").join("a.rs"), root.join("src").join("b.rs")]
        );
    }

    #[test]
    fn discover_honors_explicit_file_list() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src").join("a.rs"), "").unwrap();
        fs::write(root.join("src").join("b.rs"), "").unwrap();

        let options = RunOptions {
            files_to_mutate: vec!["src/b.rs".into()],
            ..RunOptions::default()
        };
        let files = discover_source_files(root, &options, &test_config()).unwrap();
        assert_eq!(files, vec![root.join("src").join("b.rs")]);
    }

    #[test]
    fn discover_missing_explicit_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let options = RunOptions {
            files_to_mutate: vec!["src/missing.rs".into()],
            ..RunOptions::default()
        };
        let err = discover_source_files(dir.path(), &options, &test_config()).unwrap_err();
        assert!(matches!(err, MutorError::WorkspaceFailed { .. }));
    }
}
