//! Recursive directory discovery for batch ingestion.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::IngestConfig;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Every regular file under `root`, minus excluded globs, sorted by path.
///
/// Format filtering is left to the orchestrator so unsupported files are
/// counted as skipped rather than silently disappearing.
pub fn scan_directory(root: &Path, config: &IngestConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Directory does not exist: {}", root.display());
    }

    let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect();
    patterns.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&patterns)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_nested_files_sorted_and_skips_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("sub").join("a.json"), "{}").unwrap();
        fs::write(root.join(".git").join("HEAD"), "ref").unwrap();
        fs::write(root.join("drafts").join("wip.txt"), "wip").unwrap();

        let config = IngestConfig {
            exclude_globs: vec!["drafts/**".to_string()],
            ..Default::default()
        };
        let files = scan_directory(root, &config).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["b.txt", "sub/a.json"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = scan_directory(Path::new("/nonexistent/docs"), &IngestConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Directory does not exist"));
    }
}
