use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::config::ResolvedConfig;

/// File name suffixes of flow documents.
pub const FLOW_SUFFIXES: &[&str] = &[".flow.json", ".flow.yml", ".flow.yaml"];

pub fn is_flow_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| FLOW_SUFFIXES.iter().any(|s| name.ends_with(s)))
}

/// Discover flow files from the given paths, respecting .gitignore
/// and AllProcessors.Exclude patterns.
pub fn discover_files(paths: &[PathBuf], config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            // Direct file paths bypass suffix filtering
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_directory(path, config)?);
        } else {
            anyhow::bail!("path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_directory(dir: &Path, config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(dir);
    builder.hidden(true).git_ignore(true).git_global(true);

    let global_excludes = config.global_excludes();
    if !global_excludes.is_empty() {
        let mut overrides = OverrideBuilder::new(dir);
        for pattern in global_excludes {
            overrides
                .add(&format!("!{pattern}"))
                .with_context(|| format!("invalid exclude pattern: {pattern}"))?;
        }
        let overrides = overrides.build().context("failed to build overrides")?;
        builder.overrides(overrides);
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.context("error walking directory")?;
        let path = entry.path();
        if path.is_file() && is_flow_file(path) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
