//! General utility functions for wdbc
//!
//! This module contains common helper functions used across the library.

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

/// Format a file size in human-readable form (B, KB, MB)
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}

/// Build a case-insensitive matcher for DBC file names
///
/// `*.ext` matches in any directory and a bare word without wildcards is a
/// substring search, so `Suffix` finds `enUS/ItemRandomSuffix.dbc`.
pub fn create_glob_matcher(pattern: &str) -> Result<GlobMatcher> {
    let expanded = match pattern.strip_prefix("*.") {
        Some(ext) => format!("**/*.{}", ext),
        None if !pattern.contains(&['*', '?', '['][..]) => format!("**/*{}*", pattern),
        None => pattern.to_string(),
    };
    let glob = GlobBuilder::new(&expanded)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Invalid filter pattern: {}", pattern))?;
    Ok(glob.compile_matcher())
}

/// True when there is no filter or the name passes it
pub fn matches_filter(name: &str, matcher: Option<&GlobMatcher>) -> bool {
    matcher.map_or(true, |m| m.is_match(name))
}

/// Recursively collect all files in a directory, sorted by path
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files_recursive(dir, &mut files)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    files.sort();
    Ok(files)
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                collect_files_recursive(&path, files)?;
            } else {
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Create the parent directories of every path
pub fn mk_base_dirs<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}
