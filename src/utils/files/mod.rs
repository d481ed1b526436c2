#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand files and directories into a sorted, de-duplicated list of files accepted by `filter`.
/// Directories are walked recursively; explicitly named files are always kept.
pub fn collect_files<F>(inputs: &[PathBuf], filter: F) -> Result<Vec<PathBuf>, AppError>
where
    F: Fn(&Path) -> bool,
{
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk_dir(input, &filter, &mut out)?;
        } else if input.is_file() {
            out.push(input.clone());
        } else {
            return Err(AppError::new(
                ErrorCategory::IoError,
                format!("input path {} does not exist", input.display()),
            )
            .with_code("INPUT_NOT_FOUND"));
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}

/// Walk `dir` without following symlinks, so link cycles cannot repeat a subtree.
fn walk_dir<F>(dir: &Path, filter: &F, out: &mut Vec<PathBuf>) -> Result<(), AppError>
where
    F: Fn(&Path) -> bool,
{
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let location = err
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| dir.display().to_string());
            AppError::with_source(
                ErrorCategory::IoError,
                format!("failed to walk directory {}", location),
                err,
            )
        })?;
        if entry.file_type().is_file() && filter(entry.path()) {
            out.push(entry.into_path());
        }
    }
    Ok(())
}

/// Hex-encoded SHA-256 of the file contents.
pub fn file_digest(path: &Path) -> Result<String, AppError> {
    let bytes = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Lowercase, dash-separated file name stem derived from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "workflow".to_string()
    } else {
        slug
    }
}

/// Write a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).map_err(|err| {
        AppError::with_source(
            ErrorCategory::IoError,
            format!("failed to write {}", path.display()),
            err,
        )
    })
}
