use std::path::PathBuf;

use anyhow::Result;
use regex::Regex;

use crate::settings::Settings;

/// A source subdirectory selected for shipping. Identity is the name; the
/// derived remote and backup paths are fixed at scan time.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub path: PathBuf,
    pub remote_path: String,
    pub backup_path: PathBuf,
}

/// Compile the operator pattern with both ends anchored, so `regex_matcher`
/// selects whole directory names and never substrings.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| -> anyhow::Error {
        crate::TransferError::InvalidPattern(pattern.to_string(), e.to_string()).into()
    })
}

/// Scan the source directory once and collect matching subdirectories,
/// sorted by name so a run processes them in a stable order.
///
/// The directory test follows symlinks: a symlink to a directory is a
/// candidate, a symlink to a file is not.
pub fn scan(settings: &Settings, pattern: &Regex) -> Result<Vec<Candidate>> {
    let root = &settings.source_dir;
    if !root.is_dir() {
        return Err(crate::TransferError::SourceRootMissing(root.display().to_string()).into());
    }
    let rd = std::fs::read_dir(root).map_err(|e| -> anyhow::Error {
        crate::TransferError::SourceReadFailed(root.display().to_string(), e.to_string()).into()
    })?;

    let mut candidates = Vec::new();
    for entry in rd.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            tracing::debug!("skipping non-unicode entry in {}", root.display());
            continue;
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if !pattern.is_match(name) {
            tracing::debug!("no match: {}", name);
            continue;
        }
        candidates.push(Candidate {
            name: name.to_string(),
            path,
            remote_path: settings.remote_path_for(name),
            backup_path: settings.backup_dir.join(name),
        });
    }
    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(candidates)
}
