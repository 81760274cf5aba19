use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "hie-storage.intersect.org.au";
pub const DEFAULT_PORT: u16 = 22;

/// Placement of files under the remote directory and the backup directory.
/// `flat` drops every file under the candidate's directory by base name;
/// `mirror` preserves the relative paths below the candidate root.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Flat,
    Mirror,
}

/// What to do with the rest of the run when an existence guard trips.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Halt,
    Skip,
}

/// Operator settings, read once from `settings.yaml`. The camelCase aliases
/// keep legacy settings files loading unchanged.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub storage_username: String,
    pub key_file: PathBuf,
    pub regex_matcher: String,
    #[serde(alias = "hiestorageDir")]
    pub remote_dir: String,
    #[serde(alias = "cleanedDir")]
    pub source_dir: PathBuf,
    #[serde(alias = "backupDir")]
    pub backup_dir: PathBuf,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_transfer_suffix")]
    pub transfer_suffix: String,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_transfer_suffix() -> String {
    ".tif".to_string()
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        let mut settings: Settings = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file: {}", path.display()))?;
        settings.key_file = expand_tilde(&settings.key_file);
        settings.source_dir = expand_tilde(&settings.source_dir);
        settings.backup_dir = expand_tilde(&settings.backup_dir);
        Ok(settings)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Remote directory for a candidate. Remote paths always use forward
    /// slashes regardless of the local platform.
    pub fn remote_path_for(&self, name: &str) -> String {
        format!("{}/{}", self.remote_dir.trim_end_matches('/'), name)
    }
}

/// Expand a leading `~` against the user's home directory. Paths that do not
/// start with `~`, or hosts without a resolvable home, pass through unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if s == "~" {
        return dirs::home_dir().unwrap_or_else(|| path.to_path_buf());
    }
    if let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
