//! Scan configuration.
//!
//! Detectors never query OS "special folders" directly; they get a
//! [`KnownFolders`] value, which defaults to the process environment and can
//! be overridden from a JSON file.

use crate::error::ConfigError;
use crate::models::LauncherType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root folders that conventional launcher paths are built from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct KnownFolders {
    pub program_files: PathBuf,
    pub program_files_x86: PathBuf,
    pub program_data: PathBuf,
    pub local_app_data: PathBuf,
}

impl KnownFolders {
    pub fn from_env() -> Self {
        Self {
            program_files: env_folder("ProgramFiles", r"C:\Program Files"),
            program_files_x86: env_folder("ProgramFiles(x86)", r"C:\Program Files (x86)"),
            program_data: env_folder("ProgramData", r"C:\ProgramData"),
            local_app_data: std::env::var_os("LOCALAPPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    env_folder("USERPROFILE", r"C:\Users\Default")
                        .join("AppData")
                        .join("Local")
                }),
        }
    }

    /// Every folder under one root, for tests and sandboxed scans.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            program_files: root.join("Program Files"),
            program_files_x86: root.join("Program Files (x86)"),
            program_data: root.join("ProgramData"),
            local_app_data: root.join("AppData").join("Local"),
        }
    }
}

impl Default for KnownFolders {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_folder(var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(fallback))
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DetectorConfig {
    pub folders: KnownFolders,
    /// Platforms to scan. Empty means every registered detector.
    pub launchers: Vec<LauncherType>,
}

impl DetectorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn wants(&self, launcher: LauncherType) -> bool {
        self.launchers.is_empty() || self.launchers.contains(&launcher)
    }
}
