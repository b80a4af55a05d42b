//! Fault-tolerant readers for registry and filesystem evidence.
//!
//! A launcher that is not installed simply has none of its keys or files, so
//! every reader here reports "absent" instead of failing. Access errors are
//! logged at `debug` and folded into the same absent result.

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// Which hive and bit-view a registry read targets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistryScope {
    /// `HKEY_LOCAL_MACHINE`, native 64-bit view.
    Machine64,
    /// `HKEY_LOCAL_MACHINE`, 32-bit (WOW6432Node) view.
    Machine32,
    /// `HKEY_CURRENT_USER`.
    CurrentUser,
}

/// Read access to the registry.
///
/// Implementors provide the fallible `try_*` methods, where `Ok(None)` or an
/// empty list means the key or value does not exist and `Err` means it could
/// not be read. Detectors only call the provided fail-soft methods.
pub trait RegistryReader: Send + Sync {
    fn try_read_value(
        &self,
        scope: RegistryScope,
        key_path: &str,
        value_name: &str,
    ) -> Result<Option<String>, ProbeError>;

    fn try_subkey_names(
        &self,
        scope: RegistryScope,
        key_path: &str,
    ) -> Result<Vec<String>, ProbeError>;

    fn try_key_exists(&self, scope: RegistryScope, key_path: &str) -> Result<bool, ProbeError>;

    /// Value as a string, or `None` if the key/value is absent or unreadable.
    fn read_value(&self, scope: RegistryScope, key_path: &str, value_name: &str) -> Option<String> {
        match self.try_read_value(scope, key_path, value_name) {
            Ok(value) => value,
            Err(err) => {
                debug!(?scope, %err, "registry value treated as absent");
                None
            }
        }
    }

    /// Names of the direct subkeys, empty if the key is absent or unreadable.
    fn subkey_names(&self, scope: RegistryScope, key_path: &str) -> Vec<String> {
        match self.try_subkey_names(scope, key_path) {
            Ok(names) => names,
            Err(err) => {
                debug!(?scope, %err, "registry key treated as empty");
                Vec::new()
            }
        }
    }

    fn key_exists(&self, scope: RegistryScope, key_path: &str) -> bool {
        match self.try_key_exists(scope, key_path) {
            Ok(exists) => exists,
            Err(err) => {
                debug!(?scope, %err, "registry key treated as missing");
                false
            }
        }
    }
}

/// The registry of the running machine.
#[cfg(windows)]
pub fn system_registry() -> Arc<dyn RegistryReader> {
    Arc::new(WindowsRegistry)
}

/// The registry of the running machine. Hosts without one see every key as
/// absent.
#[cfg(not(windows))]
pub fn system_registry() -> Arc<dyn RegistryReader> {
    Arc::new(NullRegistry)
}

#[cfg(windows)]
pub use windows_registry::WindowsRegistry;

#[cfg(windows)]
mod windows_registry {
    use super::{RegistryReader, RegistryScope};
    use crate::error::ProbeError;
    use std::io;
    use winreg::enums::*;
    use winreg::RegKey;

    /// Registry reads through `winreg`. Each call opens and drops its own
    /// key handle.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowsRegistry;

    fn open(scope: RegistryScope, key_path: &str) -> Result<Option<RegKey>, ProbeError> {
        let (hive, flags) = match scope {
            RegistryScope::Machine64 => (HKEY_LOCAL_MACHINE, KEY_READ | KEY_WOW64_64KEY),
            RegistryScope::Machine32 => (HKEY_LOCAL_MACHINE, KEY_READ | KEY_WOW64_32KEY),
            RegistryScope::CurrentUser => (HKEY_CURRENT_USER, KEY_READ),
        };
        match RegKey::predef(hive).open_subkey_with_flags(key_path, flags) {
            Ok(key) => Ok(Some(key)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProbeError::OpenKey {
                path: key_path.to_string(),
                source,
            }),
        }
    }

    impl RegistryReader for WindowsRegistry {
        fn try_read_value(
            &self,
            scope: RegistryScope,
            key_path: &str,
            value_name: &str,
        ) -> Result<Option<String>, ProbeError> {
            let Some(key) = open(scope, key_path)? else {
                return Ok(None);
            };
            match key.get_value::<String, _>(value_name) {
                Ok(value) => Ok(Some(value)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                // DWORD values are read as their decimal text.
                Err(source) => match key.get_value::<u32, _>(value_name) {
                    Ok(number) => Ok(Some(number.to_string())),
                    Err(_) => Err(ProbeError::ReadValue {
                        path: key_path.to_string(),
                        name: value_name.to_string(),
                        source,
                    }),
                },
            }
        }

        fn try_subkey_names(
            &self,
            scope: RegistryScope,
            key_path: &str,
        ) -> Result<Vec<String>, ProbeError> {
            let Some(key) = open(scope, key_path)? else {
                return Ok(Vec::new());
            };
            Ok(key.enum_keys().flatten().collect())
        }

        fn try_key_exists(&self, scope: RegistryScope, key_path: &str) -> Result<bool, ProbeError> {
            Ok(open(scope, key_path)?.is_some())
        }
    }
}

/// A registry with no keys at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRegistry;

impl RegistryReader for NullRegistry {
    fn try_read_value(
        &self,
        _scope: RegistryScope,
        _key_path: &str,
        _value_name: &str,
    ) -> Result<Option<String>, ProbeError> {
        Ok(None)
    }

    fn try_subkey_names(
        &self,
        _scope: RegistryScope,
        _key_path: &str,
    ) -> Result<Vec<String>, ProbeError> {
        Ok(Vec::new())
    }

    fn try_key_exists(&self, _scope: RegistryScope, _key_path: &str) -> Result<bool, ProbeError> {
        Ok(false)
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryKey {
    name: String,
    values: BTreeMap<String, String>,
}

/// In-memory registry with the same case-insensitive key and value lookup
/// as the real one. Keys can be marked as denied to simulate access errors.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    keys: BTreeMap<(RegistryScope, String), MemoryKey>,
    denied: BTreeSet<(RegistryScope, String)>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `key_path` and every missing parent key.
    pub fn with_key(mut self, scope: RegistryScope, key_path: &str) -> Self {
        self.insert_key(scope, key_path);
        self
    }

    pub fn with_value(
        mut self,
        scope: RegistryScope,
        key_path: &str,
        value_name: &str,
        value: impl Into<String>,
    ) -> Self {
        let key = self.insert_key(scope, key_path);
        key.values.insert(value_name.to_lowercase(), value.into());
        self
    }

    /// Makes every read at or below `key_path` fail with access denied.
    pub fn with_denied(mut self, scope: RegistryScope, key_path: &str) -> Self {
        self.denied.insert((scope, key_id(key_path)));
        self
    }

    fn insert_key(&mut self, scope: RegistryScope, key_path: &str) -> &mut MemoryKey {
        let segments: Vec<&str> = key_segments(key_path).collect();
        for depth in 1..segments.len() {
            let parent = segments[..depth].join("\\");
            self.keys
                .entry((scope, parent.to_lowercase()))
                .or_insert_with(|| MemoryKey {
                    name: segments[depth - 1].to_string(),
                    values: BTreeMap::new(),
                });
        }
        let name = segments.last().copied().unwrap_or_default().to_string();
        self.keys
            .entry((scope, key_id(key_path)))
            .or_insert_with(|| MemoryKey {
                name,
                values: BTreeMap::new(),
            })
    }

    fn check_access(&self, scope: RegistryScope, id: &str) -> Result<(), ProbeError> {
        let blocked = self.denied.iter().any(|(denied_scope, denied)| {
            *denied_scope == scope
                && (id == denied || id.starts_with(&format!("{denied}\\")))
        });
        if blocked {
            return Err(ProbeError::OpenKey {
                path: id.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        Ok(())
    }
}

fn key_segments(key_path: &str) -> impl Iterator<Item = &str> {
    key_path.split(['\\', '/']).filter(|segment| !segment.is_empty())
}

fn key_id(key_path: &str) -> String {
    key_segments(key_path)
        .collect::<Vec<_>>()
        .join("\\")
        .to_lowercase()
}

impl RegistryReader for MemoryRegistry {
    fn try_read_value(
        &self,
        scope: RegistryScope,
        key_path: &str,
        value_name: &str,
    ) -> Result<Option<String>, ProbeError> {
        let id = key_id(key_path);
        self.check_access(scope, &id)?;
        Ok(self
            .keys
            .get(&(scope, id))
            .and_then(|key| key.values.get(&value_name.to_lowercase()))
            .cloned())
    }

    fn try_subkey_names(
        &self,
        scope: RegistryScope,
        key_path: &str,
    ) -> Result<Vec<String>, ProbeError> {
        let id = key_id(key_path);
        self.check_access(scope, &id)?;
        let prefix = format!("{id}\\");
        Ok(self
            .keys
            .iter()
            .filter(|((key_scope, child), _)| {
                *key_scope == scope
                    && child
                        .strip_prefix(&prefix)
                        .is_some_and(|rest| !rest.contains('\\'))
            })
            .map(|(_, key)| key.name.clone())
            .collect())
    }

    fn try_key_exists(&self, scope: RegistryScope, key_path: &str) -> Result<bool, ProbeError> {
        let id = key_id(key_path);
        self.check_access(scope, &id)?;
        Ok(self.keys.contains_key(&(scope, id)))
    }
}

/// Reads a whole text file, `None` if it is missing or unreadable.
pub fn read_text(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), %err, "file treated as absent");
            }
            None
        }
    }
}

/// Files in `dir` whose extension matches `extension` (case-insensitive),
/// sorted by file name. Links are followed; unreadable entries and link
/// loops are skipped.
pub fn find_files(dir: &Path, extension: &str, recursive: bool) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let depth = if recursive { usize::MAX } else { 1 };
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(depth)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), extension))
        .map(|entry| entry.into_path())
        .collect()
}

/// Immediate subdirectories of `dir`, sorted by name. Symlinks and
/// junctions to directories count as subdirectories.
pub fn list_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Turns a path string from a registry value or config file into a host
/// path: either slash becomes the native separator, surrounding quotes and
/// trailing separators are dropped. A bare drive such as `C:\` keeps its
/// separator so it stays absolute.
pub fn normalize_path(raw: &str) -> Option<PathBuf> {
    let unquoted = raw.trim().trim_matches('"').trim();
    let native: String = unquoted
        .chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect();
    let trimmed = native.trim_end_matches(MAIN_SEPARATOR);
    if trimmed.is_empty() {
        // A bare root such as "/" keeps its separator.
        return (!native.is_empty()).then(|| PathBuf::from(native));
    }
    if is_drive_prefix(trimmed) && trimmed.len() < native.len() {
        return Some(PathBuf::from(format!("{trimmed}{MAIN_SEPARATOR}")));
    }
    Some(PathBuf::from(trimmed))
}

/// `C:` and the like.
fn is_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Final path component as text, if any.
pub fn folder_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
