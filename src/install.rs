use crate::evidence::{find_files, has_extension};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const EXECUTABLE_EXTENSION: &str = "exe";

/// Filename fragments of auxiliary executables that are never the game.
/// Launchers add their own helper binaries on top of these.
pub const UTILITY_PATTERNS: &[&str] = &[
    "unins", "crash", "report", "update", "patch", "redist", "vcredist", "dxsetup", "dotnet",
    "installer", "setup",
];

/// Subfolders where engines commonly keep the game binary.
const COMMON_BINARY_DIRS: &[&str] = &["bin", "Bin", "x64", "Win64"];

/// True if `path` is a directory holding at least one executable anywhere
/// below it, linked subfolders included. Manifests of uninstalled or
/// half-installed games fail this.
pub fn is_valid_install(path: &Path) -> bool {
    if path.as_os_str().is_empty() || !path.is_dir() {
        return false;
    }
    WalkDir::new(path)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .any(|entry| {
            entry.file_type().is_file() && has_extension(entry.path(), EXECUTABLE_EXTENSION)
        })
}

/// True if the file name looks like an installer, updater or other helper.
pub fn is_utility_executable(file_name: &str, launcher_helpers: &[&str]) -> bool {
    let lower = file_name.to_lowercase();
    UTILITY_PATTERNS
        .iter()
        .chain(launcher_helpers)
        .any(|pattern| lower.contains(pattern))
}

fn is_utility_path(path: &Path, launcher_helpers: &[&str]) -> bool {
    path.file_name()
        .map(|name| is_utility_executable(&name.to_string_lossy(), launcher_helpers))
        .unwrap_or(true)
}

/// Picks the most plausible game executable in `install_dir`.
///
/// The largest non-utility executable at the root wins. Failing that, the
/// first non-utility executable of a common binary subfolder. Failing that,
/// the first root executable even if it looks like a utility.
pub fn find_main_executable(install_dir: &Path, launcher_helpers: &[&str]) -> Option<PathBuf> {
    let root_exes = find_files(install_dir, EXECUTABLE_EXTENSION, false);

    let largest = root_exes
        .iter()
        .filter(|path| !is_utility_path(path, launcher_helpers))
        .filter_map(|path| {
            let size = path.metadata().ok()?.len();
            Some((path, size))
        })
        // Ties keep the earliest by name.
        .fold(None::<(&PathBuf, u64)>, |best, (path, size)| match best {
            Some((_, best_size)) if best_size >= size => best,
            _ => Some((path, size)),
        });
    if let Some((path, _)) = largest {
        return Some(path.clone());
    }

    for sub_dir in COMMON_BINARY_DIRS {
        let sub_path = install_dir.join(sub_dir);
        if !sub_path.is_dir() {
            continue;
        }
        let main_exe = find_files(&sub_path, EXECUTABLE_EXTENSION, false)
            .into_iter()
            .find(|path| !is_utility_path(path, launcher_helpers));
        if main_exe.is_some() {
            return main_exe;
        }
    }

    root_exes.into_iter().next()
}
