use super::{is_skippable, resolve_install_path, LauncherDetector, RegistryProbe};
use crate::config::KnownFolders;
use crate::evidence::{find_files, normalize_path, read_text, RegistryReader, RegistryScope};
use crate::install::{find_main_executable, is_valid_install};
use crate::models::{clean_game_title, DetectedGame, DetectionResult, LauncherType};
use crate::reconcile::push_unique_id;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const STEAM_KEY: &str = r"SOFTWARE\Valve\Steam";

const INSTALL_PATH_PROBES: &[RegistryProbe] = &[
    RegistryProbe { scope: RegistryScope::Machine32, key_path: STEAM_KEY, value_name: "InstallPath" },
    RegistryProbe { scope: RegistryScope::Machine64, key_path: STEAM_KEY, value_name: "InstallPath" },
    RegistryProbe { scope: RegistryScope::CurrentUser, key_path: STEAM_KEY, value_name: "SteamPath" },
];

/// Runtime and tool "apps" that Steam installs next to games.
const SKIP_PATTERNS: &[&str] = &[
    "steamworks common redistributables",
    "steam linux runtime",
    "proton",
    "soundtrack",
    "dedicated server",
];

const LAUNCHER_HELPERS: &[&str] = &["steamwebhelper", "steamservice"];

/// Fields of an `appmanifest_<id>.acf` file that the catalog needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AppManifest {
    app_id: String,
    name: Option<String>,
    install_dir: String,
}

pub struct SteamDetector {
    registry: Arc<dyn RegistryReader>,
    folders: KnownFolders,
}

impl SteamDetector {
    pub fn new(registry: Arc<dyn RegistryReader>, folders: KnownFolders) -> Self {
        Self { registry, folders }
    }

    /// `steamapps` folders of every library, the install root's first.
    pub fn library_folders(&self, steam_path: &Path) -> Vec<PathBuf> {
        let main = steam_path.join("steamapps");
        let mut folders = vec![main.clone()];

        let vdf = read_text(&main.join("libraryfolders.vdf")).unwrap_or_default();
        for library in parse_library_paths(&vdf) {
            let steamapps = library.join("steamapps");
            let known = folders
                .iter()
                .any(|f| f.to_string_lossy().eq_ignore_ascii_case(&steamapps.to_string_lossy()));
            if !known {
                folders.push(steamapps);
            }
        }
        folders
    }

    fn game_from_manifest(&self, library: &Path, manifest: AppManifest) -> Option<DetectedGame> {
        let game_dir = library.join("common").join(&manifest.install_dir);
        if !is_valid_install(&game_dir) {
            debug!(app_id = manifest.app_id.as_str(), "manifest without installed files");
            return None;
        }
        let name = manifest.name.unwrap_or_else(|| manifest.install_dir.clone());
        if is_skippable(&name, SKIP_PATTERNS) {
            return None;
        }
        let name = clean_game_title(&name);
        if name.is_empty() {
            return None;
        }

        Some(DetectedGame {
            name,
            launch_command: Some(format!("steam://rungameid/{}", manifest.app_id)),
            external_id: manifest.app_id,
            executable_path: find_main_executable(&game_dir, LAUNCHER_HELPERS),
            install_path: game_dir,
        })
    }
}

impl LauncherDetector for SteamDetector {
    fn launcher_type(&self) -> LauncherType {
        LauncherType::Steam
    }

    fn install_path(&self) -> Option<PathBuf> {
        let defaults = [
            self.folders.program_files_x86.join("Steam"),
            self.folders.program_files.join("Steam"),
        ];
        resolve_install_path(self.registry.as_ref(), INSTALL_PATH_PROBES, &defaults)
    }

    fn detect_games(&self) -> DetectionResult {
        let Some(steam_path) = self.install_path() else {
            return DetectionResult::not_installed("Steam installation not found");
        };

        let mut result = DetectionResult::installed(steam_path.clone());
        for library in self.library_folders(&steam_path) {
            for manifest_path in find_files(&library, "acf", false) {
                let is_app_manifest = manifest_path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().to_lowercase().starts_with("appmanifest_"));
                if !is_app_manifest {
                    continue;
                }
                let Some(manifest) = read_text(&manifest_path).and_then(|c| parse_app_manifest(&c))
                else {
                    debug!(path = %manifest_path.display(), "unreadable app manifest");
                    continue;
                };
                if let Some(game) = self.game_from_manifest(&library, manifest) {
                    push_unique_id(&mut result.games, game);
                }
            }
        }

        info!("-> Total {} Steam games cached.", result.games.len());
        result
    }
}

/// Value of a `"key"  "value"` line in Valve's KeyValues text format.
fn quoted_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut parts = line.split('"');
    let found = parts.nth(1)?;
    if !found.eq_ignore_ascii_case(key) {
        return None;
    }
    parts.nth(1)
}

fn parse_library_paths(vdf: &str) -> Vec<PathBuf> {
    vdf.lines()
        .filter_map(|line| quoted_value(line, "path"))
        .filter_map(|raw| normalize_path(&raw.replace("\\\\", "\\")))
        .collect()
}

fn parse_app_manifest(content: &str) -> Option<AppManifest> {
    let first = |key: &str| content.lines().find_map(|line| quoted_value(line, key));
    Some(AppManifest {
        app_id: first("appid")?.to_string(),
        name: first("name").map(str::to_string).filter(|n| !n.trim().is_empty()),
        install_dir: first("installdir")?.to_string(),
    })
}
