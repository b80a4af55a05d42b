use super::{is_skippable, resolve_install_path, LauncherDetector, RegistryProbe};
use crate::config::KnownFolders;
use crate::evidence::{find_files, normalize_path, read_text, RegistryReader, RegistryScope};
use crate::install::{find_main_executable, is_valid_install};
use crate::models::{clean_game_title, DetectedGame, DetectionResult, LauncherType};
use crate::reconcile::push_unique_id;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const LAUNCHER_KEY: &str = r"SOFTWARE\Epic Games\EpicGamesLauncher";

const MANIFEST_DIR_PROBES: &[RegistryProbe] = &[
    RegistryProbe { scope: RegistryScope::Machine32, key_path: LAUNCHER_KEY, value_name: "AppDataPath" },
    RegistryProbe { scope: RegistryScope::Machine64, key_path: LAUNCHER_KEY, value_name: "AppDataPath" },
];

const SKIP_PATTERNS: &[&str] = &["soundtrack", "artbook", "art book"];

const LAUNCHER_HELPERS: &[&str] = &["epicgameslauncher", "easyanticheat"];

/// The parts of a `.item` install manifest the catalog uses.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct EpicManifest {
    display_name: String,
    app_name: String,
    install_location: String,
    #[serde(default)]
    launch_executable: String,
    #[serde(default)]
    catalog_namespace: String,
    #[serde(default)]
    catalog_item_id: String,
    #[serde(default)]
    app_categories: Vec<String>,
    #[serde(rename = "bIsIncompleteInstall", default)]
    is_incomplete_install: bool,
}

impl EpicManifest {
    /// Add-ons get their own manifest; only base games are listed under
    /// the `games` category.
    fn is_game(&self) -> bool {
        self.app_categories.is_empty()
            || self
                .app_categories
                .iter()
                .any(|category| category.eq_ignore_ascii_case("games"))
    }

    fn launch_uri(&self) -> String {
        if self.catalog_namespace.is_empty() || self.catalog_item_id.is_empty() {
            format!(
                "com.epicgames.launcher://apps/{}?action=launch&silent=true",
                self.app_name
            )
        } else {
            format!(
                "com.epicgames.launcher://apps/{}%3A{}%3A{}?action=launch&silent=true",
                self.catalog_namespace, self.catalog_item_id, self.app_name
            )
        }
    }
}

pub struct EpicGamesDetector {
    registry: Arc<dyn RegistryReader>,
    folders: KnownFolders,
}

impl EpicGamesDetector {
    pub fn new(registry: Arc<dyn RegistryReader>, folders: KnownFolders) -> Self {
        Self { registry, folders }
    }

    /// Folder holding the `.item` install manifests.
    pub fn manifests_path(&self) -> Option<PathBuf> {
        let from_registry = MANIFEST_DIR_PROBES.iter().find_map(|probe| {
            let raw = self
                .registry
                .read_value(probe.scope, probe.key_path, probe.value_name)?;
            let manifests = normalize_path(&raw)?.join("Manifests");
            manifests.is_dir().then_some(manifests)
        });
        from_registry.or_else(|| {
            let default = self
                .folders
                .program_data
                .join("Epic")
                .join("EpicGamesLauncher")
                .join("Data")
                .join("Manifests");
            default.is_dir().then_some(default)
        })
    }
}

impl LauncherDetector for EpicGamesDetector {
    fn launcher_type(&self) -> LauncherType {
        LauncherType::EpicGames
    }

    fn install_path(&self) -> Option<PathBuf> {
        let defaults = [
            self.folders.program_files_x86.join("Epic Games").join("Launcher"),
            self.folders.program_files.join("Epic Games").join("Launcher"),
        ];
        resolve_install_path(self.registry.as_ref(), &[], &defaults)
    }

    fn detect_games(&self) -> DetectionResult {
        let Some(install_path) = self.install_path() else {
            return DetectionResult::not_installed("Epic Games Launcher installation not found");
        };

        let mut result = DetectionResult::installed(install_path);
        let Some(manifests) = self.manifests_path() else {
            info!("-> Epic Games Launcher has no manifest folder.");
            return result;
        };

        for manifest_path in find_files(&manifests, "item", false) {
            match read_text(&manifest_path).map(|content| serde_json::from_str::<EpicManifest>(&content)) {
                Some(Ok(manifest)) => {
                    if let Some(game) = game_from_manifest(manifest) {
                        push_unique_id(&mut result.games, game);
                    }
                }
                Some(Err(err)) => {
                    debug!(path = %manifest_path.display(), %err, "malformed install manifest");
                }
                None => {}
            }
        }

        info!("-> Total {} Epic Games cached.", result.games.len());
        result
    }
}

fn game_from_manifest(manifest: EpicManifest) -> Option<DetectedGame> {
    if manifest.is_incomplete_install || !manifest.is_game() {
        return None;
    }
    let install_dir = normalize_path(&manifest.install_location)?;
    if !is_valid_install(&install_dir) {
        debug!(app = manifest.app_name.as_str(), "manifest without installed files");
        return None;
    }
    if is_skippable(&manifest.display_name, SKIP_PATTERNS) {
        return None;
    }
    let name = clean_game_title(&manifest.display_name);
    if name.is_empty() {
        return None;
    }

    Some(DetectedGame {
        name,
        launch_command: Some(manifest.launch_uri()),
        executable_path: manifest_executable(&install_dir, &manifest.launch_executable)
            .or_else(|| find_main_executable(&install_dir, LAUNCHER_HELPERS)),
        external_id: manifest.app_name,
        install_path: install_dir,
    })
}

fn manifest_executable(install_dir: &Path, launch_executable: &str) -> Option<PathBuf> {
    let relative = normalize_path(launch_executable)?;
    let path = install_dir.join(relative);
    path.is_file().then_some(path)
}
