//! Ubisoft Connect (formerly Uplay).
//!
//! Games come from two places. The launcher registers each install under
//! `Installs\<game id>` in the registry, in whichever hive and view the
//! installer happened to pick. It also keeps a user-chosen games folder in
//! `settings.yaml`, where titles installed natively may have no registry
//! entry at all. Registry entries carry real ids and win every conflict.

use super::{is_skippable, resolve_install_path, LauncherDetector, RegistryProbe};
use crate::config::KnownFolders;
use crate::evidence::{folder_name, list_dirs, normalize_path, read_text, RegistryReader, RegistryScope};
use crate::install::{find_main_executable, is_valid_install};
use crate::models::{clean_game_title, DetectedGame, DetectionResult, LauncherType};
use crate::reconcile::{merge_sources, push_unique_name};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const LAUNCHER_KEY: &str = r"SOFTWARE\Ubisoft\Launcher";
const LAUNCHER_KEY_WOW64: &str = r"SOFTWARE\WOW6432Node\Ubisoft\Launcher";
const INSTALLS_KEY: &str = r"SOFTWARE\Ubisoft\Launcher\Installs";

const INSTALL_PATH_PROBES: &[RegistryProbe] = &[
    RegistryProbe { scope: RegistryScope::Machine64, key_path: LAUNCHER_KEY, value_name: "InstallDir" },
    RegistryProbe { scope: RegistryScope::Machine32, key_path: LAUNCHER_KEY, value_name: "InstallDir" },
    RegistryProbe { scope: RegistryScope::CurrentUser, key_path: LAUNCHER_KEY, value_name: "InstallDir" },
    RegistryProbe { scope: RegistryScope::CurrentUser, key_path: LAUNCHER_KEY_WOW64, value_name: "InstallDir" },
];

/// Views searched for `Installs`, in precedence order. The launcher itself
/// writes to the 32-bit view.
const INSTALL_SCOPES: &[RegistryScope] = &[
    RegistryScope::Machine32,
    RegistryScope::Machine64,
    RegistryScope::CurrentUser,
];

/// Launcher binaries that ship inside game folders.
const LAUNCHER_HELPERS: &[&str] = &["upc", "uplay"];

const SKIP_PATTERNS: &[&str] = &[
    "dlc", "season pass", "expansion", "soundtrack", "art book", "artbook", "bonus", "pack",
];

const SETTINGS_KEY: &str = "game_installation_path:";

/// Names for ids whose install folder has a generic name.
const KNOWN_GAMES: &[(&str, &str)] = &[
    ("635", "Tom Clancy's Rainbow Six Siege"),
    ("720", "Far Cry 5"),
    ("1842", "Assassin's Creed Valhalla"),
    ("5855", "Assassin's Creed Mirage"),
    ("4923", "Far Cry 6"),
    ("3539", "Assassin's Creed Odyssey"),
    ("5266", "Watch Dogs: Legion"),
    ("410", "Far Cry 4"),
    ("568", "Far Cry Primal"),
    ("2738", "The Division 2"),
    ("2739", "The Crew 2"),
    ("4312", "Ghost Recon Breakpoint"),
    ("1843", "Immortals Fenyx Rising"),
    ("5436", "Riders Republic"),
    ("5265", "Hyper Scape"),
    ("3787", "Anno 1800"),
];

/// Ids for well-known folder names in the native games folder.
const FOLDER_IDS: &[(&str, &str)] = &[
    ("Roller Champions", "11899"),
    ("XDefiant", "925"),
    ("Tom Clancy's Rainbow Six Siege", "635"),
    ("Rainbow Six Siege", "635"),
    ("Far Cry 5", "720"),
    ("Far Cry 6", "4923"),
    ("Far Cry 4", "410"),
    ("Far Cry Primal", "568"),
    ("Assassin's Creed Valhalla", "1842"),
    ("Assassin's Creed Mirage", "5855"),
    ("Assassin's Creed Odyssey", "3539"),
    ("Watch Dogs Legion", "5266"),
    ("The Division 2", "2738"),
    ("The Crew 2", "2739"),
    ("Ghost Recon Breakpoint", "4312"),
    ("Immortals Fenyx Rising", "1843"),
    ("Riders Republic", "5436"),
    ("Anno 1800", "3787"),
    ("Hyper Scape", "5265"),
];

pub struct UbisoftConnectDetector {
    registry: Arc<dyn RegistryReader>,
    folders: KnownFolders,
}

impl UbisoftConnectDetector {
    pub fn new(registry: Arc<dyn RegistryReader>, folders: KnownFolders) -> Self {
        Self { registry, folders }
    }

    fn default_install_paths(&self) -> Vec<PathBuf> {
        vec![
            self.folders.program_files_x86.join("Ubisoft").join("Ubisoft Game Launcher"),
            self.folders.program_files.join("Ubisoft").join("Ubisoft Game Launcher"),
            self.folders.program_files_x86.join("Ubisoft Game Launcher"),
        ]
    }

    fn registry_games(&self) -> Vec<DetectedGame> {
        let mut games = Vec::new();
        for &scope in INSTALL_SCOPES {
            if !self.registry.key_exists(scope, INSTALLS_KEY) {
                debug!(?scope, "no Installs key in this view");
                continue;
            }
            for game_id in self.registry.subkey_names(scope, INSTALLS_KEY) {
                if let Some(game) = self.game_from_registry(scope, &game_id) {
                    if !push_unique_name(&mut games, game) {
                        debug!(game_id, ?scope, "same id or title already registered");
                    }
                }
            }
        }
        games
    }

    fn game_from_registry(&self, scope: RegistryScope, game_id: &str) -> Option<DetectedGame> {
        let key_path = format!(r"{INSTALLS_KEY}\{game_id}");
        let raw = self.registry.read_value(scope, &key_path, "InstallDir")?;
        let install_dir = normalize_path(&raw)?;
        if !is_valid_install(&install_dir) {
            debug!(game_id, path = %install_dir.display(), "registered install is empty or gone");
            return None;
        }

        let name = game_name(&install_dir, game_id)?;
        if is_skippable(&name, SKIP_PATTERNS) {
            debug!(game_id, name, "not a game");
            return None;
        }
        let name = clean_game_title(&name);
        if name.is_empty() {
            return None;
        }

        Some(DetectedGame {
            name,
            external_id: game_id.to_string(),
            executable_path: find_main_executable(&install_dir, LAUNCHER_HELPERS),
            install_path: install_dir,
            launch_command: Some(launch_uri(game_id)),
        })
    }

    /// Root of natively installed games: the folder from `settings.yaml`,
    /// or the stock one under Program Files.
    pub fn games_folder(&self) -> Option<PathBuf> {
        let settings = self
            .folders
            .local_app_data
            .join("Ubisoft Game Launcher")
            .join("settings.yaml");
        let configured = read_text(&settings)
            .and_then(|content| parse_games_folder(&content))
            .filter(|path| path.is_dir());
        if configured.is_some() {
            return configured;
        }

        let default = self
            .folders
            .program_files_x86
            .join("Ubisoft")
            .join("Ubisoft Game Launcher")
            .join("games");
        default.is_dir().then_some(default)
    }

    fn folder_games(&self) -> Vec<DetectedGame> {
        let Some(root) = self.games_folder() else {
            return Vec::new();
        };
        list_dirs(&root)
            .iter()
            .filter_map(|dir| game_from_folder(dir))
            .collect()
    }
}

impl LauncherDetector for UbisoftConnectDetector {
    fn launcher_type(&self) -> LauncherType {
        LauncherType::UbisoftConnect
    }

    fn install_path(&self) -> Option<PathBuf> {
        resolve_install_path(
            self.registry.as_ref(),
            INSTALL_PATH_PROBES,
            &self.default_install_paths(),
        )
    }

    fn detect_games(&self) -> DetectionResult {
        let Some(install_path) = self.install_path() else {
            return DetectionResult::not_installed("Ubisoft Connect installation not found");
        };

        let mut result = DetectionResult::installed(install_path);
        let registry_games = self.registry_games();
        let folder_games = self.folder_games();
        let from_registry = registry_games.len();
        result.games = merge_sources(registry_games, folder_games);

        info!(
            "-> Total {} Ubisoft games ({} from registry).",
            result.games.len(),
            from_registry
        );
        result
    }
}

fn game_from_folder(game_dir: &Path) -> Option<DetectedGame> {
    let folder = folder_name(game_dir)?;
    if !is_valid_install(game_dir) {
        return None;
    }
    let executable = find_main_executable(game_dir, LAUNCHER_HELPERS)?;
    if is_skippable(&folder, SKIP_PATTERNS) {
        debug!(folder, "not a game");
        return None;
    }
    let name = clean_game_title(&folder);
    if name.is_empty() {
        return None;
    }

    let game_id = folder_game_id(&folder);
    let launch_command = match game_id {
        Some(id) => launch_uri(id),
        None => executable.to_string_lossy().into_owned(),
    };

    Some(DetectedGame {
        name,
        external_id: game_id.map(str::to_string).unwrap_or(folder),
        install_path: game_dir.to_path_buf(),
        executable_path: Some(executable),
        launch_command: Some(launch_command),
    })
}

fn launch_uri(game_id: &str) -> String {
    format!("uplay://launch/{game_id}/0")
}

/// Folder name, unless it says nothing about the game; then the known
/// title for the id; then the folder name anyway.
fn game_name(install_dir: &Path, game_id: &str) -> Option<String> {
    let folder = folder_name(install_dir);
    match folder {
        Some(name) if !is_generic_folder_name(&name) => Some(name),
        _ => known_game_name(game_id).map(str::to_string).or(folder),
    }
}

/// Folder names like `game`, `Games` or `12345`.
pub fn is_generic_folder_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower.is_empty() || lower == "game" || lower == "games" || lower.chars().all(|c| c.is_ascii_digit())
}

fn known_game_name(game_id: &str) -> Option<&'static str> {
    KNOWN_GAMES
        .iter()
        .find(|(id, _)| *id == game_id)
        .map(|(_, name)| *name)
}

fn folder_game_id(folder: &str) -> Option<&'static str> {
    FOLDER_IDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(folder))
        .map(|(_, id)| *id)
}

/// Pulls `game_installation_path` out of `settings.yaml` without a full
/// YAML parse; the file is otherwise free-form.
fn parse_games_folder(content: &str) -> Option<PathBuf> {
    let value = content
        .lines()
        .find_map(|line| line.split_once(SETTINGS_KEY).map(|(_, value)| value))?;
    normalize_path(value.trim().trim_matches(['"', '\'']))
}
