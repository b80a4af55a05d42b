use super::{is_skippable, resolve_install_path, LauncherDetector, RegistryProbe};
use crate::config::KnownFolders;
use crate::evidence::{folder_name, normalize_path, RegistryReader, RegistryScope};
use crate::install::{find_main_executable, is_valid_install};
use crate::models::{clean_game_title, DetectedGame, DetectionResult, LauncherType};
use crate::reconcile::push_unique_id;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

const CLIENT_PATHS_KEY: &str = r"SOFTWARE\GOG.com\GalaxyClient\paths";
const GAMES_KEY: &str = r"SOFTWARE\GOG.com\Games";

const INSTALL_PATH_PROBES: &[RegistryProbe] = &[
    RegistryProbe { scope: RegistryScope::Machine32, key_path: CLIENT_PATHS_KEY, value_name: "client" },
    RegistryProbe { scope: RegistryScope::Machine64, key_path: CLIENT_PATHS_KEY, value_name: "client" },
    RegistryProbe { scope: RegistryScope::CurrentUser, key_path: CLIENT_PATHS_KEY, value_name: "client" },
];

/// GOG installers register games in the 32-bit view.
const GAME_SCOPES: &[RegistryScope] = &[RegistryScope::Machine32, RegistryScope::Machine64];

const SKIP_PATTERNS: &[&str] = &["soundtrack", "artbook", "art book", "goodies"];

const LAUNCHER_HELPERS: &[&str] = &["galaxyclient", "goggalaxy"];

pub struct GogGalaxyDetector {
    registry: Arc<dyn RegistryReader>,
    folders: KnownFolders,
}

impl GogGalaxyDetector {
    pub fn new(registry: Arc<dyn RegistryReader>, folders: KnownFolders) -> Self {
        Self { registry, folders }
    }

    fn game_from_registry(&self, scope: RegistryScope, game_id: &str) -> Option<DetectedGame> {
        let key_path = format!(r"{GAMES_KEY}\{game_id}");
        let read = |name: &str| self.registry.read_value(scope, &key_path, name);

        let install_dir = normalize_path(&read("path")?)?;
        if !is_valid_install(&install_dir) {
            debug!(game_id, "registered install is empty or gone");
            return None;
        }
        let name = read("gameName")
            .filter(|name| !name.trim().is_empty())
            .or_else(|| folder_name(&install_dir))?;
        if is_skippable(&name, SKIP_PATTERNS) {
            return None;
        }
        let name = clean_game_title(&name);
        if name.is_empty() {
            return None;
        }

        let registered_exe = read("exe")
            .and_then(|raw| normalize_path(&raw))
            .filter(|path| path.is_file());
        Some(DetectedGame {
            name,
            external_id: game_id.to_string(),
            executable_path: registered_exe
                .or_else(|| find_main_executable(&install_dir, LAUNCHER_HELPERS)),
            install_path: install_dir,
            launch_command: Some(format!("goggalaxy://openGameView/{game_id}")),
        })
    }
}

impl LauncherDetector for GogGalaxyDetector {
    fn launcher_type(&self) -> LauncherType {
        LauncherType::GOGGalaxy
    }

    fn install_path(&self) -> Option<PathBuf> {
        let defaults = [
            self.folders.program_files_x86.join("GOG Galaxy"),
            self.folders.program_files.join("GOG Galaxy"),
        ];
        resolve_install_path(self.registry.as_ref(), INSTALL_PATH_PROBES, &defaults)
    }

    fn detect_games(&self) -> DetectionResult {
        let Some(install_path) = self.install_path() else {
            return DetectionResult::not_installed("GOG Galaxy installation not found");
        };

        let mut result = DetectionResult::installed(install_path);
        for &scope in GAME_SCOPES {
            for game_id in self.registry.subkey_names(scope, GAMES_KEY) {
                if let Some(game) = self.game_from_registry(scope, &game_id) {
                    push_unique_id(&mut result.games, game);
                }
            }
        }

        info!("-> Total {} GOG games cached.", result.games.len());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::MemoryRegistry;
    use std::fs;
    use std::path::Path;

    fn register(
        registry: MemoryRegistry,
        scope: RegistryScope,
        id: &str,
        name: &str,
        dir: &Path,
    ) -> MemoryRegistry {
        let key = format!(r"{GAMES_KEY}\{id}");
        registry
            .with_value(scope, &key, "gameName", name)
            .with_value(scope, &key, "path", dir.to_string_lossy())
            .with_value(scope, &key, "exe", dir.join("bin").join("game.exe").to_string_lossy())
    }

    #[test]
    fn registered_games_are_listed_once() {
        let dir = tempfile::tempdir().unwrap();
        let client = dir.path().join("GOG Galaxy");
        fs::create_dir_all(&client).unwrap();
        let witcher = dir.path().join("Games").join("The Witcher 3");
        fs::create_dir_all(witcher.join("bin")).unwrap();
        fs::write(witcher.join("bin").join("game.exe"), b"MZ").unwrap();
        let ost = dir.path().join("Games").join("OST");
        fs::create_dir_all(&ost).unwrap();
        fs::write(ost.join("player.exe"), b"MZ").unwrap();

        let registry = MemoryRegistry::new().with_value(
            RegistryScope::Machine32,
            CLIENT_PATHS_KEY,
            "client",
            client.to_string_lossy(),
        );
        let registry = register(registry, RegistryScope::Machine32, "1207664643", "The Witcher 3: Wild Hunt", &witcher);
        let registry = register(registry, RegistryScope::Machine64, "1207664643", "Duplicate", &witcher);
        let registry = register(registry, RegistryScope::Machine32, "1", "The Witcher 3 Soundtrack", &ost);

        let detector = GogGalaxyDetector::new(Arc::new(registry), KnownFolders::rooted_at(dir.path()));
        let result = detector.detect_games();

        assert_eq!(result.install_path, Some(client));
        assert_eq!(result.games.len(), 1);
        let game = &result.games[0];
        assert_eq!(game.name, "The Witcher 3: Wild Hunt");
        assert_eq!(game.executable_path, Some(witcher.join("bin").join("game.exe")));
        assert_eq!(game.launch_command.as_deref(), Some("goggalaxy://openGameView/1207664643"));
    }

    #[test]
    fn missing_client_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let detector = GogGalaxyDetector::new(Arc::new(MemoryRegistry::new()), KnownFolders::rooted_at(dir.path()));
        assert!(!detector.detect_games().is_installed);
    }
}
