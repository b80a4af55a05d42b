use launcher_detect::config::KnownFolders;
use launcher_detect::detectors::{LauncherDetector, UbisoftConnectDetector};
use launcher_detect::evidence::{MemoryRegistry, RegistryScope};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const INSTALLS: &str = r"SOFTWARE\Ubisoft\Launcher\Installs";

fn write_exe(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), b"MZ").unwrap();
}

fn default_launcher_dir(root: &Path) -> PathBuf {
    root.join("Program Files (x86)")
        .join("Ubisoft")
        .join("Ubisoft Game Launcher")
}

fn register(registry: MemoryRegistry, id: &str, dir: &Path) -> MemoryRegistry {
    registry.with_value(
        RegistryScope::Machine32,
        &format!(r"{INSTALLS}\{id}"),
        "InstallDir",
        dir.to_string_lossy().replace('\\', "/"),
    )
}

#[test]
fn registry_and_folder_sources_merge_into_one_catalog() {
    let root = tempfile::tempdir().unwrap();
    let launcher = default_launcher_dir(root.path());
    fs::create_dir_all(&launcher).unwrap();

    let siege = root.path().join("Library").join("Tom Clancy's Rainbow Six Siege");
    let far_cry = root.path().join("Library").join("Far Cry 6");
    write_exe(&siege, "RainbowSix.exe");
    write_exe(&far_cry, "FarCry6.exe");
    write_exe(&launcher.join("games").join("Brawlhalla"), "Brawlhalla.exe");

    let registry = register(MemoryRegistry::new(), "635", &siege);
    let registry = register(registry, "4923", &far_cry);
    let detector =
        UbisoftConnectDetector::new(Arc::new(registry), KnownFolders::rooted_at(root.path()));

    let result = detector.detect_games();

    assert!(result.is_installed);
    assert_eq!(result.install_path, Some(launcher.clone()));
    assert_eq!(result.error_message, None);
    assert_eq!(result.games.len(), 3);

    let ids: Vec<_> = result.games.iter().map(|g| g.external_id.as_str()).collect();
    assert_eq!(ids, ["4923", "635", "Brawlhalla"]);

    let siege_game = &result.games[1];
    assert_eq!(siege_game.name, "Tom Clancy's Rainbow Six Siege");
    assert_eq!(siege_game.launch_command.as_deref(), Some("uplay://launch/635/0"));
    assert_eq!(result.games[0].name, "Far Cry 6");

    let brawlhalla = &result.games[2];
    assert_eq!(brawlhalla.name, "Brawlhalla");
    assert_eq!(brawlhalla.install_path, launcher.join("games").join("Brawlhalla"));
    assert_eq!(
        brawlhalla.executable_path,
        Some(launcher.join("games").join("Brawlhalla").join("Brawlhalla.exe"))
    );
}

#[test]
fn folder_copy_of_a_registered_game_is_not_listed_twice() {
    let root = tempfile::tempdir().unwrap();
    let launcher = default_launcher_dir(root.path());
    let games = launcher.join("games");
    // Registered under a numeric folder, so its name comes from the
    // known-title table.
    let far_cry_dir = games.join("4923");
    write_exe(&far_cry_dir, "FarCry6.exe");
    // The configured games folder holds the same title at another path.
    write_exe(&root.path().join("Other").join("Far Cry 6"), "FarCry6.exe");
    let settings = root.path().join("AppData").join("Local").join("Ubisoft Game Launcher");
    fs::create_dir_all(&settings).unwrap();
    fs::write(
        settings.join("settings.yaml"),
        format!(
            "misc:\n  game_installation_path: {}\n",
            root.path().join("Other").to_string_lossy().replace('\\', "/")
        ),
    )
    .unwrap();
    fs::create_dir_all(&launcher).unwrap();

    let registry = register(MemoryRegistry::new(), "4923", &far_cry_dir);
    let detector =
        UbisoftConnectDetector::new(Arc::new(registry), KnownFolders::rooted_at(root.path()));

    let result = detector.detect_games();
    assert_eq!(result.games.len(), 1);
    assert_eq!(result.games[0].name, "Far Cry 6");
    assert_eq!(result.games[0].external_id, "4923");
    assert_eq!(result.games[0].install_path, far_cry_dir);
}

#[test]
fn nothing_installed_reports_not_installed() {
    let root = tempfile::tempdir().unwrap();
    let detector =
        UbisoftConnectDetector::new(Arc::new(MemoryRegistry::new()), KnownFolders::rooted_at(root.path()));

    assert!(!detector.is_installed());
    assert_eq!(detector.install_path(), None);

    let result = detector.detect_games();
    assert!(!result.is_installed);
    assert_eq!(result.install_path, None);
    assert!(result.error_message.as_deref().is_some_and(|m| !m.is_empty()));
    assert!(result.games.is_empty());
}

#[test]
fn unparseable_settings_fall_back_to_default_games_folder() {
    let root = tempfile::tempdir().unwrap();
    let launcher = default_launcher_dir(root.path());
    write_exe(&launcher.join("games").join("Trackmania"), "Trackmania.exe");
    let settings = root.path().join("AppData").join("Local").join("Ubisoft Game Launcher");
    fs::create_dir_all(&settings).unwrap();
    fs::write(settings.join("settings.yaml"), "game_installation_path: Z:/does/not/exist\n").unwrap();

    let detector =
        UbisoftConnectDetector::new(Arc::new(MemoryRegistry::new()), KnownFolders::rooted_at(root.path()));

    let result = detector.detect_games();
    assert!(result.is_installed);
    assert_eq!(result.games.len(), 1);
    assert_eq!(result.games[0].external_id, "Trackmania");
}

#[test]
fn no_two_games_share_name_and_install_path() {
    let root = tempfile::tempdir().unwrap();
    let launcher = default_launcher_dir(root.path());
    let games = launcher.join("games");
    let far_cry = games.join("Far Cry 5");
    write_exe(&far_cry, "FarCry5.exe");
    write_exe(&games.join("Anno 1800"), "Anno1800.exe");

    // Base game and its add-on are both registered against one folder.
    let registry = register(MemoryRegistry::new(), "720", &far_cry);
    let registry = register(registry, "3088", &far_cry);
    let detector =
        UbisoftConnectDetector::new(Arc::new(registry), KnownFolders::rooted_at(root.path()));

    let result = detector.detect_games();
    assert_eq!(result.games.len(), 2);
    for (i, a) in result.games.iter().enumerate() {
        for b in &result.games[i + 1..] {
            assert_ne!(a.external_id, b.external_id);
            let same_name = a.name.to_lowercase() == b.name.to_lowercase();
            let same_path = a.install_path.to_string_lossy().to_lowercase()
                == b.install_path.to_string_lossy().to_lowercase();
            assert!(!(same_name && same_path), "{a:?} duplicates {b:?}");
        }
    }
}

#[cfg(unix)]
#[test]
fn linked_game_folder_is_scanned() {
    let root = tempfile::tempdir().unwrap();
    let launcher = default_launcher_dir(root.path());
    let games = launcher.join("games");
    fs::create_dir_all(&games).unwrap();
    let moved = root.path().join("D").join("Trackmania");
    write_exe(&moved, "Trackmania.exe");
    std::os::unix::fs::symlink(&moved, games.join("Trackmania")).unwrap();

    let detector =
        UbisoftConnectDetector::new(Arc::new(MemoryRegistry::new()), KnownFolders::rooted_at(root.path()));

    let result = detector.detect_games();
    assert!(result.is_installed);
    assert_eq!(result.games.len(), 1);
    assert_eq!(result.games[0].name, "Trackmania");
    assert_eq!(result.games[0].install_path, games.join("Trackmania"));
    assert_eq!(
        result.games[0].executable_path,
        Some(games.join("Trackmania").join("Trackmania.exe"))
    );
}
