use launcher_detect::config::{DetectorConfig, KnownFolders};
use launcher_detect::evidence::{MemoryRegistry, RegistryScope};
use launcher_detect::storage::write_snapshot;
use launcher_detect::{detect_installed, scan_all, DetectorRegistry, LauncherType};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn write_exe(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), b"MZ").unwrap();
}

fn config(root: &Path) -> DetectorConfig {
    DetectorConfig {
        folders: KnownFolders::rooted_at(root),
        launchers: Vec::new(),
    }
}

#[test]
fn scan_reports_every_platform_in_order() {
    let root = tempfile::tempdir().unwrap();
    let steamapps = root.path().join("Program Files (x86)").join("Steam").join("steamapps");
    write_exe(&steamapps.join("common").join("Portal 2"), "portal2.exe");
    fs::write(
        steamapps.join("appmanifest_620.acf"),
        "\"AppState\"\n{\n\t\"appid\"\t\t\"620\"\n\t\"name\"\t\t\"Portal 2\"\n\t\"installdir\"\t\t\"Portal 2\"\n}\n",
    )
    .unwrap();

    let gog = root.path().join("Program Files (x86)").join("GOG Galaxy");
    fs::create_dir_all(&gog).unwrap();
    let witcher = root.path().join("GOG Games").join("The Witcher");
    write_exe(&witcher, "witcher.exe");
    let registry = MemoryRegistry::new()
        .with_value(RegistryScope::Machine32, r"SOFTWARE\GOG.com\Games\1207658924", "gameName", "The Witcher")
        .with_value(
            RegistryScope::Machine32,
            r"SOFTWARE\GOG.com\Games\1207658924",
            "path",
            witcher.to_string_lossy(),
        );

    let detectors = DetectorRegistry::with_defaults(&config(root.path()), Arc::new(registry));
    let results = scan_all(&detectors);

    let launchers: Vec<_> = results.iter().map(|(launcher, _)| *launcher).collect();
    assert_eq!(
        launchers,
        [
            LauncherType::Steam,
            LauncherType::EpicGames,
            LauncherType::UbisoftConnect,
            LauncherType::GOGGalaxy
        ]
    );

    let (_, steam) = &results[0];
    assert!(steam.is_installed);
    assert_eq!(steam.games[0].external_id, "620");
    let (_, epic) = &results[1];
    assert!(!epic.is_installed);
    assert!(epic.error_message.is_some());
    let (_, gog_result) = &results[3];
    assert_eq!(gog_result.games.len(), 1);
    assert_eq!(gog_result.games[0].name, "The Witcher");
    assert_eq!(gog_result.games[0].executable_path, Some(witcher.join("witcher.exe")));

    let out = root.path().join("catalog.json");
    write_snapshot(&out, &results).unwrap();
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["total_games"], 2);
    assert_eq!(written["launchers"].as_array().unwrap().len(), 4);
}

#[test]
fn installed_check_follows_launcher_filter() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("Program Files").join("Steam")).unwrap();
    let mut config = config(root.path());
    config.launchers = vec![LauncherType::Steam, LauncherType::RiotGames];

    let detectors = DetectorRegistry::with_defaults(&config, Arc::new(MemoryRegistry::new()));
    let statuses = detect_installed(&detectors);

    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].launcher_type, LauncherType::Steam);
    assert!(statuses[0].is_installed);
    assert_eq!(statuses[0].install_path, Some(root.path().join("Program Files").join("Steam")));
}
