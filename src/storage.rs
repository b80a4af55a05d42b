use crate::error::ConfigError;
use crate::models::{DetectionResult, LauncherType};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::to_string_pretty;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize, Debug)]
struct CatalogSnapshot<'a> {
    generated_at: DateTime<Local>,
    total_games: usize,
    launchers: Vec<LauncherEntry<'a>>,
}

#[derive(Serialize, Debug)]
struct LauncherEntry<'a> {
    launcher_type: LauncherType,
    display_name: &'static str,
    #[serde(flatten)]
    result: &'a DetectionResult,
}

pub fn write_snapshot(
    path: &Path,
    results: &[(LauncherType, DetectionResult)],
) -> Result<(), ConfigError> {
    let snapshot = CatalogSnapshot {
        generated_at: Local::now(),
        total_games: results.iter().map(|(_, result)| result.games.len()).sum(),
        launchers: results
            .iter()
            .map(|(launcher, result)| LauncherEntry {
                launcher_type: *launcher,
                display_name: launcher.display_name(),
                result,
            })
            .collect(),
    };

    let json_data = to_string_pretty(&snapshot).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(json_data.as_bytes()).map_err(io_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectedGame;
    use std::path::PathBuf;

    #[test]
    fn snapshot_lists_every_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("catalog.json");
        let mut steam = DetectionResult::installed(PathBuf::from("Steam"));
        steam.games.push(DetectedGame {
            name: "Portal 2".into(),
            external_id: "620".into(),
            install_path: PathBuf::from("Portal 2"),
            executable_path: None,
            launch_command: Some("steam://rungameid/620".into()),
        });
        let results = vec![
            (LauncherType::Steam, steam),
            (
                LauncherType::GOGGalaxy,
                DetectionResult::not_installed("GOG Galaxy installation not found"),
            ),
        ];

        write_snapshot(&out, &results).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["total_games"], 1);
        assert!(written["generated_at"].is_string());
        let launchers = written["launchers"].as_array().unwrap();
        assert_eq!(launchers.len(), 2);
        assert_eq!(launchers[0]["launcher_type"], "Steam");
        assert_eq!(launchers[0]["is_installed"], true);
        assert_eq!(launchers[0]["games"][0]["external_id"], "620");
        assert_eq!(launchers[1]["display_name"], "GOG Galaxy");
        assert_eq!(launchers[1]["error_message"], "GOG Galaxy installation not found");
    }

    #[test]
    fn unwritable_target_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("catalog.json");
        let err = write_snapshot(&out, &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
