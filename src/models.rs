use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Game-distribution platforms known to the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LauncherType {
    Steam,
    EpicGames,
    EAApp,
    UbisoftConnect,
    GOGGalaxy,
    BattleNet,
    RockstarGames,
    RiotGames,
    Roblox,
    Minecraft,
    Manual,
}

impl LauncherType {
    pub const ALL: [LauncherType; 11] = [
        LauncherType::Steam,
        LauncherType::EpicGames,
        LauncherType::EAApp,
        LauncherType::UbisoftConnect,
        LauncherType::GOGGalaxy,
        LauncherType::BattleNet,
        LauncherType::RockstarGames,
        LauncherType::RiotGames,
        LauncherType::Roblox,
        LauncherType::Minecraft,
        LauncherType::Manual,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            LauncherType::Steam => "Steam",
            LauncherType::EpicGames => "Epic Games",
            LauncherType::EAApp => "EA App",
            LauncherType::UbisoftConnect => "Ubisoft",
            LauncherType::GOGGalaxy => "GOG Galaxy",
            LauncherType::BattleNet => "Battle.net",
            LauncherType::RockstarGames => "Rockstar Games",
            LauncherType::RiotGames => "Riot Games",
            LauncherType::Roblox => "Roblox",
            LauncherType::Minecraft => "Minecraft",
            LauncherType::Manual => "Manual",
        }
    }

    /// Protocol or shell string that opens the launcher itself.
    ///
    /// Launchers that are only reachable through their executable return
    /// `None`; the caller falls back to the detected install path.
    pub fn open_command(self) -> Option<&'static str> {
        match self {
            LauncherType::Steam => Some("steam://open/games"),
            LauncherType::EpicGames => Some("com.epicgames.launcher://"),
            LauncherType::EAApp => Some("origin://"),
            LauncherType::UbisoftConnect => Some("uplay://"),
            LauncherType::Roblox => Some("roblox://"),
            LauncherType::Minecraft => {
                Some(r"shell:AppsFolder\Microsoft.4297127D64EC6_8wekyb3d8bbwe!Minecraft")
            }
            LauncherType::GOGGalaxy
            | LauncherType::BattleNet
            | LauncherType::RockstarGames
            | LauncherType::RiotGames
            | LauncherType::Manual => None,
        }
    }
}

impl fmt::Display for LauncherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One candidate catalog entry produced by a detector.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DetectedGame {
    pub name: String,
    pub external_id: String,
    pub install_path: PathBuf,
    pub executable_path: Option<PathBuf>,
    pub launch_command: Option<String>,
}

/// Outcome of one `detect_games` call for one platform.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResult {
    pub is_installed: bool,
    pub install_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub games: Vec<DetectedGame>,
}

impl DetectionResult {
    pub fn installed(install_path: PathBuf) -> Self {
        Self {
            is_installed: true,
            install_path: Some(install_path),
            error_message: None,
            games: Vec::new(),
        }
    }

    pub fn not_installed(message: impl Into<String>) -> Self {
        Self {
            is_installed: false,
            install_path: None,
            error_message: Some(message.into()),
            games: Vec::new(),
        }
    }
}

/// Strips trademark marks and doubled spaces from a display title.
pub fn clean_game_title(title: &str) -> String {
    let mut cleaned = title.replace(['™', '®'], "");
    while cleaned.contains("  ") {
        cleaned = cleaned.replace("  ", " ");
    }
    cleaned.trim().to_string()
}
