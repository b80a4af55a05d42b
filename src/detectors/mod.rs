pub mod epic;
pub mod gog;
pub mod steam;
pub mod ubisoft;

pub use epic::EpicGamesDetector;
pub use gog::GogGalaxyDetector;
pub use steam::SteamDetector;
pub use ubisoft::UbisoftConnectDetector;

use crate::config::DetectorConfig;
use crate::evidence::{normalize_path, RegistryReader, RegistryScope};
use crate::models::{DetectionResult, LauncherType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// What every platform detector answers. All methods are read-only and
/// total: failures inside a detector show up as absence, never as errors.
pub trait LauncherDetector: Send + Sync {
    fn launcher_type(&self) -> LauncherType;

    fn launcher_name(&self) -> &'static str {
        self.launcher_type().display_name()
    }

    /// Root folder of the launcher client, if it can be found.
    fn install_path(&self) -> Option<PathBuf>;

    fn is_installed(&self) -> bool {
        self.install_path().is_some()
    }

    /// Full scan of the games this launcher manages.
    fn detect_games(&self) -> DetectionResult;
}

/// One registry location that may hold a folder path.
#[derive(Debug, Clone, Copy)]
pub struct RegistryProbe {
    pub scope: RegistryScope,
    pub key_path: &'static str,
    pub value_name: &'static str,
}

/// First probe, then first default, that names an existing directory.
pub fn resolve_install_path(
    registry: &dyn RegistryReader,
    probes: &[RegistryProbe],
    defaults: &[PathBuf],
) -> Option<PathBuf> {
    let from_registry = probes.iter().find_map(|probe| {
        let raw = registry.read_value(probe.scope, probe.key_path, probe.value_name)?;
        let path = normalize_path(&raw)?;
        if path.is_dir() {
            Some(path)
        } else {
            debug!(path = %path.display(), key = probe.key_path, "registered path does not exist");
            None
        }
    });
    from_registry.or_else(|| defaults.iter().find(|path| path.is_dir()).cloned())
}

/// True if `name` contains any of `patterns` (lowercase), marking a DLC,
/// soundtrack or other non-game entry.
pub fn is_skippable(name: &str, patterns: &[&str]) -> bool {
    let lower = name.to_lowercase();
    patterns.iter().any(|pattern| lower.contains(pattern))
}

/// Maps each platform to its detector.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn LauncherDetector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in detector the config asks for, in `LauncherType::ALL`
    /// order.
    pub fn with_defaults(config: &DetectorConfig, registry: Arc<dyn RegistryReader>) -> Self {
        let mut detectors = Self::new();
        let folders = &config.folders;
        for launcher in LauncherType::ALL {
            if !config.wants(launcher) {
                continue;
            }
            let detector: Box<dyn LauncherDetector> = match launcher {
                LauncherType::Steam => {
                    Box::new(SteamDetector::new(registry.clone(), folders.clone()))
                }
                LauncherType::EpicGames => {
                    Box::new(EpicGamesDetector::new(registry.clone(), folders.clone()))
                }
                LauncherType::UbisoftConnect => {
                    Box::new(UbisoftConnectDetector::new(registry.clone(), folders.clone()))
                }
                LauncherType::GOGGalaxy => {
                    Box::new(GogGalaxyDetector::new(registry.clone(), folders.clone()))
                }
                _ => continue,
            };
            detectors.register(detector);
        }
        detectors
    }

    /// Adds a detector, replacing any earlier one for the same platform.
    pub fn register(&mut self, detector: Box<dyn LauncherDetector>) {
        let launcher = detector.launcher_type();
        match self
            .detectors
            .iter_mut()
            .find(|existing| existing.launcher_type() == launcher)
        {
            Some(slot) => *slot = detector,
            None => self.detectors.push(detector),
        }
    }

    pub fn get(&self, launcher: LauncherType) -> Option<&dyn LauncherDetector> {
        self.detectors
            .iter()
            .find(|detector| detector.launcher_type() == launcher)
            .map(|detector| detector.as_ref())
    }

    pub fn launcher_types(&self) -> Vec<LauncherType> {
        self.detectors.iter().map(|d| d.launcher_type()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn LauncherDetector> {
        self.detectors.iter().map(|detector| detector.as_ref())
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LauncherStatus {
    pub launcher_type: LauncherType,
    pub is_installed: bool,
    pub install_path: Option<PathBuf>,
}

/// Runs `job` for every detector on its own thread and returns the results
/// in registry order. A detector that panics yields `on_panic`.
fn fan_out<T, F, P>(detectors: &DetectorRegistry, job: F, on_panic: P) -> Vec<(LauncherType, T)>
where
    T: Send,
    F: Fn(&dyn LauncherDetector) -> T + Sync,
    P: Fn(LauncherType) -> T,
{
    thread::scope(|scope| {
        let job = &job;
        let handles: Vec<_> = detectors
            .iter()
            .map(|detector| {
                (
                    detector.launcher_type(),
                    scope.spawn(move || job(detector)),
                )
            })
            .collect();
        handles
            .into_iter()
            .map(|(launcher, handle)| {
                let value = handle.join().unwrap_or_else(|_| on_panic(launcher));
                (launcher, value)
            })
            .collect()
    })
}

/// Which launchers are present on this machine.
pub fn detect_installed(detectors: &DetectorRegistry) -> Vec<LauncherStatus> {
    fan_out(
        detectors,
        |detector| {
            let install_path = detector.install_path();
            LauncherStatus {
                launcher_type: detector.launcher_type(),
                is_installed: install_path.is_some(),
                install_path,
            }
        },
        |launcher| LauncherStatus {
            launcher_type: launcher,
            is_installed: false,
            install_path: None,
        },
    )
    .into_iter()
    .map(|(_, status)| status)
    .collect()
}

/// Game scan of every registered launcher.
pub fn scan_all(detectors: &DetectorRegistry) -> Vec<(LauncherType, DetectionResult)> {
    let results = fan_out(
        detectors,
        |detector| detector.detect_games(),
        |launcher| DetectionResult::not_installed(format!("{launcher} detection failed")),
    );
    for (launcher, result) in &results {
        info!(launcher = %launcher, games = result.games.len(), installed = result.is_installed, "scan finished");
    }
    results
}
