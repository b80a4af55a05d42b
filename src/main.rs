use clap::Parser;
use launcher_detect::config::DetectorConfig;
use launcher_detect::detectors::{detect_installed, scan_all, DetectorRegistry};
use launcher_detect::evidence::system_registry;
use launcher_detect::models::LauncherType;
use launcher_detect::storage::write_snapshot;
use std::path::PathBuf;
use tracing::{info, warn};

/// Finds installed game launchers and the games they manage.
#[derive(Parser, Debug)]
#[command(name = "launcher-scan", version)]
struct Args {
    /// JSON file with folder overrides and a launcher filter
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where the catalog snapshot is written
    #[arg(short, long, default_value = "launcher_catalog.json")]
    out: PathBuf,

    /// Only scan these launchers (repeatable), e.g. `--launcher steam`
    #[arg(short, long, value_parser = parse_launcher)]
    launcher: Vec<LauncherType>,

    /// Report which launchers are installed without scanning games
    #[arg(long)]
    installed_only: bool,
}

fn parse_launcher(raw: &str) -> Result<LauncherType, String> {
    let wanted: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    LauncherType::ALL
        .into_iter()
        .find(|launcher| {
            let variant = format!("{launcher:?}").to_lowercase();
            let display: String = launcher
                .display_name()
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            wanted == variant || wanted == display
        })
        .ok_or_else(|| format!("unknown launcher '{raw}'"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => DetectorConfig::load(path)?,
        None => DetectorConfig::default(),
    };
    if !args.launcher.is_empty() {
        config.launchers = args.launcher.clone();
    }

    let detectors = DetectorRegistry::with_defaults(&config, system_registry());
    if detectors.is_empty() {
        warn!("No detector matches the requested launchers.");
        return Ok(());
    }

    if args.installed_only {
        for status in detect_installed(&detectors) {
            let launcher = status.launcher_type;
            match &status.install_path {
                Some(path) => match launcher.open_command() {
                    Some(open) => println!("{launcher}: installed at {} (open with {open})", path.display()),
                    None => println!("{launcher}: installed at {}", path.display()),
                },
                None => println!("{launcher}: not installed"),
            }
        }
        return Ok(());
    }

    info!("Scanning {} launchers...", detectors.len());
    let results = scan_all(&detectors);
    for (launcher, result) in &results {
        if !result.is_installed {
            continue;
        }
        println!("{launcher}: {} games", result.games.len());
        for game in &result.games {
            println!("  {} [{}]", game.name, game.external_id);
        }
    }

    if let Err(err) = write_snapshot(&args.out, &results) {
        warn!("Could not write catalog snapshot: {err}");
        return Err(err.into());
    }
    info!("Catalog written to {}", args.out.display());
    Ok(())
}
