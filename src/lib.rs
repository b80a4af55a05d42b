//! Finds installed game launchers on a Windows machine and enumerates the
//! games each one manages, from registry entries, launcher config files and
//! conventional install folders.
//!
//! Every probe is fail-soft: a missing key, unreadable file or malformed
//! manifest only shrinks the result.

pub mod config;
pub mod detectors;
pub mod error;
pub mod evidence;
pub mod install;
pub mod models;
pub mod reconcile;
pub mod storage;

pub use detectors::{detect_installed, scan_all, DetectorRegistry, LauncherDetector};
pub use models::{DetectedGame, DetectionResult, LauncherType};
