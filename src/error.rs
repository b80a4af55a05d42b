use std::path::PathBuf;

/// Failure while reading one piece of evidence.
///
/// Only the `try_*` registry methods return this; the fail-soft readers
/// turn it into absence before it reaches a detector.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("registry key {path} could not be opened: {source}")]
    OpenKey {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("registry value {path}\\{name} could not be read: {source}")]
    ReadValue {
        path: String,
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure loading configuration or writing a catalog snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
