//! Error types shared by the core and the platform backends

use crate::config::ConfigError;

/// Faults that reject an adapter operation
///
/// Expected-empty conditions (no controller, no touches, no key window) are
/// never reported through this type; they come back as zero/default values.
/// Invalid caller input on controller selection is a
/// [`SelectionOutcome`](crate::controller::SelectionOutcome), not an error.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    /// An underlying platform read failed
    #[error("Platform error: {0}")]
    Platform(String),

    /// The UI-affinity executor is gone or dropped the job
    #[error("Executor error: {0}")]
    Executor(String),

    /// Configuration could not be loaded or stored
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = StrataError> = std::result::Result<T, E>;
