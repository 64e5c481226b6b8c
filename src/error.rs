use std::io;

/* ---------- */

/// Errors returned when configuring or starting a [`Coordinator`].
///
/// [`Coordinator`]: crate::Coordinator
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker thread could not be spawned.
    #[error("failed to start a worker thread")]
    ThreadStart(#[source] io::Error),

    /// The termination signal handlers could not be installed.
    #[error("failed to register signal handlers")]
    Signal(#[source] io::Error),
}

impl Error {
    #[inline]
    pub(crate) fn invalid<T: ToString>(msg: T) -> Self {
        Self::InvalidConfiguration(msg.to_string())
    }
}

/* ---------- */

/// Errors returned when loading a [`Config`] from a file.
///
/// [`Config`]: crate::Config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read '{path}'")]
    Read {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file isn't valid TOML or doesn't match the expected layout.
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

/* ---------- */

/// Returned by blocking operations interrupted by a shutdown request.
///
/// This isn't a failure: workers receiving it simply leave their loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled by shutdown")]
pub struct Cancelled;
