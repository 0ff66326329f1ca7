use arcstr::ArcStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or self-contradictory technology or generator parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("pin `{pin}` of module `{module}` has no binding policy")]
    UnclassifiedPin { module: ArcStr, pin: ArcStr },

    #[error("pin `{pin}` not found in module `{module}`")]
    PinNotFound { module: ArcStr, pin: ArcStr },

    #[error(
        "instance `{inst}` of module `{module}` has {found} connections, but `{module}` declares {expected} ports"
    )]
    ConnectionMismatch {
        inst: ArcStr,
        module: ArcStr,
        expected: usize,
        found: usize,
    },

    /// An external command that exited without a code.
    #[error("command `{0}` was terminated by a signal")]
    Terminated(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to (de)serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
