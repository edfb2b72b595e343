use hearth_core::MisuseError;
use hearth_storage::{ReadError, WriteError};

/// A store was set up or driven in a way it does not support.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("a keyed map store needs an object as its initial state, got {found}")]
    NotAMap { found: &'static str },

    #[error("no task named `{name}` is registered")]
    UnknownTask { name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Misuse(#[from] MisuseError),

    /// The snapshot is valid JSON but not the shape the caller asked for.
    #[error("snapshot under `{key}` has an unexpected shape: {source}")]
    Shape {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
