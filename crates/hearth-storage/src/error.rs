use std::io;

/// A stored snapshot could not be read back.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The stored document is not valid JSON.
    #[error("malformed snapshot under `{key}`: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend itself failed to produce the document.
    #[error("storage unavailable while reading `{key}`: {source}")]
    Unavailable {
        key: String,
        #[source]
        source: io::Error,
    },
}

impl ReadError {
    pub fn key(&self) -> &str {
        match self {
            ReadError::Malformed { key, .. } | ReadError::Unavailable { key, .. } => key,
        }
    }
}

/// The backend rejected or failed a write or remove.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("quota exceeded writing `{key}`: {requested} bytes requested, {available} available")]
    QuotaExceeded {
        key: String,
        requested: usize,
        available: usize,
    },

    #[error("could not encode snapshot for `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    pub fn key(&self) -> &str {
        match self {
            WriteError::QuotaExceeded { key, .. }
            | WriteError::Encode { key, .. }
            | WriteError::Io { key, .. } => key,
        }
    }
}
