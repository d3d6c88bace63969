/// Convenience result type used across Tessera.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TesseraError {
    /// Invalid caller-provided geometry, buffers or document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A compositing invariant was broken by the caller (not recoverable).
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Tile or scratch storage could not be allocated.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesseraError {
    /// Build a [`TesseraError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TesseraError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Build a [`TesseraError::ResourceExhausted`] value.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Build a [`TesseraError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error came from an allocation failure.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted(_))
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Allocate a zeroed byte buffer, reporting allocation failure instead of aborting.
pub(crate) fn try_alloc_zeroed(len: usize, what: &str) -> TesseraResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| {
        TesseraError::resource_exhausted(format!("{what}: cannot allocate {len} bytes"))
    })?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
