use thiserror::Error;

/// An error to do with process snapshot collection.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The snapshot source failed. This aborts the current tick only; the
    /// scheduler retries on the next one.
    #[error("the process snapshot provider is unavailable: {0}")]
    ProviderUnavailable(#[from] anyhow::Error),
}

impl CollectionError {
    pub fn from_str(msg: &'static str) -> Self {
        Self::ProviderUnavailable(anyhow::anyhow!(msg))
    }
}

/// A [`Result`] with the error type being a [`CollectionError`].
pub type CollectionResult<T> = Result<T, CollectionError>;
