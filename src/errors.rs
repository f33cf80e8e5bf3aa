//! Crate-wide error type.
//!
//! Fallible APIs return [`Result`], aliased to this module's [`ReviewError`].
//! Only locator resolution and model decoding fail loudly. A loaded model
//! with odd animation data degrades to a static pose instead of erroring,
//! and timeline inputs are repaired where they arrive, so the review session
//! sees errors exclusively through slot polling.

use thiserror::Error;

/// Anything that can go wrong between a locator and a loaded template.
#[derive(Error, Debug)]
pub enum ReviewError {
    // ========================================================================
    // Locator resolution
    // ========================================================================
    /// The locator (or a buffer it references) points at nothing readable.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// File I/O failure.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP transport failure.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The base URL or a derived request URL did not parse.
    #[cfg(feature = "http")]
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// The server answered with a non-success status.
    #[cfg(feature = "http")]
    #[error("HTTP response error: status {status}")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
    },

    // ========================================================================
    // Model decoding
    // ========================================================================
    /// glTF document or buffer layout problem.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),

    /// An embedded `data:` URI without a payload or with an encoding other
    /// than base64.
    #[cfg(feature = "gltf")]
    #[error("Data URI error: {0}")]
    DataUriError(String),

    /// Base64 payload did not decode.
    #[cfg(feature = "gltf")]
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    // ========================================================================
    // Load delivery
    // ========================================================================
    /// A loader task panicked or was cancelled before finishing.
    #[error("Task join error: {0}")]
    TaskJoinError(String),

    /// The load completion channel was dropped before delivering a result.
    #[error("Load interrupted: {0}")]
    LoadInterrupted(String),

    /// The locator needs a loader this build was compiled without.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for ReviewError {
    fn from(err: gltf::Error) -> Self {
        ReviewError::GltfError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ReviewError {
    fn from(err: tokio::task::JoinError) -> Self {
        ReviewError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, ReviewError>`.
pub type Result<T> = std::result::Result<T, ReviewError>;
