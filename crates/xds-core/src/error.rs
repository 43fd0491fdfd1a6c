//! Error types for xDS operations.
//!
//! This module provides [`XdsError`], the error type shared by the snapshot
//! cache and its collaborators. It converts to gRPC status codes so the
//! transport layer can surface cache errors without a second mapping.

/// Error type for xDS cache operations.
///
/// This error type is designed to:
/// - Cover all failure modes without using panics
/// - Properly convert to [`tonic::Status`] for gRPC responses
/// - Carry enough detail to diagnose producer/cache wiring bugs
///
/// # Example
///
/// ```rust
/// use xds_core::XdsError;
///
/// fn check_interval(secs: u64) -> Result<(), XdsError> {
///     if secs == 0 {
///         return Err(XdsError::Configuration("interval must be positive".to_string()));
///     }
///     Ok(())
/// }
///
/// let status: tonic::Status = check_interval(0).unwrap_err().into();
/// assert_eq!(status.code(), tonic::Code::InvalidArgument);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum XdsError {
    /// Type URL does not name a registered resource kind.
    ///
    /// Raised when a type-erased payload is unpacked against a tag the
    /// registry does not know. This signals a wiring or version-skew bug
    /// between the cache and its producer.
    #[error("invalid type URL: {type_url} - {reason}")]
    InvalidTypeUrl {
        /// The invalid type URL.
        type_url: String,
        /// Reason why the type URL is invalid.
        reason: String,
    },

    /// Snapshot references do not match the dependent resources it carries.
    #[error(
        "inconsistent snapshot: {parent_type_url} -> {child_type_url} references [{}] do not match resources [{}]: {reason}",
        .references.join(", "),
        .resources.join(", ")
    )]
    InconsistentSnapshot {
        /// Type URL of the referencing resources.
        parent_type_url: String,
        /// Type URL of the referenced resources.
        child_type_url: String,
        /// Names referenced by the parent resources, sorted.
        references: Vec<String>,
        /// Names of the child resources present, sorted.
        resources: Vec<String>,
        /// What exactly mismatched.
        reason: String,
    },

    /// Protobuf decoding failed.
    #[error("decoding error for {type_url}: {message}")]
    DecodingError {
        /// The type URL being decoded.
        type_url: String,
        /// Error message.
        message: String,
    },

    /// The receiver of a watch response is gone.
    #[error("watch closed: watch_id={watch_id}")]
    WatchClosed {
        /// ID of the closed watch.
        watch_id: u64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl XdsError {
    /// Create a decoding error for a payload of the given type.
    pub fn decoding(type_url: impl Into<String>, err: prost::DecodeError) -> Self {
        Self::DecodingError {
            type_url: type_url.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error signals a bug in how the cache is wired to its
    /// producer rather than a runtime condition.
    pub fn is_integration_error(&self) -> bool {
        matches!(
            self,
            XdsError::InvalidTypeUrl { .. } | XdsError::DecodingError { .. }
        )
    }
}

/// Convert to tonic::Status for gRPC responses.
///
/// This implementation maps each error variant to an appropriate gRPC status code.
impl From<XdsError> for tonic::Status {
    fn from(err: XdsError) -> Self {
        match &err {
            XdsError::InvalidTypeUrl { .. } | XdsError::DecodingError { .. } => {
                tonic::Status::invalid_argument(err.to_string())
            }
            XdsError::InconsistentSnapshot { .. } => {
                tonic::Status::failed_precondition(err.to_string())
            }
            XdsError::WatchClosed { .. } => tonic::Status::cancelled(err.to_string()),
            XdsError::Configuration(_) => tonic::Status::invalid_argument(err.to_string()),
        }
    }
}
