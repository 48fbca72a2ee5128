use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by a remote backend.
///
/// `NotFound`, `Conflict` and `PreconditionFailed` are the outcomes the
/// reconciler reacts to; everything else is `Service` and is fatal.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// The resource does not exist.
  #[error("{resource} not found")]
  NotFound { resource: String },

  /// The resource or statement already exists.
  #[error("conflict: {message}")]
  Conflict { message: String },

  /// A conditional write was rejected because the concurrency token is stale.
  #[error("precondition failed: {message}")]
  PreconditionFailed { message: String },

  #[error("{operation} failed: {message}")]
  Service {
    operation: &'static str,
    message: String,
    #[source]
    source: Option<BoxError>,
  },
}

impl RemoteError {
  pub fn not_found(resource: impl Into<String>) -> Self {
    RemoteError::NotFound {
      resource: resource.into(),
    }
  }

  pub fn service<E>(operation: &'static str, message: impl Into<String>, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    RemoteError::Service {
      operation,
      message: message.into(),
      source: Some(Box::new(source)),
    }
  }

  /// A service failure with no underlying error value, e.g. a malformed response.
  pub fn malformed(operation: &'static str, message: impl Into<String>) -> Self {
    RemoteError::Service {
      operation,
      message: message.into(),
      source: None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, RemoteError::NotFound { .. })
  }
}
