//! Run configuration.
//!
//! Everything a run needs is passed in through [`ReconcileConfig`]; the
//! library never reads identifiers from the environment itself.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use crate::consts::{APP_NAME, FUNCTION_NAME_SUFFIX, MAX_FUNCTION_NAME_LEN};

use super::wait::PollPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("{0} must not be empty")]
  Empty(&'static str),

  #[error("function name '{name}' is invalid: {reason}")]
  InvalidFunctionName { name: String, reason: &'static str },

  #[error("invalidation path '{0}' must start with '/'")]
  InvalidInvalidationPath(String),

  #[error("poll interval must be greater than zero")]
  ZeroPollInterval,
}

/// Inputs of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileConfig {
  /// Distribution whose default behavior gets the function.
  pub distribution_id: String,

  /// Execution role assumed by the function.
  pub role_arn: String,

  /// Prefix of the function name; the fixed suffix is appended.
  pub function_prefix: String,

  /// Path pattern to invalidate when the function is unchanged.
  pub invalidation_path: Option<String>,

  /// Wait for the distribution to finish deploying after an update.
  pub wait_for_deployment: bool,

  /// Identifies this run. Names the scratch directory and makes
  /// invalidation requests unique.
  pub run_id: String,

  /// Where the payload is written. Must be private to this run.
  pub scratch_dir: PathBuf,

  pub function_wait: PollPolicy,
  pub distribution_wait: PollPolicy,
}

impl ReconcileConfig {
  /// Configuration with default run id, scratch directory and poll policies.
  pub fn new(
    distribution_id: impl Into<String>,
    role_arn: impl Into<String>,
    function_prefix: impl Into<String>,
  ) -> Self {
    let function_prefix = function_prefix.into();
    let run_id = default_run_id();
    let scratch_dir = default_scratch_dir(&format!("{}{}", function_prefix, FUNCTION_NAME_SUFFIX), &run_id);

    Self {
      distribution_id: distribution_id.into(),
      role_arn: role_arn.into(),
      function_prefix,
      invalidation_path: None,
      wait_for_deployment: true,
      run_id,
      scratch_dir,
      function_wait: PollPolicy::function_default(),
      distribution_wait: PollPolicy::distribution_default(),
    }
  }

  /// The remote function's name: prefix plus the fixed suffix.
  pub fn function_name(&self) -> String {
    format!("{}{}", self.function_prefix, FUNCTION_NAME_SUFFIX)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.distribution_id.trim().is_empty() {
      return Err(ConfigError::Empty("distribution id"));
    }
    if self.role_arn.trim().is_empty() {
      return Err(ConfigError::Empty("role ARN"));
    }
    if self.function_prefix.is_empty() {
      return Err(ConfigError::Empty("function prefix"));
    }
    if self.run_id.trim().is_empty() {
      return Err(ConfigError::Empty("run id"));
    }

    let name = self.function_name();
    if name.len() > MAX_FUNCTION_NAME_LEN {
      return Err(ConfigError::InvalidFunctionName {
        name,
        reason: "longer than 64 characters",
      });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
      return Err(ConfigError::InvalidFunctionName {
        name,
        reason: "only letters, digits, '-' and '_' are allowed",
      });
    }

    if let Some(path) = &self.invalidation_path {
      if !path.starts_with('/') {
        return Err(ConfigError::InvalidInvalidationPath(path.clone()));
      }
    }

    if self.function_wait.interval.is_zero() || self.distribution_wait.interval.is_zero() {
      return Err(ConfigError::ZeroPollInterval);
    }

    Ok(())
  }
}

/// Milliseconds since the unix epoch.
pub fn default_run_id() -> String {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis())
    .unwrap_or(0)
    .to_string()
}

/// `<tmp>/edgebind/<function name>-<run id>`
pub fn default_scratch_dir(function_name: &str, run_id: &str) -> PathBuf {
  std::env::temp_dir()
    .join(APP_NAME)
    .join(format!("{}-{}", function_name, run_id))
}
