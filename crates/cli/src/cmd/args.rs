//! Arguments shared between commands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use edgebind_lib::manifest::BuildManifests;
use edgebind_lib::reconcile::{PollPolicy, ReconcileConfig, default_scratch_dir};

/// Where the build manifests are read from.
#[derive(Args, Debug)]
pub struct ManifestArgs {
  /// Build output directory containing the manifests
  #[arg(long, env = "EDGEBIND_BUILD_DIR", default_value = ".next")]
  pub build_dir: PathBuf,

  /// Explicit routes manifest, instead of looking in the build directory
  #[arg(long, requires = "pages_manifest")]
  pub routes_manifest: Option<PathBuf>,

  /// Explicit pages manifest, instead of looking in the build directory
  #[arg(long, requires = "routes_manifest")]
  pub pages_manifest: Option<PathBuf>,
}

impl ManifestArgs {
  pub fn load(&self) -> Result<BuildManifests> {
    match (&self.routes_manifest, &self.pages_manifest) {
      (Some(routes), Some(pages)) => BuildManifests::from_files(routes, pages).context("Failed to load build manifests"),
      _ => BuildManifests::from_build_dir(&self.build_dir)
        .with_context(|| format!("Failed to load build manifests from {}", self.build_dir.display())),
    }
  }
}

/// The remote resources a run works on.
#[derive(Args, Debug)]
pub struct TargetArgs {
  /// Distribution to bind the function to
  #[arg(long, env = "EDGEBIND_DISTRIBUTION_ID")]
  pub distribution_id: String,

  /// Execution role for the function
  #[arg(long, env = "EDGEBIND_ROLE_ARN")]
  pub role_arn: String,

  /// Function name prefix; "-edge-router" is appended
  #[arg(long, env = "EDGEBIND_FUNCTION_PREFIX")]
  pub function_prefix: String,

  /// Path pattern to invalidate when the function is unchanged (e.g. "/*")
  #[arg(long, env = "EDGEBIND_INVALIDATION_PATH")]
  pub invalidation_path: Option<String>,

  /// Run identifier (default: current time in milliseconds)
  #[arg(long, env = "EDGEBIND_RUN_ID")]
  pub run_id: Option<String>,

  /// Named AWS profile to load credentials from
  #[arg(long)]
  pub profile: Option<String>,
}

impl TargetArgs {
  pub fn config(&self) -> ReconcileConfig {
    let mut config = ReconcileConfig::new(&self.distribution_id, &self.role_arn, &self.function_prefix);
    config.invalidation_path = self.invalidation_path.clone();
    if let Some(run_id) = &self.run_id {
      config.scratch_dir = default_scratch_dir(&config.function_name(), run_id);
      config.run_id = run_id.clone();
    }
    config
  }
}

/// How long to wait for remote changes to settle.
#[derive(Args, Debug)]
pub struct WaitArgs {
  /// Do not wait for the distribution to finish deploying
  #[arg(long)]
  pub no_wait: bool,

  /// Interval between function status polls
  #[arg(long, value_parser = humantime::parse_duration, default_value = "1s")]
  pub function_poll_interval: Duration,

  /// Give up waiting for the function after this long
  #[arg(long, value_parser = humantime::parse_duration, default_value = "10m")]
  pub function_timeout: Duration,

  /// Interval between distribution status polls
  #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
  pub distribution_poll_interval: Duration,

  /// Give up waiting for the distribution after this long
  #[arg(long, value_parser = humantime::parse_duration, default_value = "30m")]
  pub distribution_timeout: Duration,

  /// Wait without any time limit
  #[arg(long, conflicts_with_all = ["function_timeout", "distribution_timeout"])]
  pub no_timeout: bool,
}

impl WaitArgs {
  pub fn apply_to(&self, config: &mut ReconcileConfig) {
    config.wait_for_deployment = !self.no_wait;
    config.function_wait = self.policy(self.function_poll_interval, self.function_timeout);
    config.distribution_wait = self.policy(self.distribution_poll_interval, self.distribution_timeout);
  }

  fn policy(&self, interval: Duration, timeout: Duration) -> PollPolicy {
    PollPolicy::new(interval, (!self.no_timeout).then_some(timeout))
  }
}
