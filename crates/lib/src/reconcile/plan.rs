//! Read-only dry run.
//!
//! Performs the same lookups as a real run and reports what it would change.
//! No mutating call is ever issued and nothing is written to disk.

use serde::Serialize;
use tracing::info;

use crate::manifest::BuildManifests;
use crate::payload::DeployablePayload;
use crate::remote::{DistributionApi, FunctionApi, FunctionAssociation};
use crate::util::hash::ContentDigest;
use crate::consts::PERMISSION_STATEMENT_ID;
use crate::util::redact::redact;

use super::config::ReconcileConfig;
use super::distribution::associations_match;
use super::function::{FunctionPlan, decide, lookup_function};
use super::types::ReconcileError;

/// What would happen to the distribution binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BindingPlan {
  Unchanged,
  /// The current associations would be replaced by one for `target_arn`.
  /// `target_arn` is unknown until the new version is published.
  Replace {
    current: usize,
    target_arn: Option<String>,
  },
}

/// Outcome of a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
  pub function_name: String,
  pub digest: ContentDigest,
  pub payload_size: usize,
  pub function: FunctionPlan,
  pub binding: BindingPlan,
  /// The edge service's invoke grant is missing, or the version is new.
  pub grant_permission: bool,
  /// Path that would be invalidated.
  pub invalidation: Option<String>,
}

impl ReconcilePlan {
  /// True if `apply` would change remote state.
  pub fn has_changes(&self) -> bool {
    !matches!(self.function, FunctionPlan::NoOp { .. })
      || self.binding != BindingPlan::Unchanged
      || self.grant_permission
      || self.invalidation.is_some()
  }
}

pub async fn plan<F, D>(
  config: &ReconcileConfig,
  manifests: &BuildManifests,
  functions: &F,
  distributions: &D,
) -> Result<ReconcilePlan, ReconcileError>
where
  F: FunctionApi + ?Sized,
  D: DistributionApi + ?Sized,
{
  config.validate()?;
  let payload = DeployablePayload::build(manifests)?;
  let function_name = config.function_name();

  let remote = lookup_function(functions, &function_name).await?;
  let function = decide(&payload.digest, remote.as_ref());

  let current = distributions
    .get_distribution_config(&config.distribution_id)
    .await
    .map_err(|source| ReconcileError::RemoteLookup {
      operation: "read distribution config",
      source,
    })?;

  let grant_permission = match &function {
    FunctionPlan::NoOp { version } => !functions
      .has_permission(&version.arn, PERMISSION_STATEMENT_ID)
      .await
      .map_err(|source| ReconcileError::RemoteLookup {
        operation: "read function policy",
        source,
      })?,
    _ => true,
  };

  let (binding, invalidation) = match &function {
    FunctionPlan::NoOp { version } => {
      let desired = FunctionAssociation::origin_request(&version.arn);
      let binding = if associations_match(&current.function_associations, &desired) {
        BindingPlan::Unchanged
      } else {
        BindingPlan::Replace {
          current: current.function_associations.len(),
          target_arn: Some(version.arn.clone()),
        }
      };
      (binding, config.invalidation_path.clone())
    }
    _ => (
      BindingPlan::Replace {
        current: current.function_associations.len(),
        target_arn: None,
      },
      None,
    ),
  };

  let plan = ReconcilePlan {
    function_name,
    digest: payload.digest.clone(),
    payload_size: payload.size(),
    function,
    binding,
    grant_permission,
    invalidation,
  };
  info!(
    function = %plan.function_name,
    distribution = %redact(&config.distribution_id),
    changes = plan.has_changes(),
    "planned reconciliation"
  );
  Ok(plan)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::{PageManifest, RouteEntry, RouteManifest};
  use crate::util::testutil::{FakeDistribution, FakeFunctions};

  const ID: &str = "E2QWRUHAPOMQZL";

  fn config() -> ReconcileConfig {
    ReconcileConfig::new(ID, "arn:aws:iam::123456789012:role/edge", "site")
  }

  fn manifests() -> BuildManifests {
    BuildManifests {
      routes: RouteManifest {
        dynamic_routes: vec![],
        static_routes: vec![RouteEntry::new("/about", "^/about$")],
      },
      pages: [("/about", "pages/about.html")].into_iter().collect::<PageManifest>(),
    }
  }

  #[tokio::test]
  async fn fresh_deployment_plans_everything_without_mutating() {
    let functions = FakeFunctions::default();
    let distribution = FakeDistribution::new(ID);

    let plan = plan(&config(), &manifests(), &functions, &distribution).await.unwrap();

    assert_eq!(plan.function, FunctionPlan::Create);
    assert!(plan.grant_permission);
    assert_eq!(
      plan.binding,
      BindingPlan::Replace {
        current: 0,
        target_arn: None
      }
    );
    assert!(plan.has_changes());
    assert!(functions.mutations().is_empty());
    assert!(distribution.mutations().is_empty());
  }

  #[tokio::test]
  async fn converged_state_plans_only_invalidation() {
    let payload = DeployablePayload::build(&manifests()).unwrap();
    let functions = FakeFunctions::with_function("site-edge-router", &payload.bytes);
    let arn = functions.versions()[0].arn.clone();
    functions.grant(&arn);
    let distribution = FakeDistribution::with_associations(ID, vec![FunctionAssociation::origin_request(&arn)]);

    let mut config = config();
    let plan_without = plan(&config, &manifests(), &functions, &distribution).await.unwrap();
    assert!(!plan_without.has_changes());

    config.invalidation_path = Some("/*".to_string());
    let plan_with = plan(&config, &manifests(), &functions, &distribution).await.unwrap();
    assert_eq!(plan_with.binding, BindingPlan::Unchanged);
    assert_eq!(plan_with.invalidation.as_deref(), Some("/*"));

    assert!(functions.mutations().is_empty());
    assert!(distribution.mutations().is_empty());
  }

  #[tokio::test]
  async fn missing_grant_on_converged_version_is_a_change() {
    let payload = DeployablePayload::build(&manifests()).unwrap();
    let functions = FakeFunctions::with_function("site-edge-router", &payload.bytes);
    let arn = functions.versions()[0].arn.clone();
    let distribution = FakeDistribution::with_associations(ID, vec![FunctionAssociation::origin_request(&arn)]);

    let plan = plan(&config(), &manifests(), &functions, &distribution).await.unwrap();

    assert_eq!(plan.binding, BindingPlan::Unchanged);
    assert!(plan.grant_permission);
    assert!(plan.has_changes());
    assert!(functions.mutations().is_empty());
  }
}
