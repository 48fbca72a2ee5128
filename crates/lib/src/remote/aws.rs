//! Lambda and CloudFront bindings for the remote traits.
//!
//! Both clients inherit credentials, retry and timeout settings from a
//! shared [`aws_config::SdkConfig`]. The Lambda client is pinned to
//! `us-east-1`, the only region edge functions can be replicated from.

use async_trait::async_trait;
use aws_sdk_cloudfront as cloudfront;
use aws_sdk_cloudfront::types::{
  EventType, InvalidationBatch, LambdaFunctionAssociation, LambdaFunctionAssociations, Paths,
};
use aws_sdk_lambda as lambda;
use aws_sdk_lambda::error::ProvideErrorMetadata;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime};
use tracing::debug;

use crate::consts::EDGE_FUNCTION_REGION;
use crate::util::redact::redact;

use super::{
  CreateFunction, DeploymentStatus, DistributionApi, DistributionConfig, FunctionApi, FunctionAssociation,
  FunctionStatus, GrantPermission, LastUpdateStatus, LifecycleState, PublishedVersion, RemoteError,
  RemoteFunctionState,
};

/// Load shared SDK configuration from the environment, optionally from a named profile.
pub async fn load_sdk_config(profile: Option<&str>) -> aws_config::SdkConfig {
  let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
  if let Some(profile) = profile {
    loader = loader.profile_name(profile);
  }
  loader.load().await
}

/// Wrap an SDK error, keeping the service's own error code or message up front.
fn sdk_error<E>(operation: &'static str, err: E) -> RemoteError
where
  E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
  let message = err
    .message()
    .or_else(|| err.code())
    .unwrap_or("request failed")
    .to_string();
  RemoteError::service(operation, message, err)
}

/// Append the version to an ARN unless it is already qualified with it.
fn qualify_arn(arn: &str, version: &str) -> String {
  if arn.ends_with(&format!(":{}", version)) {
    arn.to_string()
  } else {
    format!("{}:{}", arn, version)
  }
}

fn published_version(
  operation: &'static str,
  arn: Option<&str>,
  version: Option<&str>,
  digest: Option<&str>,
) -> Result<PublishedVersion, RemoteError> {
  let (Some(arn), Some(version), Some(digest)) = (arn, version, digest) else {
    return Err(RemoteError::malformed(
      operation,
      "response is missing the function ARN, version or code digest",
    ));
  };
  Ok(PublishedVersion {
    version: version.to_string(),
    arn: qualify_arn(arn, version),
    content_digest: digest.to_string(),
  })
}

/// True if the policy document holds statement `statement_id` on `function_arn`.
fn policy_has_statement(policy: &str, statement_id: &str, function_arn: &str) -> Result<bool, serde_json::Error> {
  let document: serde_json::Value = serde_json::from_str(policy)?;
  let statements = match document.get("Statement") {
    Some(serde_json::Value::Array(items)) => items.as_slice(),
    Some(single) => std::slice::from_ref(single),
    None => &[],
  };

  Ok(statements.iter().any(|statement| {
    statement.get("Sid").and_then(|v| v.as_str()) == Some(statement_id)
      && statement.get("Resource").and_then(|v| v.as_str()) == Some(function_arn)
  }))
}

/// [`FunctionApi`] backed by AWS Lambda.
#[derive(Debug, Clone)]
pub struct LambdaFunctions {
  client: lambda::Client,
}

impl LambdaFunctions {
  pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
    let config = lambda::config::Builder::from(sdk_config)
      .region(lambda::config::Region::new(EDGE_FUNCTION_REGION))
      .build();
    Self {
      client: lambda::Client::from_conf(config),
    }
  }

  /// Find the highest-numbered published version, skipping `$LATEST`.
  async fn latest_published(&self, name: &str) -> Result<Option<PublishedVersion>, RemoteError> {
    let mut marker: Option<String> = None;
    let mut latest: Option<(u64, PublishedVersion)> = None;

    loop {
      let output = self
        .client
        .list_versions_by_function()
        .function_name(name)
        .set_marker(marker.take())
        .send()
        .await
        .map_err(|e| sdk_error("ListVersionsByFunction", e))?;

      for config in output.versions() {
        let Some(number) = config.version().and_then(|v| v.parse::<u64>().ok()) else {
          continue;
        };
        if latest.as_ref().is_some_and(|(highest, _)| *highest >= number) {
          continue;
        }
        let version = published_version(
          "ListVersionsByFunction",
          config.function_arn(),
          config.version(),
          config.code_sha256(),
        )?;
        latest = Some((number, version));
      }

      match output.next_marker() {
        Some(next) if !next.is_empty() => marker = Some(next.to_string()),
        _ => break,
      }
    }

    Ok(latest.map(|(_, version)| version))
  }
}

#[async_trait]
impl FunctionApi for LambdaFunctions {
  async fn get_function(&self, name: &str) -> Result<RemoteFunctionState, RemoteError> {
    let head = self
      .client
      .get_function_configuration()
      .function_name(name)
      .send()
      .await
      .map_err(|e| {
        if e.as_service_error().is_some_and(|se| se.is_resource_not_found_exception()) {
          RemoteError::not_found(format!("function {}", name))
        } else {
          sdk_error("GetFunctionConfiguration", e)
        }
      })?;

    let published = self.latest_published(name).await?;

    let state = RemoteFunctionState {
      arn: head.function_arn().unwrap_or_default().to_string(),
      content_digest: head.code_sha256().unwrap_or_default().to_string(),
      lifecycle_state: head
        .state()
        .map(|s| LifecycleState::parse(s.as_str()))
        .unwrap_or(LifecycleState::Active),
      last_update_status: head
        .last_update_status()
        .map(|s| LastUpdateStatus::parse(s.as_str()))
        .unwrap_or(LastUpdateStatus::Successful),
      published,
    };

    debug!(
      arn = %redact(&state.arn),
      published = ?state.published.as_ref().map(|p| p.version.as_str()),
      "fetched function state"
    );
    Ok(state)
  }

  async fn create_function(&self, request: CreateFunction<'_>) -> Result<PublishedVersion, RemoteError> {
    let output = self
      .client
      .create_function()
      .function_name(request.name)
      .role(request.role_arn)
      .runtime(Runtime::from(request.runtime))
      .handler(request.handler)
      .code(FunctionCode::builder().zip_file(Blob::new(request.payload.to_vec())).build())
      .publish(true)
      .send()
      .await
      .map_err(|e| sdk_error("CreateFunction", e))?;

    published_version(
      "CreateFunction",
      output.function_arn(),
      output.version(),
      output.code_sha256(),
    )
  }

  async fn update_function_code(&self, name: &str, payload: &[u8]) -> Result<PublishedVersion, RemoteError> {
    let output = self
      .client
      .update_function_code()
      .function_name(name)
      .zip_file(Blob::new(payload.to_vec()))
      .publish(true)
      .send()
      .await
      .map_err(|e| sdk_error("UpdateFunctionCode", e))?;

    published_version(
      "UpdateFunctionCode",
      output.function_arn(),
      output.version(),
      output.code_sha256(),
    )
  }

  async fn publish_version(&self, name: &str, expected_digest: &str) -> Result<PublishedVersion, RemoteError> {
    let output = self
      .client
      .publish_version()
      .function_name(name)
      .code_sha256(expected_digest)
      .send()
      .await
      .map_err(|e| sdk_error("PublishVersion", e))?;

    published_version(
      "PublishVersion",
      output.function_arn(),
      output.version(),
      output.code_sha256(),
    )
  }

  async fn function_status(&self, name: &str, version: &str) -> Result<FunctionStatus, RemoteError> {
    let output = self
      .client
      .get_function_configuration()
      .function_name(name)
      .qualifier(version)
      .send()
      .await
      .map_err(|e| sdk_error("GetFunctionConfiguration", e))?;

    let lifecycle_state = output
      .state()
      .map(|s| LifecycleState::parse(s.as_str()))
      .unwrap_or(LifecycleState::Pending);
    let last_update_status = output
      .last_update_status()
      .map(|s| LastUpdateStatus::parse(s.as_str()))
      .unwrap_or(LastUpdateStatus::InProgress);

    Ok(FunctionStatus::new(lifecycle_state, last_update_status))
  }

  async fn has_permission(&self, function_arn: &str, statement_id: &str) -> Result<bool, RemoteError> {
    let output = match self.client.get_policy().function_name(function_arn).send().await {
      Ok(output) => output,
      Err(e) if e.as_service_error().is_some_and(|se| se.is_resource_not_found_exception()) => {
        debug!(function = %redact(function_arn), "function has no resource policy");
        return Ok(false);
      }
      Err(e) => return Err(sdk_error("GetPolicy", e)),
    };

    let Some(policy) = output.policy() else {
      return Ok(false);
    };
    policy_has_statement(policy, statement_id, function_arn)
      .map_err(|e| RemoteError::malformed("GetPolicy", format!("policy is not valid JSON: {}", e)))
  }

  async fn add_permission(&self, request: GrantPermission<'_>) -> Result<(), RemoteError> {
    self
      .client
      .add_permission()
      .function_name(request.function_arn)
      .statement_id(request.statement_id)
      .action(request.action)
      .principal(request.principal)
      .send()
      .await
      .map_err(|e| {
        if e.as_service_error().is_some_and(|se| se.is_resource_conflict_exception()) {
          RemoteError::Conflict {
            message: format!("statement {} already exists", request.statement_id),
          }
        } else {
          sdk_error("AddPermission", e)
        }
      })?;
    Ok(())
  }
}

/// [`DistributionApi`] backed by CloudFront.
#[derive(Debug, Clone)]
pub struct CloudFrontDistributions {
  client: cloudfront::Client,
}

impl CloudFrontDistributions {
  pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
    Self {
      client: cloudfront::Client::new(sdk_config),
    }
  }
}

fn association_from_sdk(item: &LambdaFunctionAssociation) -> FunctionAssociation {
  FunctionAssociation {
    event_type: item.event_type().as_str().to_string(),
    target_arn: item.lambda_function_arn().to_string(),
    include_body: item.include_body().unwrap_or(false),
  }
}

fn association_to_sdk(association: &FunctionAssociation) -> Result<LambdaFunctionAssociation, RemoteError> {
  LambdaFunctionAssociation::builder()
    .lambda_function_arn(&association.target_arn)
    .event_type(EventType::from(association.event_type.as_str()))
    .include_body(association.include_body)
    .build()
    .map_err(|e| RemoteError::service("UpdateDistribution", "invalid function association", e))
}

#[async_trait]
impl DistributionApi for CloudFrontDistributions {
  type Document = cloudfront::types::DistributionConfig;

  async fn get_distribution_config(&self, id: &str) -> Result<DistributionConfig<Self::Document>, RemoteError> {
    let output = self
      .client
      .get_distribution_config()
      .id(id)
      .send()
      .await
      .map_err(|e| {
        if e.as_service_error().is_some_and(|se| se.is_no_such_distribution()) {
          RemoteError::not_found(format!("distribution {}", redact(id)))
        } else {
          sdk_error("GetDistributionConfig", e)
        }
      })?;

    let etag = output
      .e_tag()
      .ok_or_else(|| RemoteError::malformed("GetDistributionConfig", "response has no ETag"))?
      .to_string();
    let document = output
      .distribution_config()
      .cloned()
      .ok_or_else(|| RemoteError::malformed("GetDistributionConfig", "response has no distribution config"))?;

    let function_associations = document
      .default_cache_behavior()
      .and_then(|behavior| behavior.lambda_function_associations())
      .map(|associations| associations.items().iter().map(association_from_sdk).collect())
      .unwrap_or_default();

    Ok(DistributionConfig {
      etag,
      function_associations,
      document,
    })
  }

  async fn update_distribution_config(
    &self,
    id: &str,
    config: DistributionConfig<Self::Document>,
  ) -> Result<(), RemoteError> {
    let DistributionConfig {
      etag,
      function_associations,
      mut document,
    } = config;

    let items = function_associations
      .iter()
      .map(association_to_sdk)
      .collect::<Result<Vec<_>, _>>()?;
    let associations = LambdaFunctionAssociations::builder()
      .quantity(items.len() as i32)
      .set_items(Some(items))
      .build()
      .map_err(|e| RemoteError::service("UpdateDistribution", "invalid function associations", e))?;

    let behavior = document
      .default_cache_behavior
      .as_mut()
      .ok_or_else(|| RemoteError::malformed("UpdateDistribution", "distribution has no default cache behavior"))?;
    behavior.lambda_function_associations = Some(associations);

    self
      .client
      .update_distribution()
      .id(id)
      .if_match(etag)
      .distribution_config(document)
      .send()
      .await
      .map_err(|e| {
        let stale = e
          .as_service_error()
          .is_some_and(|se| se.is_precondition_failed() || se.is_invalid_if_match_version());
        if stale {
          RemoteError::PreconditionFailed {
            message: "distribution was modified since it was read".to_string(),
          }
        } else {
          sdk_error("UpdateDistribution", e)
        }
      })?;
    Ok(())
  }

  async fn create_invalidation(&self, id: &str, path: &str, caller_reference: &str) -> Result<String, RemoteError> {
    let paths = Paths::builder()
      .quantity(1)
      .items(path)
      .build()
      .map_err(|e| RemoteError::service("CreateInvalidation", "invalid path list", e))?;
    let batch = InvalidationBatch::builder()
      .paths(paths)
      .caller_reference(caller_reference)
      .build()
      .map_err(|e| RemoteError::service("CreateInvalidation", "invalid invalidation batch", e))?;

    let output = self
      .client
      .create_invalidation()
      .distribution_id(id)
      .invalidation_batch(batch)
      .send()
      .await
      .map_err(|e| sdk_error("CreateInvalidation", e))?;

    Ok(output.invalidation().map(|i| i.id().to_string()).unwrap_or_default())
  }

  async fn distribution_status(&self, id: &str) -> Result<DeploymentStatus, RemoteError> {
    let output = self
      .client
      .get_distribution()
      .id(id)
      .send()
      .await
      .map_err(|e| sdk_error("GetDistribution", e))?;

    let status = output
      .distribution()
      .map(|d| d.status())
      .ok_or_else(|| RemoteError::malformed("GetDistribution", "response has no distribution"))?;
    Ok(DeploymentStatus::parse(status))
  }
}
