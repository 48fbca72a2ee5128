//! Cache invalidation for runs that changed nothing.

use tracing::info;

use crate::remote::DistributionApi;
use crate::util::hash::ContentDigest;
use crate::util::redact::redact;

use super::types::ReconcileError;

/// Digest characters kept in the caller reference.
const DIGEST_PREFIX_LEN: usize = 12;

/// Idempotency key for an invalidation request.
///
/// Derived from the function name, run id and payload digest, so a retried
/// submission within one run is deduplicated while every run gets its own.
pub fn caller_reference(function_name: &str, run_id: &str, digest: &ContentDigest) -> String {
  let digest: String = digest
    .as_str()
    .chars()
    .filter(char::is_ascii_alphanumeric)
    .take(DIGEST_PREFIX_LEN)
    .collect();
  format!("{}-{}-{}", function_name, run_id, digest)
}

/// Submit one invalidation for `path`, returning the invalidation id.
pub async fn invalidate_cache<D>(
  api: &D,
  distribution_id: &str,
  path: &str,
  caller_reference: &str,
) -> Result<String, ReconcileError>
where
  D: DistributionApi + ?Sized,
{
  let invalidation_id = api
    .create_invalidation(distribution_id, path, caller_reference)
    .await
    .map_err(|source| ReconcileError::RemoteMutation {
      operation: "create invalidation",
      source,
    })?;

  info!(
    distribution = %redact(distribution_id),
    path = %path,
    invalidation = %invalidation_id,
    "submitted cache invalidation"
  );
  Ok(invalidation_id)
}
