//! In-memory backends and a fake clock for tests.
//!
//! The fakes record every call by operation name so tests can assert which
//! remote calls a run made, and in particular that a converged run made no
//! mutating calls at all.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::reconcile::Clock;
use crate::remote::{
  CreateFunction, DeploymentStatus, DistributionApi, DistributionConfig, FunctionApi, FunctionAssociation,
  FunctionStatus, GrantPermission, LastUpdateStatus, LifecycleState, PublishedVersion, RemoteError,
  RemoteFunctionState,
};
use crate::util::hash::digest_bytes;

pub const FUNCTION_ARN_PREFIX: &str = "arn:aws:lambda:us-east-1:123456789012:function:";

/// Operations that change remote state.
pub const MUTATIONS: &[&str] = &[
  "create_function",
  "update_function_code",
  "publish_version",
  "add_permission",
  "update_distribution_config",
  "create_invalidation",
];

/// Records requested sleeps instead of sleeping.
///
/// Time only moves when something sleeps or calls [`FakeClock::advance`].
#[derive(Debug)]
pub struct FakeClock {
  origin: Instant,
  elapsed: Mutex<Duration>,
  sleeps: Mutex<Vec<Duration>>,
}

impl Default for FakeClock {
  fn default() -> Self {
    Self {
      origin: Instant::now(),
      elapsed: Mutex::new(Duration::ZERO),
      sleeps: Mutex::new(vec![]),
    }
  }
}

impl FakeClock {
  pub fn sleeps(&self) -> Vec<Duration> {
    self.sleeps.lock().unwrap().clone()
  }

  /// Let time pass without a sleep, as a slow remote call would.
  pub fn advance(&self, duration: Duration) {
    *self.elapsed.lock().unwrap() += duration;
  }
}

#[async_trait]
impl Clock for FakeClock {
  fn now(&self) -> Instant {
    self.origin + *self.elapsed.lock().unwrap()
  }

  async fn sleep(&self, duration: Duration) {
    self.advance(duration);
    self.sleeps.lock().unwrap().push(duration);
  }
}

#[derive(Debug, Clone)]
struct FakeFunction {
  arn: String,
  head_digest: String,
  head_status: FunctionStatus,
  versions: Vec<PublishedVersion>,
}

#[derive(Debug, Default)]
struct FunctionsState {
  function: Option<FakeFunction>,
  statuses: VecDeque<FunctionStatus>,
  granted: Vec<String>,
  calls: Vec<&'static str>,
  lookup_error: bool,
  stale_policy: bool,
}

/// A single-function [`FunctionApi`].
#[derive(Debug, Default)]
pub struct FakeFunctions {
  state: Mutex<FunctionsState>,
}

impl FakeFunctions {
  /// A function with `code` published as version 1.
  pub fn with_function(name: &str, code: &[u8]) -> Self {
    let fake = Self::default();
    fake.seed(name, code, true);
    fake
  }

  /// A function whose head holds `code`, never published.
  pub fn with_unpublished_function(name: &str, code: &[u8]) -> Self {
    let fake = Self::default();
    fake.seed(name, code, false);
    fake
  }

  fn seed(&self, name: &str, code: &[u8], publish: bool) {
    let arn = format!("{}{}", FUNCTION_ARN_PREFIX, name);
    let digest = digest_bytes(code).0;
    let versions = if publish {
      vec![PublishedVersion {
        version: "1".to_string(),
        arn: format!("{}:1", arn),
        content_digest: digest.clone(),
      }]
    } else {
      vec![]
    };
    self.state.lock().unwrap().function = Some(FakeFunction {
      arn,
      head_digest: digest,
      head_status: FunctionStatus::ready(),
      versions,
    });
  }

  /// Statuses returned by successive `function_status` calls; ready once drained.
  pub fn queue_statuses(&self, statuses: impl IntoIterator<Item = FunctionStatus>) {
    self.state.lock().unwrap().statuses.extend(statuses);
  }

  /// Make the head report an update still in progress.
  pub fn set_head_in_progress(&self) {
    if let Some(function) = self.state.lock().unwrap().function.as_mut() {
      function.head_status = FunctionStatus::new(LifecycleState::Active, LastUpdateStatus::InProgress);
    }
  }

  /// Make `get_function` fail with a service error.
  pub fn fail_lookups(&self) {
    self.state.lock().unwrap().lookup_error = true;
  }

  /// Make policy reads miss existing grants, as when another run grants
  /// between our read and our write.
  pub fn serve_stale_policy(&self) {
    self.state.lock().unwrap().stale_policy = true;
  }

  /// Record an existing invoke grant for `arn`.
  pub fn grant(&self, arn: &str) {
    self.state.lock().unwrap().granted.push(arn.to_string());
  }

  pub fn calls(&self) -> Vec<&'static str> {
    self.state.lock().unwrap().calls.clone()
  }

  pub fn mutations(&self) -> Vec<&'static str> {
    self.calls().into_iter().filter(|c| MUTATIONS.contains(c)).collect()
  }

  pub fn versions(&self) -> Vec<PublishedVersion> {
    self
      .state
      .lock()
      .unwrap()
      .function
      .as_ref()
      .map(|f| f.versions.clone())
      .unwrap_or_default()
  }

  pub fn granted(&self) -> Vec<String> {
    self.state.lock().unwrap().granted.clone()
  }

  fn publish_head(function: &mut FakeFunction) -> PublishedVersion {
    let version = (function.versions.len() + 1).to_string();
    let published = PublishedVersion {
      arn: format!("{}:{}", function.arn, version),
      version,
      content_digest: function.head_digest.clone(),
    };
    function.versions.push(published.clone());
    published
  }
}

#[async_trait]
impl FunctionApi for FakeFunctions {
  async fn get_function(&self, name: &str) -> Result<RemoteFunctionState, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("get_function");
    if state.lookup_error {
      return Err(RemoteError::malformed("GetFunctionConfiguration", "access denied"));
    }
    let function = state
      .function
      .as_ref()
      .ok_or_else(|| RemoteError::not_found(format!("function {}", name)))?;

    Ok(RemoteFunctionState {
      arn: function.arn.clone(),
      content_digest: function.head_digest.clone(),
      lifecycle_state: function.head_status.lifecycle_state,
      last_update_status: function.head_status.last_update_status,
      published: function.versions.last().cloned(),
    })
  }

  async fn create_function(&self, request: CreateFunction<'_>) -> Result<PublishedVersion, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("create_function");
    if state.function.is_some() {
      return Err(RemoteError::Conflict {
        message: format!("function {} already exists", request.name),
      });
    }
    let mut function = FakeFunction {
      arn: format!("{}{}", FUNCTION_ARN_PREFIX, request.name),
      head_digest: digest_bytes(request.payload).0,
      head_status: FunctionStatus::ready(),
      versions: vec![],
    };
    let published = Self::publish_head(&mut function);
    state.function = Some(function);
    Ok(published)
  }

  async fn update_function_code(&self, name: &str, payload: &[u8]) -> Result<PublishedVersion, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("update_function_code");
    let function = state
      .function
      .as_mut()
      .ok_or_else(|| RemoteError::not_found(format!("function {}", name)))?;
    function.head_digest = digest_bytes(payload).0;
    function.head_status = FunctionStatus::ready();
    Ok(Self::publish_head(function))
  }

  async fn publish_version(&self, name: &str, expected_digest: &str) -> Result<PublishedVersion, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("publish_version");
    let function = state
      .function
      .as_mut()
      .ok_or_else(|| RemoteError::not_found(format!("function {}", name)))?;
    if function.head_digest != expected_digest {
      return Err(RemoteError::PreconditionFailed {
        message: "code digest changed".to_string(),
      });
    }
    Ok(Self::publish_head(function))
  }

  async fn function_status(&self, _name: &str, version: &str) -> Result<FunctionStatus, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("function_status");
    if let Some(status) = state.statuses.pop_front() {
      return Ok(status);
    }
    if version == "$LATEST" {
      if let Some(function) = state.function.as_mut() {
        function.head_status = FunctionStatus::ready();
      }
    }
    Ok(FunctionStatus::ready())
  }

  async fn has_permission(&self, function_arn: &str, _statement_id: &str) -> Result<bool, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("get_policy");
    Ok(!state.stale_policy && state.granted.iter().any(|arn| arn == function_arn))
  }

  async fn add_permission(&self, request: GrantPermission<'_>) -> Result<(), RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("add_permission");
    if state.granted.iter().any(|arn| arn == request.function_arn) {
      return Err(RemoteError::Conflict {
        message: format!("statement {} already exists", request.statement_id),
      });
    }
    state.granted.push(request.function_arn.to_string());
    Ok(())
  }
}

#[derive(Debug)]
struct DistributionState {
  etag: u64,
  associations: Vec<FunctionAssociation>,
  statuses: VecDeque<DeploymentStatus>,
  calls: Vec<&'static str>,
  invalidations: Vec<(String, String)>,
  concurrent_writer: bool,
  status_error: bool,
  status_reads: usize,
}

/// A single-distribution [`DistributionApi`].
///
/// The document type is the distribution id, standing in for the rest of the
/// configuration that must survive a write unchanged.
#[derive(Debug)]
pub struct FakeDistribution {
  id: String,
  state: Mutex<DistributionState>,
}

impl FakeDistribution {
  pub fn new(id: &str) -> Self {
    Self {
      id: id.to_string(),
      state: Mutex::new(DistributionState {
        etag: 1,
        associations: vec![],
        statuses: VecDeque::new(),
        calls: vec![],
        invalidations: vec![],
        concurrent_writer: false,
        status_error: false,
        status_reads: 0,
      }),
    }
  }

  pub fn with_associations(id: &str, associations: Vec<FunctionAssociation>) -> Self {
    let fake = Self::new(id);
    fake.state.lock().unwrap().associations = associations;
    fake
  }

  /// Simulate another writer changing the distribution after every read.
  pub fn race_with_concurrent_writer(&self) {
    self.state.lock().unwrap().concurrent_writer = true;
  }

  /// Statuses returned by successive `distribution_status` calls; deployed once drained.
  pub fn queue_statuses(&self, statuses: impl IntoIterator<Item = DeploymentStatus>) {
    self.state.lock().unwrap().statuses.extend(statuses);
  }

  pub fn fail_status_reads(&self) {
    self.state.lock().unwrap().status_error = true;
  }

  pub fn associations(&self) -> Vec<FunctionAssociation> {
    self.state.lock().unwrap().associations.clone()
  }

  pub fn invalidations(&self) -> Vec<(String, String)> {
    self.state.lock().unwrap().invalidations.clone()
  }

  pub fn calls(&self) -> Vec<&'static str> {
    self.state.lock().unwrap().calls.clone()
  }

  pub fn mutations(&self) -> Vec<&'static str> {
    self.calls().into_iter().filter(|c| MUTATIONS.contains(c)).collect()
  }

  pub fn status_reads(&self) -> usize {
    self.state.lock().unwrap().status_reads
  }
}

#[async_trait]
impl DistributionApi for FakeDistribution {
  type Document = String;

  async fn get_distribution_config(&self, id: &str) -> Result<DistributionConfig<String>, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("get_distribution_config");
    if id != self.id {
      return Err(RemoteError::not_found(format!("distribution {}", id)));
    }
    let config = DistributionConfig {
      etag: format!("E{}", state.etag),
      function_associations: state.associations.clone(),
      document: self.id.clone(),
    };
    if state.concurrent_writer {
      state.etag += 1;
    }
    Ok(config)
  }

  async fn update_distribution_config(&self, id: &str, config: DistributionConfig<String>) -> Result<(), RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("update_distribution_config");
    if id != self.id || config.document != self.id {
      return Err(RemoteError::malformed("UpdateDistribution", "document does not belong to this distribution"));
    }
    if config.etag != format!("E{}", state.etag) {
      return Err(RemoteError::PreconditionFailed {
        message: "etag is stale".to_string(),
      });
    }
    state.etag += 1;
    state.associations = config.function_associations;
    state.statuses.push_front(DeploymentStatus::InProgress);
    Ok(())
  }

  async fn create_invalidation(&self, _id: &str, path: &str, caller_reference: &str) -> Result<String, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("create_invalidation");
    state.invalidations.push((path.to_string(), caller_reference.to_string()));
    Ok(format!("I{}", state.invalidations.len()))
  }

  async fn distribution_status(&self, _id: &str) -> Result<DeploymentStatus, RemoteError> {
    let mut state = self.state.lock().unwrap();
    state.calls.push("distribution_status");
    state.status_reads += 1;
    if state.status_error {
      return Err(RemoteError::malformed("GetDistribution", "throttled"));
    }
    Ok(state.statuses.pop_front().unwrap_or(DeploymentStatus::Deployed))
  }
}
