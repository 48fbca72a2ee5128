//! Payload synthesis.
//!
//! Turns the two build manifests into the deployable unit: a zip archive
//! holding a single routing script with both manifests inlined, plus the
//! archive's content digest.
//!
//! The same manifests always yield the same bytes. Manifest keys are sorted
//! recursively before embedding and archive entries carry fixed metadata,
//! so the digest is a reliable version marker across runs and machines.

mod archive;
mod template;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{ARCHIVE_FILENAME, SCRIPT_FILENAME};
use crate::manifest::BuildManifests;
use crate::util::hash::{ContentDigest, digest_bytes};

pub use archive::{ArchiveError, build_archive};
pub use template::render_script;

/// Errors that can occur while synthesizing a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
  #[error("failed to serialize manifests: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to build archive: {0}")]
  Archive(#[source] ArchiveError),

  #[error("failed to create scratch directory {path}: {source}")]
  CreateScratchDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// The deployable unit.
#[derive(Debug, Clone)]
pub struct DeployablePayload {
  /// The archive bytes uploaded to the function service.
  pub bytes: Vec<u8>,

  /// Digest of `bytes`.
  pub digest: ContentDigest,

  /// The rendered routing script (also the only archive entry).
  pub script: String,

  /// Where the archive was written, if it was written to disk.
  pub archive_path: Option<PathBuf>,
}

impl DeployablePayload {
  /// Render and package the payload in memory.
  pub fn build(manifests: &BuildManifests) -> Result<Self, PayloadError> {
    let script = render_script(&manifests.routes, &manifests.pages).map_err(PayloadError::Serialize)?;
    let bytes = build_archive(&[(SCRIPT_FILENAME, script.as_bytes())]).map_err(PayloadError::Archive)?;
    let digest = digest_bytes(&bytes);

    debug!(size = bytes.len(), digest = %digest, "built payload archive");

    Ok(Self {
      bytes,
      digest,
      script,
      archive_path: None,
    })
  }

  pub fn size(&self) -> usize {
    self.bytes.len()
  }
}

/// Synthesize the payload and write the script and archive into `scratch_dir`.
///
/// The caller owns the scratch directory: it must be unique to this run, and
/// it is left in place afterwards.
pub fn synthesize(manifests: &BuildManifests, scratch_dir: &Path) -> Result<DeployablePayload, PayloadError> {
  let mut payload = DeployablePayload::build(manifests)?;

  fs::create_dir_all(scratch_dir).map_err(|source| PayloadError::CreateScratchDir {
    path: scratch_dir.to_path_buf(),
    source,
  })?;

  let script_path = scratch_dir.join(SCRIPT_FILENAME);
  write_file(&script_path, payload.script.as_bytes())?;

  let archive_path = scratch_dir.join(ARCHIVE_FILENAME);
  write_file(&archive_path, &payload.bytes)?;

  info!(
    path = %archive_path.display(),
    size = payload.size(),
    digest = %payload.digest,
    "synthesized payload"
  );

  payload.archive_path = Some(archive_path);
  Ok(payload)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PayloadError> {
  fs::write(path, contents).map_err(|source| PayloadError::Write {
    path: path.to_path_buf(),
    source,
  })
}
