//! Locating and parsing build manifests.
//!
//! # Build directory layout
//!
//! ```text
//! <build dir>/
//! ├── routes-manifest.json
//! └── server/                (or serverless/ for older builds)
//!     └── pages-manifest.json
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{PAGES_MANIFEST_FILENAME, ROUTES_MANIFEST_FILENAME};

use super::types::{PageManifest, RouteManifest};

/// Directories under the build dir that may hold the pages manifest, in lookup order.
const PAGES_MANIFEST_DIRS: &[&str] = &["server", "serverless"];

/// A manifest could not be located or parsed. Always fatal, raised before any remote call.
#[derive(Debug, Error)]
pub enum ManifestReadError {
  #[error("build directory not found: {0}")]
  BuildDirNotFound(PathBuf),

  #[error("manifest not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse manifest {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Both manifests of a single build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildManifests {
  pub routes: RouteManifest,
  pub pages: PageManifest,
}

impl BuildManifests {
  /// Locate and parse both manifests inside a build directory.
  pub fn from_build_dir(build_dir: &Path) -> Result<Self, ManifestReadError> {
    if !build_dir.is_dir() {
      return Err(ManifestReadError::BuildDirNotFound(build_dir.to_path_buf()));
    }
    let build_dir = dunce::canonicalize(build_dir).map_err(|source| ManifestReadError::Read {
      path: build_dir.to_path_buf(),
      source,
    })?;

    let routes_path = build_dir.join(ROUTES_MANIFEST_FILENAME);
    let pages_path = PAGES_MANIFEST_DIRS
      .iter()
      .map(|dir| build_dir.join(dir).join(PAGES_MANIFEST_FILENAME))
      .find(|path| path.is_file())
      .unwrap_or_else(|| build_dir.join(PAGES_MANIFEST_DIRS[0]).join(PAGES_MANIFEST_FILENAME));

    Self::from_files(&routes_path, &pages_path)
  }

  /// Parse both manifests from explicit paths.
  pub fn from_files(routes_path: &Path, pages_path: &Path) -> Result<Self, ManifestReadError> {
    let routes = load_routes_manifest(routes_path)?;
    let pages = load_pages_manifest(pages_path)?;

    info!(
      dynamic_routes = routes.dynamic_routes.len(),
      static_routes = routes.static_routes.len(),
      pages = pages.len(),
      "loaded build manifests"
    );

    Ok(Self { routes, pages })
  }
}

pub fn load_routes_manifest(path: &Path) -> Result<RouteManifest, ManifestReadError> {
  read_json(path)
}

pub fn load_pages_manifest(path: &Path) -> Result<PageManifest, ManifestReadError> {
  read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestReadError> {
  debug!(path = %path.display(), "reading manifest");

  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      return Err(ManifestReadError::NotFound(path.to_path_buf()));
    }
    Err(source) => {
      return Err(ManifestReadError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  serde_json::from_str(&content).map_err(|source| ManifestReadError::Parse {
    path: path.to_path_buf(),
    source,
  })
}
