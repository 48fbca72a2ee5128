//! Build manifests consumed by the reconciler.
//!
//! A framework build leaves two JSON documents behind: the routing table
//! (`routes-manifest.json`) and the page-to-file mapping
//! (`pages-manifest.json`). Both are read once, before any remote call, and
//! are immutable afterwards.

mod load;
mod types;

pub use load::{BuildManifests, ManifestReadError, load_pages_manifest, load_routes_manifest};
pub use types::*;
