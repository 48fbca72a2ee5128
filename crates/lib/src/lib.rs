//! edgebind-lib: deploys a build's routing table to an edge function.
//!
//! The crate turns a pair of build manifests into a routing script, packages
//! it, and reconciles it against a function service and a CDN distribution:
//! - `manifest`: loading the routing table and page mapping
//! - `payload`: rendering and packaging the deployable script
//! - `routing`: local evaluation of the same routing rules
//! - `remote`: the service traits and their AWS binding
//! - `reconcile`: idempotent convergence of remote state

pub mod consts;
pub mod manifest;
pub mod payload;
pub mod reconcile;
pub mod remote;
pub mod routing;
pub mod util;
