//! Manifest types.
//!
//! # Route precedence
//!
//! The routing table is split into dynamic and static groups. Matching scans
//! dynamic routes first, then static routes, and the first hit wins. The
//! order inside each group is preserved exactly as the build emitted it, so
//! both groups are kept as `Vec`s and never re-sorted.
//!
//! # Example
//!
//! ```json
//! {
//!   "dynamicRoutes": [{ "page": "/posts/[id]", "regex": "^/posts/([^/]+?)(?:/)?$" }],
//!   "staticRoutes": [{ "page": "/about", "regex": "^/about(?:/)?$" }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single routing table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
  /// Page identifier, looked up in the [`PageManifest`].
  pub page: String,

  /// Pattern tested against the request URI. Entries without one never match.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub regex: Option<String>,
}

impl RouteEntry {
  pub fn new(page: impl Into<String>, regex: impl Into<String>) -> Self {
    Self {
      page: page.into(),
      regex: Some(regex.into()),
    }
  }
}

/// The routing table, partitioned into dynamic and static routes.
///
/// Unknown fields in the source document (redirects, headers, ...) are
/// ignored; only the two route groups take part in routing.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteManifest {
  #[serde(default)]
  pub dynamic_routes: Vec<RouteEntry>,
  #[serde(default)]
  pub static_routes: Vec<RouteEntry>,
}

impl RouteManifest {
  /// All routes in matching order: dynamic routes, then static routes.
  pub fn ordered(&self) -> impl Iterator<Item = &RouteEntry> {
    self.dynamic_routes.iter().chain(self.static_routes.iter())
  }

  pub fn len(&self) -> usize {
    self.dynamic_routes.len() + self.static_routes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Mapping from page identifier to a server-relative file path,
/// e.g. `"/about" -> "pages/about.html"`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageManifest(pub BTreeMap<String, String>);

impl PageManifest {
  pub fn get(&self, page: &str) -> Option<&str> {
    self.0.get(page).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PageManifest {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordered_yields_dynamic_before_static() {
    let manifest = RouteManifest {
      dynamic_routes: vec![RouteEntry::new("A", "^/x$"), RouteEntry::new("C", "^/z$")],
      static_routes: vec![RouteEntry::new("B", "^/x$")],
    };

    let pages: Vec<&str> = manifest.ordered().map(|r| r.page.as_str()).collect();
    assert_eq!(pages, vec!["A", "C", "B"]);
    assert_eq!(manifest.len(), 3);
  }

  #[test]
  fn route_manifest_parses_camel_case_and_ignores_extras() {
    let json = r#"{
      "version": 3,
      "basePath": "",
      "staticRoutes": [{ "page": "/about", "regex": "^/about$", "routeKeys": {} }],
      "dynamicRoutes": [{ "page": "/[slug]", "regex": "^/([^/]+?)$" }],
      "redirects": []
    }"#;

    let manifest: RouteManifest = serde_json::from_str(json).unwrap();
    assert_eq!(manifest.dynamic_routes, vec![RouteEntry::new("/[slug]", "^/([^/]+?)$")]);
    assert_eq!(manifest.static_routes, vec![RouteEntry::new("/about", "^/about$")]);
  }

  #[test]
  fn route_without_regex_deserializes() {
    let json = r#"{ "staticRoutes": [{ "page": "/_app" }] }"#;
    let manifest: RouteManifest = serde_json::from_str(json).unwrap();
    assert!(manifest.dynamic_routes.is_empty());
    assert_eq!(manifest.static_routes[0].regex, None);
  }

  #[test]
  fn page_manifest_is_a_plain_map() {
    let pages: PageManifest = serde_json::from_str(r#"{ "/about": "pages/about.html" }"#).unwrap();
    assert_eq!(pages.get("/about"), Some("pages/about.html"));
    assert_eq!(pages.get("/missing"), None);
  }
}
