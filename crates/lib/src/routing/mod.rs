//! Local rendition of the embedded routing script.
//!
//! [`Router`] applies the same rules as the script shipped to the edge:
//! scan dynamic routes, then static routes, take the first route whose
//! pattern matches the URI and whose page is mapped, and rewrite the URI to
//! the page's file path minus the leading `pages` segment. It backs
//! `edgebind resolve` and lets the rules be checked without deploying.
//!
//! Route patterns are written for a JavaScript engine. Patterns this regex
//! engine cannot compile (lookaround, backreferences) are skipped with a
//! warning rather than failing the whole table.

use regex::Regex;
use tracing::warn;

use crate::consts::PAGE_PATH_PREFIX;
use crate::manifest::{PageManifest, RouteManifest};

struct CompiledRoute {
  page: String,
  pattern: Regex,
}

/// The outcome of routing one URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
  /// The page whose route matched, if any.
  pub page: Option<String>,

  /// The URI forwarded to the origin.
  pub uri: String,
}

impl Resolution {
  pub fn is_rewritten(&self) -> bool {
    self.page.is_some()
  }
}

pub struct Router {
  routes: Vec<CompiledRoute>,
  pages: PageManifest,
  skipped: Vec<String>,
}

impl Router {
  pub fn new(routes: &RouteManifest, pages: &PageManifest) -> Self {
    let mut compiled = Vec::with_capacity(routes.len());
    let mut skipped = Vec::new();

    for route in routes.ordered() {
      let Some(regex) = route.regex.as_deref() else {
        continue;
      };
      match Regex::new(regex) {
        Ok(pattern) => compiled.push(CompiledRoute {
          page: route.page.clone(),
          pattern,
        }),
        Err(e) => {
          warn!(page = %route.page, regex = %regex, error = %e, "skipping route with unsupported pattern");
          skipped.push(route.page.clone());
        }
      }
    }

    Self {
      routes: compiled,
      pages: pages.clone(),
      skipped,
    }
  }

  /// Pages whose patterns could not be compiled locally.
  pub fn skipped(&self) -> &[String] {
    &self.skipped
  }

  pub fn resolve(&self, uri: &str) -> Resolution {
    let hit = self
      .routes
      .iter()
      .find_map(|route| match self.pages.get(&route.page) {
        Some(file_path) if route.pattern.is_match(uri) => Some((route, file_path)),
        _ => None,
      });

    match hit {
      Some((route, file_path)) => Resolution {
        page: Some(route.page.clone()),
        uri: strip_page_prefix(file_path).to_string(),
      },
      None => Resolution {
        page: None,
        uri: uri.to_string(),
      },
    }
  }
}

/// Remove the leading `pages` segment from a server-relative page path.
pub fn strip_page_prefix(file_path: &str) -> &str {
  file_path.strip_prefix(PAGE_PATH_PREFIX).unwrap_or(file_path)
}
