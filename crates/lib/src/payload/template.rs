//! The routing script embedded in every payload.
//!
//! The script logic is fixed; only the two manifests vary. They are inlined
//! as JSON literals so the function never reads sidecar files at runtime.
//! The page path prefix is inlined from the same constant the local router
//! strips.

use crate::consts::PAGE_PATH_PREFIX;
use crate::manifest::{PageManifest, RouteManifest};
use crate::util::canonical::to_canonical_json;

const ROUTES_PLACEHOLDER: &str = "__EDGEBIND_ROUTES_MANIFEST__";
const PAGES_PLACEHOLDER: &str = "__EDGEBIND_PAGES_MANIFEST__";
const PREFIX_PLACEHOLDER: &str = "__EDGEBIND_PAGE_PATH_PREFIX__";

/// Origin-request handler. Dynamic routes are scanned before static routes and
/// the first route whose pattern matches and whose page is mapped wins.
const ROUTER_TEMPLATE: &str = r#"'use strict';

const routesManifest = __EDGEBIND_ROUTES_MANIFEST__;
const pagesManifest = __EDGEBIND_PAGES_MANIFEST__;

const PAGE_PATH_PREFIX = __EDGEBIND_PAGE_PATH_PREFIX__;

const routes = []
  .concat(routesManifest.dynamicRoutes || [], routesManifest.staticRoutes || [])
  .filter((route) => typeof route.regex === 'string')
  .map((route) => ({ page: route.page, pattern: new RegExp(route.regex) }));

function stripPrefix(filePath) {
  return filePath.startsWith(PAGE_PATH_PREFIX) ? filePath.slice(PAGE_PATH_PREFIX.length) : filePath;
}

exports.handler = async (event) => {
  const request = event.Records[0].cf.request;
  const match = routes.find(
    (route) =>
      route.pattern.test(request.uri) &&
      Object.prototype.hasOwnProperty.call(pagesManifest, route.page)
  );
  if (match) {
    request.uri = stripPrefix(pagesManifest[match.page]);
  }
  return request;
};
"#;

/// Render the routing script with both manifests inlined as canonical JSON.
pub fn render_script(routes: &RouteManifest, pages: &PageManifest) -> Result<String, serde_json::Error> {
  let routes_json = to_canonical_json(routes)?;
  let pages_json = to_canonical_json(pages)?;
  let prefix_json = serde_json::to_string(PAGE_PATH_PREFIX)?;

  Ok(
    ROUTER_TEMPLATE
      .replacen(ROUTES_PLACEHOLDER, &routes_json, 1)
      .replacen(PAGES_PLACEHOLDER, &pages_json, 1)
      .replacen(PREFIX_PLACEHOLDER, &prefix_json, 1),
  )
}
