pub const APP_NAME: &str = "edgebind";

/// Appended to the configured prefix to form the remote function name.
pub const FUNCTION_NAME_SUFFIX: &str = "-edge-router";

/// Managed runtime the routing script targets.
pub const FUNCTION_RUNTIME: &str = "nodejs20.x";

/// Script file name inside the deployable archive.
pub const SCRIPT_FILENAME: &str = "index.js";

/// Archive file name written into the scratch directory.
pub const ARCHIVE_FILENAME: &str = "function.zip";

/// Entry point of the routing script (`<file stem>.<export>`).
pub const FUNCTION_HANDLER: &str = "index.handler";

/// Leading segment stripped from page file paths when rewriting a request.
pub const PAGE_PATH_PREFIX: &str = "pages";

/// Distribution event the routing function is attached to.
pub const ORIGIN_REQUEST_EVENT: &str = "origin-request";

/// Service principal that invokes edge functions.
pub const EDGE_PRINCIPAL: &str = "edgelambda.amazonaws.com";

pub const INVOKE_ACTION: &str = "lambda:InvokeFunction";

/// Statement id of the invoke grant. Fixed so repeated grants conflict instead of piling up.
pub const PERMISSION_STATEMENT_ID: &str = "edgebind-edge-invoke";

/// Edge functions must live in this region.
pub const EDGE_FUNCTION_REGION: &str = "us-east-1";

pub const ROUTES_MANIFEST_FILENAME: &str = "routes-manifest.json";
pub const PAGES_MANIFEST_FILENAME: &str = "pages-manifest.json";

/// Lambda limits function names to 64 characters.
pub const MAX_FUNCTION_NAME_LEN: usize = 64;
