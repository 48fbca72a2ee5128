//! Implementation of the `edgebind resolve` command.
//!
//! Runs request URIs through the routing rules locally and prints what the
//! edge function would rewrite them to.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use edgebind_lib::routing::Router;

use super::args::ManifestArgs;
use crate::output::{OutputFormat, print_change, print_json, print_warning, symbols};

#[derive(Args, Debug)]
pub struct ResolveArgs {
  #[command(flatten)]
  pub manifests: ManifestArgs,

  /// Request URIs to resolve
  #[arg(required = true)]
  pub uris: Vec<String>,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Resolved {
  uri: String,
  page: Option<String>,
  rewritten: String,
}

pub fn cmd_resolve(args: ResolveArgs) -> Result<()> {
  let manifests = args.manifests.load()?;
  let router = Router::new(&manifests.routes, &manifests.pages);

  for page in router.skipped() {
    print_warning(&format!("route for {} uses a pattern that cannot be evaluated locally; skipped", page));
  }

  let resolved: Vec<Resolved> = args
    .uris
    .iter()
    .map(|uri| {
      let resolution = router.resolve(uri);
      Resolved {
        uri: uri.clone(),
        page: resolution.page,
        rewritten: resolution.uri,
      }
    })
    .collect();

  if args.output.is_json() {
    return print_json(&resolved);
  }

  for entry in &resolved {
    match &entry.page {
      Some(page) => print_change(
        symbols::MODIFY,
        &format!("{} {} {} ({})", entry.uri, symbols::ARROW, entry.rewritten, page),
      ),
      None => print_change(symbols::UNCHANGED, &format!("{} (no route)", entry.uri)),
    }
  }
  Ok(())
}
