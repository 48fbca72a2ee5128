//! Implementation of the `edgebind package` command.
//!
//! Writes the routing script and archive to disk without touching any remote
//! service, so the payload can be inspected or its digest compared.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use edgebind_lib::payload::synthesize;

use super::args::ManifestArgs;
use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_success};

#[derive(Args, Debug)]
pub struct PackageArgs {
  #[command(flatten)]
  pub manifests: ManifestArgs,

  /// Directory to write index.js and function.zip into
  #[arg(long, default_value = "edgebind-out")]
  pub out_dir: PathBuf,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct PackageSummary {
  digest: String,
  size: usize,
  archive: Option<PathBuf>,
  routes: usize,
  pages: usize,
}

pub fn cmd_package(args: PackageArgs) -> Result<()> {
  let manifests = args.manifests.load()?;
  let payload = synthesize(&manifests, &args.out_dir)
    .with_context(|| format!("Failed to package payload into {}", args.out_dir.display()))?;

  let summary = PackageSummary {
    digest: payload.digest.to_string(),
    size: payload.size(),
    archive: payload.archive_path.clone(),
    routes: manifests.routes.len(),
    pages: manifests.pages.len(),
  };

  if args.output.is_json() {
    return print_json(&summary);
  }

  let archive = summary
    .archive
    .as_ref()
    .map(|p| p.display().to_string())
    .unwrap_or_default();
  print_success(&format!("Packaged {}", archive));
  print_stat("Digest", &summary.digest);
  print_stat("Size", &format_bytes(summary.size as u64));
  print_stat("Routes", &summary.routes.to_string());
  print_stat("Pages", &summary.pages.to_string());
  Ok(())
}
