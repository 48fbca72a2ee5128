//! Implementation of the `edgebind apply` command.
//!
//! Loads the build manifests and reconciles the edge function and the
//! distribution against them.

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use edgebind_lib::reconcile::{BindingOutcome, FunctionAction, PermissionOutcome, ReconcileReport, TokioClock, reconcile};
use edgebind_lib::remote::aws::{CloudFrontDistributions, LambdaFunctions, load_sdk_config};

use super::args::{ManifestArgs, TargetArgs, WaitArgs};
use crate::output::{OutputFormat, print_change, print_info, print_json, print_stat, print_success, symbols, truncate_digest};

#[derive(Args, Debug)]
pub struct ApplyArgs {
  #[command(flatten)]
  pub manifests: ManifestArgs,

  #[command(flatten)]
  pub target: TargetArgs,

  #[command(flatten)]
  pub wait: WaitArgs,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

/// Execute the apply command.
///
/// Fails on the first error; rerunning picks up where the failed run stopped.
pub fn cmd_apply(args: ApplyArgs) -> Result<()> {
  let manifests = args.manifests.load()?;
  let mut config = args.target.config();
  args.wait.apply_to(&mut config);
  debug!(scratch_dir = %config.scratch_dir.display(), run_id = %config.run_id, "prepared run");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(async {
      let sdk_config = load_sdk_config(args.target.profile.as_deref()).await;
      let functions = LambdaFunctions::new(&sdk_config);
      let distributions = CloudFrontDistributions::new(&sdk_config);
      reconcile(&config, &manifests, &functions, &distributions, &TokioClock).await
    })
    .context("Apply failed")?;

  if args.output.is_json() {
    return print_json(&report);
  }
  print_report(&report);
  Ok(())
}

fn print_report(report: &ReconcileReport) {
  let function = &report.function;
  let (symbol, verb) = match function.action {
    FunctionAction::Created => (symbols::ADD, "created"),
    FunctionAction::Updated => (symbols::MODIFY, "updated"),
    FunctionAction::Published => (symbols::MODIFY, "published"),
    FunctionAction::Unchanged => (symbols::UNCHANGED, "unchanged"),
  };
  print_change(symbol, &format!("function {} {} (version {})", function.name, verb, function.version.version));

  if report.permission == PermissionOutcome::Granted {
    print_change(symbols::ADD, "edge invoke permission granted");
  }

  match report.binding {
    BindingOutcome::Unchanged => print_change(symbols::UNCHANGED, "distribution binding unchanged"),
    BindingOutcome::Updated { deployed: true } => print_change(symbols::MODIFY, "distribution bound and deployed"),
    BindingOutcome::Updated { deployed: false } => {
      print_change(symbols::MODIFY, "distribution bound, deployment still in progress")
    }
  }

  if let Some(id) = &report.invalidation {
    print_change(symbols::ADD, &format!("cache invalidation {} submitted", id));
  }

  println!();
  print_stat("Digest", truncate_digest(report.digest.as_str()));
  print_stat("Version", &function.version.arn);

  if report.changed() {
    print_success("Apply complete");
  } else {
    print_info("Already up to date");
  }
}
