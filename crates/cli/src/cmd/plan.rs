//! Implementation of the `edgebind plan` command.
//!
//! Reports what `apply` would change, using only read calls.

use anyhow::{Context, Result};
use clap::Args;

use edgebind_lib::reconcile::{BindingPlan, FunctionPlan, ReconcilePlan, plan};
use edgebind_lib::remote::aws::{CloudFrontDistributions, LambdaFunctions, load_sdk_config};

use super::args::{ManifestArgs, TargetArgs};
use crate::output::{OutputFormat, format_bytes, print_change, print_info, print_json, print_stat, symbols, truncate_digest};

#[derive(Args, Debug)]
pub struct PlanArgs {
  #[command(flatten)]
  pub manifests: ManifestArgs,

  #[command(flatten)]
  pub target: TargetArgs,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

pub fn cmd_plan(args: PlanArgs) -> Result<()> {
  let manifests = args.manifests.load()?;
  let config = args.target.config();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt
    .block_on(async {
      let sdk_config = load_sdk_config(args.target.profile.as_deref()).await;
      let functions = LambdaFunctions::new(&sdk_config);
      let distributions = CloudFrontDistributions::new(&sdk_config);
      plan(&config, &manifests, &functions, &distributions).await
    })
    .context("Plan failed")?;

  if args.output.is_json() {
    return print_json(&result);
  }
  print_plan(&result);
  Ok(())
}

fn print_plan(plan: &ReconcilePlan) {
  print_stat("Function", &plan.function_name);
  print_stat("Digest", truncate_digest(plan.digest.as_str()));
  print_stat("Payload", &format_bytes(plan.payload_size as u64));
  println!();

  match &plan.function {
    FunctionPlan::Create => print_change(symbols::ADD, "create function and publish version 1"),
    FunctionPlan::Update => print_change(symbols::MODIFY, "update function code and publish a new version"),
    FunctionPlan::Publish => print_change(symbols::MODIFY, "publish the already uploaded code"),
    FunctionPlan::NoOp { version } => print_change(
      symbols::UNCHANGED,
      &format!("function unchanged (version {})", version.version),
    ),
  }

  match &plan.binding {
    BindingPlan::Unchanged => print_change(symbols::UNCHANGED, "distribution binding unchanged"),
    BindingPlan::Replace { current, target_arn } => {
      let target = target_arn.as_deref().unwrap_or("the new version");
      print_change(
        symbols::MODIFY,
        &format!("replace {} association(s) with {} {}", current, symbols::ARROW, target),
      );
    }
  }

  if plan.grant_permission {
    print_change(symbols::ADD, "grant edge invoke permission");
  }

  if let Some(path) = &plan.invalidation {
    print_change(symbols::ADD, &format!("invalidate {}", path));
  }

  println!();
  if plan.has_changes() {
    print_info("Run 'edgebind apply' to make these changes");
  } else {
    print_info("No changes would be made");
  }
}
