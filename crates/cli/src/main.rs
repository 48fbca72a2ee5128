use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use cmd::{ApplyArgs, PackageArgs, PlanArgs, ResolveArgs, cmd_apply, cmd_package, cmd_plan, cmd_resolve};
use output::print_error;

/// edgebind - deploy a build's routing table to an edge function
#[derive(Parser)]
#[command(name = "edgebind")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Deploy the routing function and bind it to the distribution
  Apply(ApplyArgs),

  /// Show what apply would change, without changing anything
  Plan(PlanArgs),

  /// Build the deployable archive locally
  Package(PackageArgs),

  /// Show how request URIs would be rewritten
  Resolve(ResolveArgs),
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose {
    "warn,edgebind=debug,edgebind_lib=debug"
  } else {
    "warn,edgebind=info,edgebind_lib=info"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Apply(args) => cmd_apply(args),
    Commands::Plan(args) => cmd_plan(args),
    Commands::Package(args) => cmd_package(args),
    Commands::Resolve(args) => cmd_resolve(args),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
