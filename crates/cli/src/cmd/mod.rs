mod apply;
mod args;
mod package;
mod plan;
mod resolve;

pub use apply::{ApplyArgs, cmd_apply};
pub use package::{PackageArgs, cmd_package};
pub use plan::{PlanArgs, cmd_plan};
pub use resolve::{ResolveArgs, cmd_resolve};
