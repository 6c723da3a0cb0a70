//! CLI command implementations

pub mod config;
pub mod contribute;
pub mod fetch;
pub mod resolve;
pub mod update_dependency;

pub use config::execute as config;
pub use contribute::execute as contribute;
pub use fetch::execute as fetch;
pub use resolve::execute as resolve;
pub use update_dependency::execute as update_dependency;

use crate::cli::args::DependencyArgs;
use crate::context::BuildContext;
use crate::dependency::DependencyMetadata;
use crate::error::PakResult;
use crate::logger::Logger;

/// Resolve the dependency selected on the command line
fn resolve_dependency(
    context: &BuildContext,
    args: &DependencyArgs,
    logger: Logger,
) -> PakResult<DependencyMetadata> {
    let mut resolver = context.dependency_resolver(logger);
    if let Some(arch) = &args.arch {
        resolver = resolver.with_arch(arch.clone());
    }
    resolver.resolve(&args.id, &args.constraint)
}
