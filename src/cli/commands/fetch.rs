//! Fetch command - download a dependency through the cache

use crate::cache::{DependencyCache, UriResolver};
use crate::cli::args::FetchArgs;
use crate::cli::stderr_logger;
use crate::context::BuildContext;
use crate::error::PakResult;
use crate::logger::Logger;
use std::path::PathBuf;

/// Execute the fetch command; the artifact path is the only stdout output
pub fn execute(args: FetchArgs, context: &BuildContext) -> PakResult<()> {
    let logger = stderr_logger();
    let dependency = super::resolve_dependency(context, &args.dependency, logger.clone())?;

    let cache = dependency_cache(context, args.download_dir, logger)?;
    let artifact = cache.artifact(&dependency, &[])?;

    println!("{}", artifact.path().display());
    Ok(())
}

/// Cache for `context`, optionally downloading into `download_dir`
pub(super) fn dependency_cache(
    context: &BuildContext,
    download_dir: Option<PathBuf>,
    logger: Logger,
) -> PakResult<DependencyCache> {
    match download_dir {
        Some(dir) => Ok(DependencyCache::new(
            context.buildpack_path.join("dependencies"),
            dir,
            &context.descriptor.user_agent(),
            logger,
        )?
        .with_uri_resolver(UriResolver::from_bindings(&context.bindings))),
        None => DependencyCache::from_context(context, logger),
    }
}
