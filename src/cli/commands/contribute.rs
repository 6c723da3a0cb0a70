//! Contribute command - install a dependency into a layer

use crate::cli::args::ContributeArgs;
use crate::cli::stdout_logger;
use crate::context::BuildContext;
use crate::error::PakResult;
use crate::layer::{contribute_layer, DependencyLayer, HelperLayer, LayerTypes};
use tracing::info;

/// Execute the contribute command
pub fn execute(args: ContributeArgs, context: &BuildContext) -> PakResult<()> {
    let logger = stdout_logger();
    let buildpack = &context.descriptor.buildpack;
    logger.title(&buildpack.name, &buildpack.version, buildpack.homepage.as_deref());
    context.configuration_resolver().log(&logger);

    let dependency = super::resolve_dependency(context, &args.dependency, logger.clone())?;
    let cache = super::fetch::dependency_cache(context, args.download_dir, logger.clone())?;

    // No type flags means launch-only
    let types = if args.build || args.cache || args.launch {
        LayerTypes::new(args.build, args.cache, args.launch)
    } else {
        LayerTypes::launch_only()
    };

    let layer = DependencyLayer::new(dependency, &cache, types, logger.clone())?;
    let written = contribute_layer(&context.layers, &layer)?;
    info!("Wrote {}", written.metadata_path.display());

    if !args.helper.is_empty() {
        let helper = HelperLayer::new(&context.buildpack_path, buildpack, args.helper, logger);
        let written = contribute_layer(&context.layers, &helper)?;
        info!("Wrote {}", written.metadata_path.display());
    }
    Ok(())
}
