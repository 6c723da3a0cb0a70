//! Config command - show declared configuration

use crate::cli::stdout_logger;
use crate::context::BuildContext;
use crate::error::PakResult;

/// Execute the config command
pub fn execute(context: &BuildContext) -> PakResult<()> {
    let resolver = context.configuration_resolver();
    if resolver.configurations().is_empty() {
        println!("No configuration declared in buildpack.toml.");
        return Ok(());
    }

    resolver.log(&stdout_logger());
    Ok(())
}
