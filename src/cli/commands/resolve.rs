//! Resolve command - select a dependency version

use crate::cache::redact_uri;
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::cli::stderr_logger;
use crate::context::BuildContext;
use crate::dependency::DependencyMetadata;
use crate::error::PakResult;
use console::style;

/// Execute the resolve command
pub fn execute(args: ResolveArgs, context: &BuildContext) -> PakResult<()> {
    let dependency = super::resolve_dependency(context, &args.dependency, stderr_logger())?;

    match args.format {
        OutputFormat::Table => print_table(&dependency),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dependency)?),
        OutputFormat::Plain => println!("{}", dependency.version),
    }
    Ok(())
}

fn print_table(dependency: &DependencyMetadata) {
    let stacks = if dependency.stacks.is_empty() {
        "*".to_string()
    } else {
        dependency.stacks.join(", ")
    };
    let checksum = dependency
        .checksum
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| style("none").dim().to_string());

    let mut rows = vec![
        ("ID", dependency.id.clone()),
        ("NAME", dependency.name.clone()),
        ("VERSION", style(&dependency.version).green().to_string()),
        ("URI", redact_uri(&dependency.uri)),
        ("CHECKSUM", checksum),
        ("STACKS", stacks),
    ];
    if !dependency.arch.is_empty() {
        rows.push(("ARCH", dependency.arch.clone()));
    }
    if let Some(date) = dependency.deprecation_date {
        rows.push(("DEPRECATED", date.format("%Y-%m-%d").to_string()));
    }

    for (key, value) in rows {
        println!("{:<12} {}", key, value);
    }
}
