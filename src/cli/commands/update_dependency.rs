//! Update-dependency command - rewrite catalogue entries in buildpack.toml
//!
//! Edits go through `toml_edit` so comments, ordering and formatting of the
//! rest of the file are left alone.

use crate::cli::args::UpdateDependencyArgs;
use crate::dependency::{parse_version, Checksum, VersionConstraint};
use crate::error::{PakError, PakResult};
use console::style;
use std::fs;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Value};

/// New values for matching `[[metadata.dependencies]]` entries
#[derive(Debug, Clone)]
pub struct DependencyUpdate {
    pub id: String,
    pub constraint: VersionConstraint,
    pub version: String,
    pub uri: Option<String>,
    pub checksum: Option<Checksum>,
}

impl DependencyUpdate {
    pub fn from_args(args: &UpdateDependencyArgs) -> PakResult<Self> {
        parse_version(&args.new_version)?;
        Ok(Self {
            id: args.id.clone(),
            constraint: VersionConstraint::parse(&args.version_constraint)?,
            version: args.new_version.clone(),
            uri: args.uri.clone(),
            checksum: args.checksum.as_deref().map(str::parse::<Checksum>).transpose()?,
        })
    }
}

/// Execute the update-dependency command
pub fn execute(args: UpdateDependencyArgs, buildpack: &Path) -> PakResult<()> {
    let update = DependencyUpdate::from_args(&args)?;
    let path = args
        .file
        .unwrap_or_else(|| buildpack.join("buildpack.toml"));

    let content = fs::read_to_string(&path)
        .map_err(|e| PakError::io(format!("reading {}", path.display()), e))?;
    let (updated, count) = update_dependencies(&content, &update)?;
    if count == 0 {
        return Err(PakError::User(format!(
            "No dependency {} matching {} in {}",
            update.id,
            update.constraint,
            path.display()
        )));
    }

    fs::write(&path, updated)
        .map_err(|e| PakError::io(format!("writing {}", path.display()), e))?;
    println!(
        "{} {} {} to {} in {}",
        style("Updated").green(),
        count,
        if count == 1 { "entry" } else { "entries" },
        style(&update.version).bold(),
        path.display()
    );
    Ok(())
}

/// Apply `update` to every matching entry, returning the new document and
/// the number of entries changed
pub fn update_dependencies(content: &str, update: &DependencyUpdate) -> PakResult<(String, usize)> {
    let mut document: DocumentMut = content.parse()?;

    let Some(dependencies) = document
        .get_mut("metadata")
        .and_then(|m| m.get_mut("dependencies"))
    else {
        return Ok((document.to_string(), 0));
    };
    let dependencies = dependencies.as_array_of_tables_mut().ok_or_else(|| {
        PakError::metadata("[metadata]", "dependencies must be an array of tables")
    })?;

    let mut count = 0;
    for entry in dependencies.iter_mut() {
        if entry.get("id").and_then(Item::as_str) != Some(update.id.as_str()) {
            continue;
        }
        let Some(old_version) = entry.get("version").and_then(Item::as_str).map(str::to_string)
        else {
            return Err(PakError::metadata(
                format!("dependency {}", update.id),
                "missing version",
            ));
        };
        if !update.constraint.matches(&parse_version(&old_version)?) {
            continue;
        }

        entry["version"] = toml_edit::value(update.version.as_str());
        if let Some(uri) = &update.uri {
            entry["uri"] = toml_edit::value(uri.as_str());
        }
        if let Some(checksum) = &update.checksum {
            entry["checksum"] = toml_edit::value(checksum.to_string());
        }
        if let Some(purl) = entry.get_mut("purl").and_then(Item::as_value_mut) {
            replace_version(purl, &old_version, &update.version);
        }
        if let Some(cpes) = entry.get_mut("cpes").and_then(Item::as_array_mut) {
            for cpe in cpes.iter_mut() {
                replace_version(cpe, &old_version, &update.version);
            }
        }
        count += 1;
    }

    Ok((document.to_string(), count))
}

/// Swap `old` for `new` inside a string value, keeping its surrounding whitespace
fn replace_version(value: &mut Value, old: &str, new: &str) {
    let Some(current) = value.as_str() else {
        return;
    };
    if !current.contains(old) {
        return;
    }
    let decor = value.decor().clone();
    *value = Value::from(current.replace(old, new));
    *value.decor_mut() = decor;
}
