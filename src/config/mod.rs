//! Configuration resolution
//!
//! Buildpack settings are environment variables with declared defaults. The
//! environment is consulted on every call, never snapshotted.

pub mod schema;

pub use schema::{BuildpackDescriptor, BuildpackInfo, BuildpackMetadata, ConfigurationParameter};

use crate::logger::Logger;
use std::env;

/// Resolves declared configuration parameters against the live environment
#[derive(Debug, Clone, Default)]
pub struct ConfigurationResolver {
    configurations: Vec<ConfigurationParameter>,
}

struct Entry<'a> {
    name: &'a str,
    value: String,
    description: &'a str,
}

impl ConfigurationResolver {
    /// Create a resolver; parameters are kept sorted by name
    pub fn new(mut configurations: Vec<ConfigurationParameter>) -> Self {
        configurations.sort_by(|a, b| a.name.cmp(&b.name));
        Self { configurations }
    }

    pub fn configurations(&self) -> &[ConfigurationParameter] {
        &self.configurations
    }

    /// Value of `name` and whether it was explicitly set in the environment
    ///
    /// Falls back to the declared default, or an empty string when `name` is
    /// not declared at all.
    pub fn resolve(&self, name: &str) -> (String, bool) {
        if let Ok(value) = env::var(name) {
            return (value, true);
        }

        let default = self
            .configurations
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.default.clone())
            .unwrap_or_default();
        (default, false)
    }

    /// Boolean value of `name`; anything unparseable is false
    pub fn resolve_bool(&self, name: &str) -> bool {
        let (value, _) = self.resolve(name);
        parse_bool(&value).unwrap_or(false)
    }

    /// Print build, launch and unknown-purpose parameters with resolved values
    pub fn log(&self, logger: &Logger) {
        let mut build = Vec::new();
        let mut launch = Vec::new();
        let mut unknown = Vec::new();
        let mut name_width = 0;
        let mut value_width = 0;

        for config in &self.configurations {
            let (value, _) = self.resolve(&config.name);
            name_width = name_width.max(config.name.len());
            value_width = value_width.max(value.len());

            let entry = || Entry {
                name: &config.name,
                value: value.clone(),
                description: &config.description,
            };
            if config.build {
                build.push(entry());
            }
            if config.launch {
                launch.push(entry());
            }
            if !config.build && !config.launch {
                unknown.push(entry());
            }
        }

        for (title, entries) in [
            ("Build Configuration:", build),
            ("Launch Configuration:", launch),
            ("Unknown Configuration:", unknown),
        ] {
            if entries.is_empty() {
                continue;
            }
            logger.header(title);
            for e in entries {
                let line = format!(
                    "${:<nw$}  {:<vw$}  {}",
                    e.name,
                    e.value,
                    e.description,
                    nw = name_width,
                    vw = value_width
                );
                logger.body(line.trim_end());
            }
        }
    }
}

/// Parse the canonical boolean literals
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
