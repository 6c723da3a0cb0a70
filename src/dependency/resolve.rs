//! Dependency resolution
//!
//! Picks the best catalogue entry for an id and version constraint:
//! 1. filter by id, version constraint, stack and architecture
//! 2. take the highest version, earliest catalogue entry on ties
//! 3. warn when the chosen entry is deprecated or about to be

use crate::dependency::metadata::DependencyMetadata;
use crate::dependency::version::{parse_version, VersionConstraint};
use crate::error::{PakError, PakResult};
use crate::logger::Logger;
use chrono::{DateTime, Duration, Utc};
use semver::Version;
use std::env;

/// Environment variable overriding the detected architecture
pub const ARCH_ENV: &str = "BP_ARCH";

/// How far ahead an end-of-life date triggers a "soon deprecated" notice
pub const DEPRECATION_WINDOW_DAYS: i64 = 30;

/// Architecture used to filter catalogue entries (`amd64`, `arm64`, ...)
pub fn architecture() -> String {
    match env::var(ARCH_ENV) {
        Ok(arch) if !arch.trim().is_empty() => arch.trim().to_string(),
        _ => normalize_arch(env::consts::ARCH),
    }
}

/// Map Rust target architecture names onto the names used in catalogues
pub fn normalize_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" => "386".to_string(),
        other => other.to_string(),
    }
}

/// Deprecation state of a dependency relative to a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deprecation {
    /// No end-of-life date, or more than the warning window away
    Supported,
    /// End of life within the warning window
    Soon,
    /// End of life reached
    Deprecated,
}

impl Deprecation {
    pub fn evaluate(end_of_life: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match end_of_life {
            None => Self::Supported,
            Some(eol) if eol <= now => Self::Deprecated,
            Some(eol) if eol <= now + Duration::days(DEPRECATION_WINDOW_DAYS) => Self::Soon,
            Some(_) => Self::Supported,
        }
    }
}

/// Resolves dependency requests against a catalogue for one stack
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    dependencies: Vec<DependencyMetadata>,
    /// `None` disables stack filtering
    stack: Option<String>,
    arch: String,
    logger: Logger,
}

impl DependencyResolver {
    /// Create a resolver for `stack`, using the detected architecture
    pub fn new(dependencies: Vec<DependencyMetadata>, stack: impl Into<String>, logger: Logger) -> Self {
        Self {
            dependencies,
            stack: Some(stack.into()),
            arch: architecture(),
            logger,
        }
    }

    /// Accept entries regardless of their declared stacks
    ///
    /// Used when the platform does not name a target stack.
    pub fn without_stack_filter(mut self) -> Self {
        self.stack = None;
        self
    }

    /// Override the architecture entries are matched against
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn dependencies(&self) -> &[DependencyMetadata] {
        &self.dependencies
    }

    /// Resolve the highest matching version of `id`
    ///
    /// An empty constraint matches every version.
    pub fn resolve(&self, id: &str, constraint: &str) -> PakResult<DependencyMetadata> {
        let constraint = VersionConstraint::parse(constraint)?;

        let mut best: Option<(Version, &DependencyMetadata)> = None;
        for candidate in self.candidates(id, &constraint)? {
            // Strictly greater keeps the earliest entry among equal versions
            if best.as_ref().map_or(true, |(v, _)| candidate.0 > *v) {
                best = Some(candidate);
            }
        }

        let Some((_, dependency)) = best else {
            return Err(PakError::NoValidDependency {
                id: id.to_string(),
                constraint: constraint.to_string(),
                platform: self.stack.clone().unwrap_or_else(|| "any stack".to_string()),
                candidates: self.describe_catalogue(),
            });
        };

        self.logger.debug(format!(
            "Resolved {} {} to {}",
            id, constraint, dependency.version
        ));
        self.warn_if_deprecated(dependency, Utc::now());
        Ok(dependency.clone())
    }

    /// Whether any entry satisfies `id` and `constraint`
    pub fn any(&self, id: &str, constraint: &str) -> bool {
        match VersionConstraint::parse(constraint) {
            Ok(constraint) => self
                .candidates(id, &constraint)
                .map(|c| !c.is_empty())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn candidates(
        &self,
        id: &str,
        constraint: &VersionConstraint,
    ) -> PakResult<Vec<(Version, &DependencyMetadata)>> {
        let mut matched = Vec::new();
        for dependency in &self.dependencies {
            if dependency.id != id {
                continue;
            }
            if let Some(stack) = &self.stack {
                if !dependency.supports_stack(stack) {
                    continue;
                }
            }
            if !dependency.arch.is_empty() && dependency.arch != self.arch {
                continue;
            }
            let version = parse_version(&dependency.version)?;
            if constraint.matches(&version) {
                matched.push((version, dependency));
            }
        }
        Ok(matched)
    }

    fn describe_catalogue(&self) -> String {
        self.dependencies
            .iter()
            .map(|d| format!("({}, {}, [{}])", d.id, d.version, d.stacks.join(", ")))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn warn_if_deprecated(&self, dependency: &DependencyMetadata, now: DateTime<Utc>) {
        let Some(eol) = dependency.deprecation_date else {
            return;
        };
        let date = eol.format("%Y-%m-%d");
        match Deprecation::evaluate(Some(eol), now) {
            Deprecation::Deprecated => {
                self.logger.header(format!(
                    "{} Version {} of {} is deprecated.",
                    self.logger.yellow("Deprecation Notice:"),
                    dependency.version,
                    dependency.name
                ));
                self.logger.body(format!(
                    "Migrate your application to a supported version of {}.",
                    dependency.name
                ));
            }
            Deprecation::Soon => {
                self.logger.header(format!(
                    "{} Version {} of {} will be deprecated after {}.",
                    self.logger.yellow("Deprecation Notice:"),
                    dependency.version,
                    dependency.name,
                    date
                ));
                self.logger.body(format!(
                    "Migrate your application to a supported version of {} before this time.",
                    dependency.name
                ));
            }
            Deprecation::Supported => {}
        }
    }
}
