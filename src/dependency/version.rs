//! Version parsing and constraint matching
//!
//! Buildpack catalogues carry versions that are "mostly semver": `1.2`,
//! `v1.2.3` and `11.0.2.9` all appear in the wild. Versions are normalized
//! onto `semver::Version` before matching against a `semver::VersionReq`.
//!
//! Constraints follow the conventions catalogue authors expect rather than
//! Cargo's: a bare version such as `11.0.1` is an exact pin, comparators may
//! be separated by whitespace (`>=11.0.0 <12.0.0`) and `1.2 - 1.4` is an
//! inclusive range.

use crate::error::{PakError, PakResult};
use semver::{BuildMetadata, Version, VersionReq};
use std::fmt;

/// Parse a catalogue version leniently
///
/// Missing minor/patch components are padded with zero and a fourth numeric
/// component is kept as build metadata.
pub fn parse_version(raw: &str) -> PakResult<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    if let Ok(version) = Version::parse(trimmed) {
        return Ok(version);
    }

    let invalid = |reason: &str| PakError::InvalidVersion {
        version: raw.to_string(),
        reason: reason.to_string(),
    };

    // Split off pre-release / build suffixes before inspecting the numeric core
    let core_end = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(core_end);

    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid("expected 1 to 4 dot-separated numbers"));
    }

    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
        let n: u64 = part
            .parse()
            .map_err(|_| invalid("version components must be numeric"))?;
        numbers.push(n);
    }
    numbers.resize(4, 0);

    let normalized = format!("{}.{}.{}{}", numbers[0], numbers[1], numbers[2], suffix);
    let mut version = Version::parse(&normalized).map_err(|e| invalid(&e.to_string()))?;

    if parts.len() == 4 && version.build.is_empty() {
        version.build = BuildMetadata::new(parts[3]).map_err(|e| invalid(&e.to_string()))?;
    }

    Ok(version)
}

/// A parsed version range; `||` separates alternatives
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionConstraint {
    /// Parse a constraint; an empty string matches everything
    pub fn parse(raw: &str) -> PakResult<Self> {
        let trimmed = raw.trim();
        let source = if trimmed.is_empty() { "*" } else { trimmed };

        let invalid = |reason: String| PakError::InvalidConstraint {
            constraint: raw.to_string(),
            reason,
        };

        let alternatives = source
            .split("||")
            .map(|alt| {
                let normalized = normalize_alternative(alt).map_err(invalid)?;
                VersionReq::parse(&normalized).map_err(|e| invalid(e.to_string()))
            })
            .collect::<PakResult<Vec<_>>>()?;

        Ok(Self {
            raw: source.to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

const OPERATORS: [&str; 7] = [">=", "<=", ">", "<", "=", "~", "^"];

/// Rewrite one `||` alternative into `semver::VersionReq` syntax
fn normalize_alternative(alt: &str) -> Result<String, String> {
    // Operators written apart from their version (`>= 1.2`) are rejoined
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in alt.split([' ', '\t', ',']).filter(|t| !t.is_empty()) {
        if let Some(op) = OPERATORS.iter().find(|op| **op == token) {
            if pending_op.is_some() {
                return Err(format!("unexpected operator '{}'", token));
            }
            pending_op = Some(*op);
            continue;
        }
        match pending_op.take() {
            Some(op) => tokens.push(format!("{}{}", op, token)),
            None => tokens.push(token.to_string()),
        }
    }
    if let Some(op) = pending_op {
        return Err(format!("operator '{}' has no version", op));
    }
    if tokens.is_empty() {
        return Ok("*".to_string());
    }

    let mut comparators = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        if tokens.get(index + 1).map(String::as_str) == Some("-") {
            let Some(upper) = tokens.get(index + 2) else {
                return Err("range is missing an upper bound".to_string());
            };
            comparators.push(format!(">={}", strip_v(&tokens[index])));
            comparators.push(format!("<={}", strip_v(upper)));
            index += 3;
            continue;
        }
        comparators.push(pin_bare(&tokens[index]));
        index += 1;
    }
    Ok(comparators.join(", "))
}

/// A comparator without an operator is an exact match
fn pin_bare(comparator: &str) -> String {
    let version = strip_v(comparator);
    let bare = version.starts_with(|c: char| c.is_ascii_digit());
    let wildcard = version
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"));
    if bare && !wildcard {
        format!("={}", version)
    } else {
        version.to_string()
    }
}

fn strip_v(comparator: &str) -> &str {
    match comparator.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => comparator,
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
