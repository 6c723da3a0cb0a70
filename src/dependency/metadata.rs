//! Dependency catalogue entries
//!
//! Each `[[metadata.dependencies]]` table in `buildpack.toml` describes one
//! installable artifact. Entries are parsed once at startup and never mutated.

use crate::dependency::checksum::Checksum;
use crate::error::{PakError, PakResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token in a stack list meaning "any stack"
pub const ANY_STACK: &str = "*";

/// One entry in a buildpack's dependency catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyMetadata {
    /// Catalogue key, e.g. `jre`
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    pub version: String,

    /// `http(s)://` or `file://` source
    pub uri: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_checksum"
    )]
    pub checksum: Option<Checksum>,

    /// Compatible stacks; empty or containing `*` means all
    #[serde(default, alias = "platforms")]
    pub stacks: Vec<String>,

    /// Required architecture; empty means any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arch: String,

    #[serde(default)]
    pub licenses: Vec<License>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub purl: String,

    #[serde(default)]
    pub cpes: Vec<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub deprecation_date: Option<DateTime<Utc>>,
}

/// A license reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "type", default)]
    pub license_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

impl DependencyMetadata {
    /// Whether this entry can be installed on `stack`
    ///
    /// Only the entry's own stack list can make it universal, either by being
    /// empty or by containing `*`.
    pub fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.is_empty() || self.stacks.iter().any(|s| s == ANY_STACK || s == stack)
    }

    /// Equality that ignores sub-second differences in the deprecation date
    ///
    /// Sidecar files store whole seconds, so a value that went through disk must
    /// still compare equal to its in-memory original.
    pub fn equivalent(&self, other: &Self) -> bool {
        let mut left = self.clone();
        let mut right = other.clone();
        left.deprecation_date = left.deprecation_date.map(truncate_to_seconds);
        right.deprecation_date = right.deprecation_date.map(truncate_to_seconds);
        left == right
    }

    /// Serialized form used as expected layer metadata
    pub fn to_table(&self) -> PakResult<toml::Table> {
        match toml::Value::try_from(self)? {
            toml::Value::Table(table) => Ok(table),
            other => Err(PakError::metadata(
                format!("dependency {}", self.id),
                format!("expected a table, got {}", other.type_str()),
            )),
        }
    }

    /// Short `id@version` form for log lines
    pub fn label(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }
}

/// Drop sub-second precision
pub fn truncate_to_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Parse a timestamp in any of the forms found in buildpack descriptors
///
/// Accepts RFC 3339, an offset-less date-time (taken as UTC) and a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a TOML value holding a timestamp, either native or as a string
pub fn timestamp_from_value(value: &toml::Value) -> Option<DateTime<Utc>> {
    match value {
        toml::Value::Datetime(datetime) => parse_timestamp(&datetime.to_string()),
        toml::Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(time) => serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => serializer.serialize_none(),
    }
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<toml::Value>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(toml::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => timestamp_from_value(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid deprecation_date {}", value))),
    }
}

fn deserialize_checksum<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Checksum>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(s) if !s.trim().is_empty() => s.parse().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
