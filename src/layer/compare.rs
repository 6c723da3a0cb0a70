//! Layer metadata comparison
//!
//! Metadata read back from `<name>.toml` stores `dependency.deprecation_date`
//! as a string or a native TOML datetime, while freshly built metadata holds
//! whatever `DependencyMetadata::to_table` produced. Both sides are brought to
//! a whole-second UTC timestamp before the tables are compared.

use crate::dependency::metadata::{timestamp_from_value, truncate_to_seconds};
use crate::error::{PakError, PakResult};
use chrono::SecondsFormat;

const DEPENDENCY_KEY: &str = "dependency";
const DEPRECATION_DATE_KEY: &str = "deprecation_date";

/// Whether `expected` and `actual` describe the same layer contents
pub fn metadata_matches(expected: &toml::Table, actual: &toml::Table) -> PakResult<bool> {
    Ok(normalize(expected)? == normalize(actual)?)
}

fn normalize(metadata: &toml::Table) -> PakResult<toml::Table> {
    let mut metadata = metadata.clone();
    let Some(toml::Value::Table(dependency)) = metadata.get_mut(DEPENDENCY_KEY) else {
        return Ok(metadata);
    };
    let Some(value) = dependency.get_mut(DEPRECATION_DATE_KEY) else {
        return Ok(metadata);
    };

    let time = timestamp_from_value(value).ok_or_else(|| {
        PakError::MetadataCompare(format!(
            "unexpected {}.{} value {}",
            DEPENDENCY_KEY, DEPRECATION_DATE_KEY, value
        ))
    })?;
    *value = toml::Value::String(
        truncate_to_seconds(time).to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(source: &str) -> toml::Table {
        source.parse().unwrap()
    }

    #[test]
    fn plain_tables() {
        let a = table("a = 1\n[b]\nc = 'd'");
        assert!(metadata_matches(&a, &a).unwrap());
        assert!(!metadata_matches(&a, &table("a = 2\n[b]\nc = 'd'")).unwrap());
        assert!(!metadata_matches(&a, &toml::Table::new()).unwrap());
    }

    #[test]
    fn native_and_string_dates_compare_equal() {
        let native = table("[dependency]\nid = 'jre'\ndeprecation_date = 2030-01-02T03:04:05Z");
        let string = table("[dependency]\nid = 'jre'\ndeprecation_date = '2030-01-02T03:04:05.250+00:00'");
        assert!(metadata_matches(&native, &string).unwrap());
    }

    #[test]
    fn offset_is_converted_to_utc() {
        let utc = table("[dependency]\ndeprecation_date = '2030-01-02T03:04:05Z'");
        let offset = table("[dependency]\ndeprecation_date = '2030-01-02T05:04:05+02:00'");
        assert!(metadata_matches(&utc, &offset).unwrap());
    }

    #[test]
    fn different_dates_do_not_match() {
        let a = table("[dependency]\ndeprecation_date = '2030-01-02T03:04:05Z'");
        let b = table("[dependency]\ndeprecation_date = '2031-01-02T03:04:05Z'");
        assert!(!metadata_matches(&a, &b).unwrap());
    }

    #[test]
    fn unrecognized_date_is_an_error() {
        let a = table("[dependency]\ndeprecation_date = 42");
        let err = metadata_matches(&a, &a).unwrap_err();
        assert!(matches!(err, PakError::MetadataCompare(_)));
        assert!(err.to_string().starts_with("unable to compare metadata"));
    }

    #[test]
    fn date_outside_dependency_is_untouched() {
        let a = table("deprecation_date = 42");
        assert!(metadata_matches(&a, &a).unwrap());
    }
}
