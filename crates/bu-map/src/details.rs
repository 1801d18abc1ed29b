use bu_model::{AdditionalDetailsConfig, DEFAULT_SEPARATOR, Record};

use crate::clean::sanitize_value;

/// Build the Additional Details value for one row.
///
/// Parts in order: fixed prefix, entity, lowercased company name, entity
/// column value, reference column value, fixed suffix. Empty parts are
/// skipped and the result is sanitized.
pub fn compose_additional_details(
    config: &AdditionalDetailsConfig,
    record: Record<'_>,
    company_name: &str,
    entity: &str,
) -> String {
    let column_value = |column: &Option<String>| {
        column
            .as_deref()
            .map(|name| record.value(name))
            .unwrap_or_default()
    };

    let company = company_name.to_lowercase();
    let candidates = [
        config.fixed_prefix.as_str(),
        if config.include_entity { entity } else { "" },
        if config.include_company { company.as_str() } else { "" },
        column_value(&config.entity_column),
        column_value(&config.reference_column),
        config.fixed_suffix.as_str(),
    ];

    let separator = if config.separator.is_empty() {
        DEFAULT_SEPARATOR
    } else {
        config.separator.as_str()
    };
    let joined = candidates
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator);
    sanitize_value(&joined)
}

#[cfg(test)]
mod tests {
    use bu_model::Dataset;

    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_rows(&["Ref", "Site"], &[&["PO-77", "North"], &["", ""]]).unwrap()
    }

    #[test]
    fn composes_parts_in_fixed_order() {
        let config = AdditionalDetailsConfig {
            include_company: true,
            include_entity: true,
            reference_column: Some("Ref".to_string()),
            entity_column: Some("Site".to_string()),
            fixed_prefix: "C2W".to_string(),
            fixed_suffix: "2024".to_string(),
            ..AdditionalDetailsConfig::default()
        };
        let data = dataset();
        let value = compose_additional_details(&config, data.record(0).unwrap(), "Acme Ltd", "ACM");
        assert_eq!(value, "C2W/ACM/acme ltd/North/PO-77/2024");
    }

    #[test]
    fn skips_empty_parts() {
        let config = AdditionalDetailsConfig {
            include_entity: true,
            reference_column: Some("Ref".to_string()),
            separator: " - ".to_string(),
            ..AdditionalDetailsConfig::default()
        };
        let data = dataset();
        let value = compose_additional_details(&config, data.record(1).unwrap(), "Acme", "ACM");
        assert_eq!(value, "ACM");
    }

    #[test]
    fn nothing_configured_is_empty() {
        let data = dataset();
        let value = compose_additional_details(
            &AdditionalDetailsConfig::default(),
            data.record(0).unwrap(),
            "Acme",
            "ACM",
        );
        assert_eq!(value, "");
    }
}
