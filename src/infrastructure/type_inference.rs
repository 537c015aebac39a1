use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{
    error::InferenceError,
    field_mapping::{FieldMapping, FieldMappings, SqlType},
    raw_table::RawTable,
    settings::Settings,
    validation::ValidationReport,
};

struct TypePredicate {
    sql_type: SqlType,
    pattern: Regex,
}

fn predicate(sql_type: SqlType, pattern: &str) -> TypePredicate {
    TypePredicate {
        sql_type,
        pattern: Regex::new(pattern).expect("type predicate pattern should compile"),
    }
}

/// Checked in order; the first type reaching the threshold wins, so narrower
/// types must stay ahead of the ones that would also accept their values.
static TYPE_PREDICATES: LazyLock<[TypePredicate; 6]> = LazyLock::new(|| {
    [
        predicate(SqlType::Integer, r"^[-+]?[0-9]+$"),
        predicate(SqlType::Decimal, DECIMAL_PATTERN),
        predicate(
            SqlType::Boolean,
            r"(?i)^(true|false|yes|no|y|n|t|f|on|off)$",
        ),
        predicate(
            SqlType::DateTime,
            r"^[0-9]{4}-[0-9]{2}-[0-9]{2}[T ][0-9]{2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?(Z|[+-][0-9]{2}:?[0-9]{2})?$",
        ),
        predicate(
            SqlType::Date,
            r"^([0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{1,2}/[0-9]{1,2}/[0-9]{4})$",
        ),
        predicate(SqlType::Email, EMAIL_PATTERN),
    ]
});

const DECIMAL_PATTERN: &str = r"^[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?$";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static NUMERIC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DECIMAL_PATTERN).expect("decimal pattern should compile"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern should compile"));
static NON_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9_\p{Han}]+").expect("identifier pattern should compile")
});
static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("underscore pattern should compile"));

/// Infers one mapping per header from the column contents.
pub fn infer(table: &RawTable, settings: &Settings) -> Result<FieldMappings, InferenceError> {
    if table.headers.is_empty() {
        return Err(InferenceError::NoHeaders);
    }

    let mappings = table
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| infer_column(table, index, header, settings))
        .collect::<Vec<_>>();

    Ok(FieldMappings::new(mappings))
}

fn infer_column(table: &RawTable, index: usize, header: &str, settings: &Settings) -> FieldMapping {
    let values = table.column_values(index).collect::<Vec<_>>();
    let non_empty = values
        .iter()
        .copied()
        .filter(|value| !value.trim().is_empty())
        .collect::<Vec<_>>();

    let nullable = non_empty.len() < values.len();
    let max_length = values
        .iter()
        .map(|value| value.chars().count())
        .max()
        .unwrap_or(0);

    let mut sample_values: Vec<String> = Vec::new();
    for value in non_empty.iter().take(settings.sample_size) {
        if sample_values.len() >= settings.sample_value_count {
            break;
        }
        if !sample_values.iter().any(|sample| sample.as_str() == *value) {
            sample_values.push((*value).to_string());
        }
    }

    let (sql_type, confidence) = classify(&non_empty, max_length, settings);
    debug!(header, %sql_type, confidence, "inferred column type");

    FieldMapping {
        source_header: header.to_string(),
        column_index: index,
        sanitized_name: sanitize_name(header, index, settings),
        sql_type,
        confidence,
        nullable,
        max_length,
        sample_values,
    }
}

fn classify(non_empty: &[&str], max_length: usize, settings: &Settings) -> (SqlType, f64) {
    if non_empty.is_empty() {
        return (SqlType::ShortText, 0.0);
    }

    let total = non_empty.len() as f64;
    let ratio = |pattern: &Regex| {
        non_empty
            .iter()
            .filter(|value| pattern.is_match(value.trim()))
            .count() as f64
            / total
    };

    for candidate in TYPE_PREDICATES.iter() {
        let matched = ratio(&candidate.pattern);
        if matched >= settings.inference_threshold {
            return (candidate.sql_type, matched);
        }
    }

    let email_ratio = ratio(&*EMAIL);
    if email_ratio >= 0.5 {
        return (SqlType::Email, email_ratio);
    }
    if max_length > settings.short_text_max_length {
        (SqlType::LongText, 1.0)
    } else {
        (SqlType::ShortText, 1.0)
    }
}

/// Turns a header into a lower-case SQL identifier.
pub fn sanitize_name(header: &str, index: usize, settings: &Settings) -> String {
    let lowered = header.trim().to_lowercase();
    let replaced = NON_IDENTIFIER.replace_all(&lowered, "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    let name = collapsed
        .trim_matches('_')
        .chars()
        .take(settings.max_identifier_length)
        .collect::<String>();
    let name = name.trim_end_matches('_').to_string();

    if name.is_empty() {
        format!("column_{}", index + 1)
    } else {
        name
    }
}

/// True for plain integer or decimal literals that can go into SQL unquoted.
pub fn is_numeric_literal(value: &str) -> bool {
    NUMERIC_LITERAL.is_match(value.trim())
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "t" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "f" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Checks a mapping set before generation. Never fails; the caller decides
/// what to do with the report.
pub fn validate_mappings(mappings: &FieldMappings, settings: &Settings) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for mapping in mappings {
        let name = mapping.sanitized_name.as_str();
        if let Some(first_header) = seen.insert(name, &mapping.source_header) {
            errors.push(format!(
                "Duplicate column name `{name}` from headers `{first_header}` and `{}`",
                mapping.source_header
            ));
        }

        let length = name.chars().count();
        if length > settings.max_identifier_length {
            errors.push(format!(
                "Column name `{name}` is {length} characters, above the limit of {}",
                settings.max_identifier_length
            ));
        }

        if mapping.confidence < settings.low_confidence_threshold {
            warn!(
                header = %mapping.source_header,
                confidence = mapping.confidence,
                "low confidence type mapping"
            );
            warnings.push(format!(
                "Low confidence ({:.0}%) for `{}` as {}",
                mapping.confidence * 100.0,
                mapping.source_header,
                mapping.sql_type
            ));
        }
    }

    ValidationReport::from_findings(errors, warnings)
}
