use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SqlType {
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Email,
    ShortText,
    LongText,
}

impl SqlType {
    pub fn as_str(self) -> &'static str {
        match self {
            SqlType::Integer => "integer",
            SqlType::Decimal => "decimal",
            SqlType::Boolean => "boolean",
            SqlType::Date => "date",
            SqlType::DateTime => "datetime",
            SqlType::Email => "email",
            SqlType::ShortText => "shortText",
            SqlType::LongText => "longText",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, SqlType::Integer | SqlType::Decimal)
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred target column for one source header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMapping {
    pub source_header: String,
    pub column_index: usize,
    pub sanitized_name: String,
    pub sql_type: SqlType,
    pub confidence: f64,
    pub nullable: bool,
    pub max_length: usize,
    pub sample_values: Vec<String>,
}

/// One mapping per source header, in header order. Duplicate headers are kept
/// so validation can report them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldMappings(Vec<FieldMapping>);

impl FieldMappings {
    pub fn new(mappings: Vec<FieldMapping>) -> Self {
        Self(mappings)
    }

    pub fn get(&self, header: &str) -> Option<&FieldMapping> {
        self.0.iter().find(|mapping| mapping.source_header == header)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldMapping> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldMappings {
    type Item = &'a FieldMapping;
    type IntoIter = std::slice::Iter<'a, FieldMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
