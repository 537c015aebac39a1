use serde::Serialize;

/// A line that was skipped or reshaped while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowWarning {
    /// 1-based line number in the source text.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub original_line_count: usize,
    pub processed_rows: usize,
    pub skipped_rows: usize,
    /// Rows dropped by the row ceiling.
    pub truncated_rows: usize,
    pub has_header: bool,
    pub max_column_count: usize,
}

/// Parsed tabular text. Every row holds at least `headers.len()` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: char,
    pub encoding: String,
    pub warnings: Vec<RowWarning>,
    pub metadata: TableMetadata,
}

impl RawTable {
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.headers.len()
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }
}
