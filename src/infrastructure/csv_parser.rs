use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{
    error::InputError,
    raw_table::{RawTable, RowWarning, TableMetadata},
    settings::Settings,
};

const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];
const BOM: char = '\u{feff}';
/// UTF-8 BOM bytes that were decoded one byte per character.
const BOM_BYTES_AS_TEXT: &str = "\u{ef}\u{bb}\u{bf}";

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// `None` detects the delimiter from the first line.
    pub delimiter: Option<char>,
    pub has_header: bool,
    pub encoding_label: String,
    pub skip_empty_lines: bool,
    pub trim_values: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            encoding_label: "UTF-8".to_string(),
            skip_empty_lines: true,
            trim_values: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

/// Delimited-text parser working on a fully buffered input.
pub struct CsvParser {
    options: ParseOptions,
    max_rows: usize,
    max_input_bytes: usize,
}

impl CsvParser {
    pub fn new(options: ParseOptions, settings: &Settings) -> Self {
        Self {
            options,
            max_rows: settings.max_rows,
            max_input_bytes: settings.max_input_bytes,
        }
    }

    /// Parse text into a table. Malformed data lines are skipped and recorded
    /// as warnings; only empty input, a missing header or an oversized input
    /// fail.
    pub fn parse(&self, text: &str) -> Result<RawTable, InputError> {
        if text.len() > self.max_input_bytes {
            return Err(InputError::TooLarge {
                size: text.len(),
                limit: self.max_input_bytes,
            });
        }

        let text = strip_bom(text);
        if text.trim().is_empty() {
            return Err(InputError::Empty);
        }

        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let all_lines = normalized.lines().collect::<Vec<_>>();
        let original_line_count = all_lines.len();

        let mut lines = all_lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(_, line)| !self.options.skip_empty_lines || !line.trim().is_empty());

        let (first_line_no, first_line) = lines.next().ok_or(InputError::Empty)?;
        let delimiter = self
            .options
            .delimiter
            .unwrap_or_else(|| detect_delimiter(first_line));
        debug!(delimiter = ?delimiter, "parsing delimited text");

        let first_fields = tokenize_line(first_line, delimiter, self.options.trim_values)
            .map_err(|error| InputError::NoHeaders(format!("line {first_line_no}: {error}")))?;

        let mut collector = RowCollector::new(first_fields.len(), self.max_rows);
        if self.options.has_header {
            if first_fields.iter().all(|field| field.trim().is_empty()) {
                return Err(InputError::NoHeaders(format!(
                    "line {first_line_no} has no column names"
                )));
            }
            collector.headers = first_fields;
        } else {
            collector.headers = (1..=first_fields.len())
                .map(|index| format!("Column_{index}"))
                .collect();
            collector.accept(first_line_no, first_fields);
        }

        for (line_no, line) in lines {
            match tokenize_line(line, delimiter, self.options.trim_values) {
                Ok(fields) => collector.accept(line_no, fields),
                Err(error) => collector.skip(line_no, error),
            }
        }

        Ok(collector.finish(
            delimiter,
            self.options.encoding_label.clone(),
            original_line_count,
            self.options.has_header,
        ))
    }
}

struct RowCollector {
    headers: Vec<String>,
    header_len: usize,
    max_rows: usize,
    rows: Vec<Vec<String>>,
    warnings: Vec<RowWarning>,
    skipped_rows: usize,
    truncated_rows: usize,
    max_column_count: usize,
}

impl RowCollector {
    fn new(header_len: usize, max_rows: usize) -> Self {
        Self {
            headers: Vec::new(),
            header_len,
            max_rows,
            rows: Vec::new(),
            warnings: Vec::new(),
            skipped_rows: 0,
            truncated_rows: 0,
            max_column_count: header_len,
        }
    }

    fn accept(&mut self, line: usize, mut fields: Vec<String>) {
        if self.rows.len() >= self.max_rows {
            if self.truncated_rows == 0 {
                self.warn(
                    line,
                    format!(
                        "row limit of {} reached, remaining rows ignored",
                        self.max_rows
                    ),
                );
            }
            self.truncated_rows += 1;
            return;
        }

        self.max_column_count = self.max_column_count.max(fields.len());
        if fields.len() > self.header_len {
            self.warn(
                line,
                format!(
                    "expected {} fields but found {}, extra fields kept",
                    self.header_len,
                    fields.len()
                ),
            );
        } else if fields.len() < self.header_len {
            fields.resize(self.header_len, String::new());
        }
        self.rows.push(fields);
    }

    fn skip(&mut self, line: usize, error: LineError) {
        self.skipped_rows += 1;
        self.warn(line, format!("skipped: {error}"));
    }

    fn warn(&mut self, line: usize, message: String) {
        warn!(line, "{message}");
        self.warnings.push(RowWarning { line, message });
    }

    fn finish(
        self,
        delimiter: char,
        encoding: String,
        original_line_count: usize,
        has_header: bool,
    ) -> RawTable {
        let metadata = TableMetadata {
            original_line_count,
            processed_rows: self.rows.len(),
            skipped_rows: self.skipped_rows,
            truncated_rows: self.truncated_rows,
            has_header,
            max_column_count: self.max_column_count,
        };
        RawTable {
            headers: self.headers,
            rows: self.rows,
            delimiter,
            encoding,
            warnings: self.warnings,
            metadata,
        }
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM)
        .or_else(|| text.strip_prefix(BOM_BYTES_AS_TEXT))
        .unwrap_or(text)
}

/// Picks the candidate delimiter that occurs most often outside quotes.
/// Ties and lines without any candidate fall back to a comma.
pub fn detect_delimiter(line: &str) -> char {
    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    let mut active_quote: Option<char> = None;
    let mut previous: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(quote) = active_quote {
            if ch == quote {
                if chars.peek() == Some(&quote) {
                    chars.next();
                } else {
                    active_quote = None;
                    previous = Some(ch);
                }
            }
            continue;
        }

        if let Some(position) = DELIMITER_CANDIDATES.iter().position(|c| *c == ch) {
            counts[position] += 1;
            previous = Some(ch);
        } else if is_quote(ch) && previous.is_none_or(|p| DELIMITER_CANDIDATES.contains(&p)) {
            active_quote = Some(ch);
        } else if !ch.is_whitespace() {
            previous = Some(ch);
        }
    }

    let best = counts.iter().copied().max().unwrap_or(0);
    let leaders = counts.iter().filter(|count| **count == best).count();
    if best == 0 || leaders > 1 {
        return ',';
    }
    counts
        .iter()
        .position(|count| *count == best)
        .map_or(',', |position| DELIMITER_CANDIDATES[position])
}

/// Splits one line into fields.
///
/// A `"` or `'` opens a quoted span only at the start of a field; inside the
/// span the delimiter is literal and a doubled quote stands for one quote.
pub fn tokenize_line(line: &str, delimiter: char, trim: bool) -> Result<Vec<String>, LineError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut active_quote: Option<char> = None;
    let mut was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(quote) = active_quote {
            if ch == quote {
                if chars.peek() == Some(&quote) {
                    current.push(quote);
                    chars.next();
                } else {
                    active_quote = None;
                }
            } else {
                current.push(ch);
            }
            continue;
        }

        if ch == delimiter {
            fields.push(finish_field(&mut current, trim));
            was_quoted = false;
        } else if is_quote(ch) && !was_quoted && current.trim().is_empty() {
            current.clear();
            active_quote = Some(ch);
            was_quoted = true;
        } else {
            current.push(ch);
        }
    }

    if let Some(quote) = active_quote {
        return Err(LineError::UnterminatedQuote(quote));
    }
    fields.push(finish_field(&mut current, trim));
    Ok(fields)
}

fn finish_field(current: &mut String, trim: bool) -> String {
    let field = std::mem::take(current);
    if trim { field.trim().to_string() } else { field }
}

fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}
