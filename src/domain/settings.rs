pub const DEFAULT_MAX_ROWS: usize = 100_000;
pub const DEFAULT_MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Limits and thresholds shared by the parser, inference and generator.
///
/// Built once per run and passed by reference; nothing reads these values
/// from global state.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Data rows kept by the parser; later rows are dropped with a warning.
    pub max_rows: usize,
    /// Hard ceiling on the input size.
    pub max_input_bytes: usize,
    pub default_batch_size: usize,
    /// Values per column used for summary stats such as sample values.
    pub sample_size: usize,
    /// Share of non-empty values a type predicate must match to win.
    pub inference_threshold: f64,
    /// Mappings below this confidence are reported as warnings.
    pub low_confidence_threshold: f64,
    pub max_identifier_length: usize,
    /// Longest value that still counts as short text.
    pub short_text_max_length: usize,
    pub sample_value_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            default_batch_size: DEFAULT_BATCH_SIZE,
            sample_size: 100,
            inference_threshold: 0.8,
            low_confidence_threshold: 0.9,
            max_identifier_length: 64,
            short_text_max_length: 255,
            sample_value_count: 5,
        }
    }
}
