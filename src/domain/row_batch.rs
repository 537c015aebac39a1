use std::{num::NonZeroUsize, ops::Range, str::FromStr};

use crate::domain::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSize {
    Rows(NonZeroUsize),
    All,
}

impl BatchSize {
    /// Zero means "everything in one batch".
    pub fn rows(value: usize) -> Self {
        NonZeroUsize::new(value).map_or(BatchSize::All, BatchSize::Rows)
    }
}

impl std::fmt::Display for BatchSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchSize::Rows(size) => write!(f, "{size}"),
            BatchSize::All => f.write_str("all"),
        }
    }
}

impl FromStr for BatchSize {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(BatchSize::All);
        }
        trimmed
            .parse::<usize>()
            .map(BatchSize::rows)
            .map_err(|_| ConfigError::InvalidBatchSize(value.to_string()))
    }
}

/// Splits `row_count` rows into consecutive index ranges.
#[derive(Debug)]
pub struct RowBatchSlicer {
    row_count: usize,
    batch_size: usize,
}

impl RowBatchSlicer {
    pub fn new(row_count: usize, batch_size: BatchSize) -> Self {
        let batch_size = match batch_size {
            BatchSize::Rows(size) => size.get(),
            BatchSize::All => row_count.max(1),
        };
        Self {
            row_count,
            batch_size,
        }
    }

    pub fn batch_count(&self) -> usize {
        self.row_count.div_ceil(self.batch_size)
    }

    pub fn iter_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.row_count)
            .step_by(self.batch_size)
            .map(move |start| start..(start + self.batch_size).min(self.row_count))
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchSize, RowBatchSlicer};

    #[test]
    fn iter_ranges_caps_last_batch() {
        let slicer = RowBatchSlicer::new(5, BatchSize::rows(2));
        let sizes = slicer.iter_ranges().map(|range| range.len()).collect::<Vec<_>>();

        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(slicer.batch_count(), 3);
    }

    #[test]
    fn all_yields_a_single_batch() {
        let slicer = RowBatchSlicer::new(7, BatchSize::All);
        let ranges = slicer.iter_ranges().collect::<Vec<_>>();

        assert_eq!(ranges, vec![0..7]);
    }

    #[test]
    fn zero_rows_yield_no_batches() {
        let slicer = RowBatchSlicer::new(0, BatchSize::All);
        assert_eq!(slicer.iter_ranges().count(), 0);
        assert_eq!(slicer.batch_count(), 0);
    }

    #[test]
    fn parses_batch_size_text() {
        assert_eq!("all".parse::<BatchSize>(), Ok(BatchSize::All));
        assert_eq!("0".parse::<BatchSize>(), Ok(BatchSize::All));
        assert_eq!("25".parse::<BatchSize>(), Ok(BatchSize::rows(25)));
        assert!("-3".parse::<BatchSize>().is_err());
    }
}
