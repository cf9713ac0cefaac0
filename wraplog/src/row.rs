//! Row encoding: samples in, fixed-width 16-bit rows out.
//!
//! A row is `[delta, v₀, v₁, .., vₙ₋₁]` where `delta` is the time since the
//! previous logged row and `vᵢ` the value for the `i`-th tracked column.
//!
//! # Numeric width
//!
//! Values are stored as `i16`. Inputs outside `-32768..=32767` are truncated
//! to their low 16 bits (two's-complement wraparound), not saturated, so
//! `32768` is stored as `-32768` and `70000` as `4464`.
//!
//! Time deltas are never negative, so the delta slot is read back as an
//! unsigned quantity. Gaps longer than 65 535 ms saturate at 65 535.

/// One `(column, value)` cell supplied to a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample<'a> {
    /// Column the value belongs to.
    pub column: &'a str,
    /// Value before truncation to storage width.
    pub value: i64,
}

impl<'a> Sample<'a> {
    /// Creates a sample.
    pub fn new(column: &'a str, value: i64) -> Self {
        Self { column, value }
    }
}

impl<'a> From<(&'a str, i64)> for Sample<'a> {
    fn from((column, value): (&'a str, i64)) -> Self {
        Self::new(column, value)
    }
}

/// Largest time gap a row can record.
pub const MAX_DELTA_MS: u64 = u16::MAX as u64;

/// Truncates a value to the 16-bit storage width.
#[inline]
#[allow(clippy::cast_possible_truncation)] // Wraparound is the storage contract
pub fn encode_value(value: i64) -> i16 {
    value as i16
}

/// Decodes a stored value.
#[inline]
pub fn decode_value(slot: i16) -> i64 {
    i64::from(slot)
}

/// Encodes a time gap into the delta slot, saturating at [`MAX_DELTA_MS`].
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Clamped to u16 first
pub fn encode_delta(delta_ms: u64) -> i16 {
    delta_ms.min(MAX_DELTA_MS) as u16 as i16
}

/// Decodes the delta slot back to milliseconds.
#[inline]
#[allow(clippy::cast_sign_loss)] // Reinterprets the slot as u16
pub fn decode_delta(slot: i16) -> u64 {
    u64::from(slot as u16)
}

/// Maps samples onto the slots of a row for a fixed column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEncoder {
    columns: Vec<String>,
}

impl RowEncoder {
    /// Creates an encoder for the given column order.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Tracked columns in slot order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Slots per row.
    pub fn row_width(&self) -> usize {
        self.columns.len() + 1
    }

    /// Position of `column` among the value slots.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Encodes one row into `row`.
    ///
    /// Columns without a sample are stored as 0. When a column appears more
    /// than once, the last sample wins. Samples for untracked columns are
    /// dropped, and their count is returned.
    ///
    /// # Panics
    ///
    /// Panics if `row` is shorter than [`row_width`](Self::row_width).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wraplog::row::{RowEncoder, Sample};
    ///
    /// let encoder = RowEncoder::new(vec!["x".into(), "y".into(), "z".into()]);
    /// let mut row = [0i16; 4];
    /// let dropped = encoder.encode(
    ///     20,
    ///     &[Sample::new("y", 7), Sample::new("w", 1), Sample::new("x", 40000)],
    ///     &mut row,
    /// );
    ///
    /// assert_eq!(row, [20, -25536, 7, 0]);
    /// assert_eq!(dropped, 1);
    /// ```
    pub fn encode(&self, delta_ms: u64, samples: &[Sample<'_>], row: &mut [i16]) -> usize {
        let row = &mut row[..self.row_width()];
        row.fill(0);
        row[0] = encode_delta(delta_ms);

        let mut dropped = 0;
        for sample in samples {
            match self.column_index(sample.column) {
                Some(index) => row[index + 1] = encode_value(sample.value),
                None => {
                    tracing::debug!(column = sample.column, "dropping sample for untracked column");
                    dropped += 1;
                }
            }
        }

        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> RowEncoder {
        RowEncoder::new(vec!["a".to_string(), "b".to_string()])
    }

    #[test]
    fn test_value_truncation() {
        assert_eq!(encode_value(0), 0);
        assert_eq!(encode_value(-5), -5);
        assert_eq!(encode_value(32767), 32767);
        assert_eq!(encode_value(32768), -32768);
        assert_eq!(encode_value(-32769), 32767);
        assert_eq!(encode_value(65536), 0);
        assert_eq!(encode_value(70000), 4464);
        assert_eq!(decode_value(encode_value(-1234)), -1234);
    }

    #[test]
    fn test_delta_encoding() {
        assert_eq!(decode_delta(encode_delta(0)), 0);
        assert_eq!(decode_delta(encode_delta(10)), 10);
        assert_eq!(decode_delta(encode_delta(40_000)), 40_000);
        assert_eq!(decode_delta(encode_delta(65_535)), 65_535);
        assert_eq!(decode_delta(encode_delta(1_000_000)), MAX_DELTA_MS);
    }

    #[test]
    fn test_encode_in_header_order() {
        let mut row = [0i16; 3];
        let dropped = encoder().encode(15, &[Sample::new("b", 2), Sample::new("a", 1)], &mut row);

        assert_eq!(row, [15, 1, 2]);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_missing_column_defaults_to_zero() {
        let mut row = [99i16; 3];
        encoder().encode(0, &[Sample::new("b", 8)], &mut row);
        assert_eq!(row, [0, 0, 8]);

        encoder().encode(3, &[], &mut row);
        assert_eq!(row, [3, 0, 0]);
    }

    #[test]
    fn test_duplicate_column_last_wins() {
        let mut row = [0i16; 3];
        encoder().encode(0, &[Sample::new("a", 1), Sample::new("a", 5)], &mut row);
        assert_eq!(row, [0, 5, 0]);
    }

    #[test]
    fn test_untracked_column_dropped() {
        let mut row = [0i16; 3];
        let dropped = encoder().encode(
            0,
            &[Sample::new("c", 1), Sample::new("a", 4), Sample::new("", 3)],
            &mut row,
        );
        assert_eq!(row, [0, 4, 0]);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn test_longer_buffer_untouched_past_width() {
        let mut row = [7i16; 5];
        encoder().encode(1, &[Sample::new("a", 2)], &mut row);
        assert_eq!(row, [1, 2, 0, 7, 7]);
    }

    #[test]
    fn test_sample_from_tuple() {
        let sample: Sample<'_> = ("a", 3).into();
        assert_eq!(sample, Sample::new("a", 3));
        assert_eq!(encoder().column_index("b"), Some(1));
        assert_eq!(encoder().column_index("z"), None);
        assert_eq!(encoder().row_width(), 3);
    }
}
