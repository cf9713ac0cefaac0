//! Synthetic sensor signals.
//!
//! Each tracked column is driven by one of a few deterministic waveforms,
//! picked by column position, so the saved table is easy to eyeball.

/// Reading of the sensor at column `index` on poll `poll`.
pub fn reading(index: usize, poll: u64) -> i64 {
    let poll = i64::try_from(poll).unwrap_or(i64::MAX);
    let offset = i64::try_from(index).unwrap_or(0);

    match index % 3 {
        // Counter: the poll number plus the column offset
        0 => poll + offset,
        // Triangle wave between -50 and 50
        1 => {
            let phase = (poll + offset) % 200;
            if phase < 100 { phase - 50 } else { 150 - phase }
        }
        // Square wave toggling every 8 polls
        _ => {
            if (poll / 8) % 2 == 0 { 1000 } else { -1000 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        assert_eq!(reading(0, 0), 0);
        assert_eq!(reading(0, 51), 51);
        assert_eq!(reading(3, 4), 7);
    }

    #[test]
    fn test_triangle_bounds() {
        for poll in 0..400 {
            let value = reading(1, poll);
            assert!((-50..=50).contains(&value), "poll {poll} gave {value}");
        }
        assert_eq!(reading(1, 0), -49);
        assert_eq!(reading(1, 99), 50);
    }

    #[test]
    fn test_square() {
        assert_eq!(reading(2, 0), 1000);
        assert_eq!(reading(2, 8), -1000);
        assert_eq!(reading(2, 16), 1000);
    }
}
