//! Fixed-capacity ring of encoded rows.
//!
//! This module layers row semantics over [`SlotStorage`]. A [`RingStore`]
//! knows the row width and how many whole rows fit in its storage, but
//! nothing about column names or what the slots mean.
//!
//! # Design
//!
//! - `inserted_rows` counts every append ever made and is never decremented
//! - The next write goes to physical row `inserted_rows % max_rows`
//! - Once the ring is full, that physical row holds the oldest resident row,
//!   so the write itself is the eviction
//! - Reads start at physical row `inserted_rows % max_rows` when the ring has
//!   wrapped and at row 0 otherwise, then walk forward `occupied_rows` rows

use crate::error::{Result, TableError};
use crate::schema::max_rows_for;
use crate::slab::{SlotStorage, Storage};

/// Circular store of fixed-width rows.
///
/// The store is sized once at construction and never reallocated. Appends
/// are O(row width); a full scan is O(occupied rows × row width).
///
/// # Thread Safety
///
/// `RingStore` has no interior mutability. Appends take `&mut self` and
/// scans borrow `&self`, so a scan can never observe a half-written row.
#[derive(Debug, Clone)]
pub struct RingStore<S = Storage> {
    /// The physical slots.
    storage: S,
    /// Slots per row.
    row_width: usize,
    /// Whole rows the storage holds.
    max_rows: usize,
    /// Every append ever made.
    inserted_rows: u64,
}

impl<S: SlotStorage> RingStore<S> {
    /// Wraps `storage` as a ring of rows that are `row_width` slots wide.
    ///
    /// Any slots left over after the last whole row are never used.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NoColumns`] if the row has no value slots, or
    /// [`TableError::InsufficientCapacity`] if not even one row fits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wraplog::ring::RingStore;
    /// use wraplog::slab::SlotRing;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// // 10 slots, rows of 3 (delta + 2 values): 3 rows, 1 slot unused
    /// let ring = RingStore::new(SlotRing::new(10), 3)?;
    /// assert_eq!(ring.max_rows(), 3);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(storage: S, row_width: usize) -> Result<Self> {
        if row_width < 2 {
            return Err(TableError::NoColumns.into());
        }

        let capacity_budget = storage.slot_count();
        let max_rows = max_rows_for(capacity_budget, row_width - 1);
        if max_rows == 0 {
            return Err(TableError::InsufficientCapacity {
                capacity_budget,
                row_width,
            }
            .into());
        }

        Ok(Self {
            storage,
            row_width,
            max_rows,
            inserted_rows: 0,
        })
    }

    /// Rows this store's slot budget would hold for `num_columns` columns.
    pub fn capacity(&self, num_columns: usize) -> usize {
        max_rows_for(self.storage.slot_count(), num_columns)
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Slots per row.
    pub fn row_width(&self) -> usize {
        self.row_width
    }

    /// Maximum number of resident rows.
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Total appends since construction, including evicted rows.
    pub fn inserted_rows(&self) -> u64 {
        self.inserted_rows
    }

    /// Rows currently resident: `min(inserted_rows, max_rows)`.
    #[allow(clippy::cast_possible_truncation)] // Bounded by max_rows (usize)
    pub fn occupied_rows(&self) -> usize {
        self.inserted_rows.min(self.max_rows as u64) as usize
    }

    /// Whether no row has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.inserted_rows == 0
    }

    /// Whether at least one row has been evicted.
    pub fn has_wrapped(&self) -> bool {
        self.inserted_rows > self.max_rows as u64
    }

    /// Whether the next append will evict a row.
    pub fn is_full(&self) -> bool {
        self.inserted_rows >= self.max_rows as u64
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)] // Result is < max_rows (usize)
    fn write_row(&self) -> usize {
        (self.inserted_rows % self.max_rows as u64) as usize
    }

    /// Physical row holding the oldest resident row.
    #[inline]
    fn oldest_row(&self) -> usize {
        if self.has_wrapped() {
            self.write_row()
        } else {
            0
        }
    }

    /// Appends a row, overwriting the oldest row once the ring is full.
    ///
    /// `row[0]` is the time-delta slot and `row[1..]` the column values.
    /// Missing trailing slots are written as 0 and extra slots are ignored,
    /// so every append writes exactly one full row.
    ///
    /// Returns `true` if the append evicted a row.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wraplog::ring::RingStore;
    /// use wraplog::slab::SlotRing;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut ring = RingStore::new(SlotRing::new(4), 2)?;
    /// assert!(!ring.append(&[0, 10]));
    /// assert!(!ring.append(&[5, 20]));
    /// assert!(ring.append(&[5, 30])); // evicts the row holding 10
    /// # Ok(())
    /// # }
    /// ```
    pub fn append(&mut self, row: &[i16]) -> bool {
        let evicts = self.is_full();
        let base = self.write_row() * self.row_width;

        self.storage.write_row(base, row, self.row_width);
        self.inserted_rows += 1;

        if evicts {
            tracing::trace!(
                inserted_rows = self.inserted_rows,
                max_rows = self.max_rows,
                "row appended over oldest"
            );
        }

        evicts
    }

    /// Iterates resident rows from oldest to newest.
    ///
    /// The iterator is lazy and borrows the store; call `iter` again to
    /// restart the scan.
    pub fn iter(&self) -> RowIter<'_, S> {
        RowIter {
            ring: self,
            next_row: self.oldest_row(),
            remaining: self.occupied_rows(),
        }
    }

    /// The most recently appended row, if any.
    pub fn newest(&self) -> Option<RowRef<'_, S>> {
        if self.is_empty() {
            return None;
        }
        let physical_row = (self.write_row() + self.max_rows - 1) % self.max_rows;
        Some(RowRef {
            ring: self,
            physical_row,
        })
    }
}

impl<'a, S: SlotStorage> IntoIterator for &'a RingStore<S> {
    type Item = RowRef<'a, S>;
    type IntoIter = RowIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowed view of one resident row.
#[derive(Debug)]
pub struct RowRef<'a, S = Storage> {
    ring: &'a RingStore<S>,
    physical_row: usize,
}

impl<S> Clone for RowRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for RowRef<'_, S> {}

impl<'a, S: SlotStorage> RowRef<'a, S> {
    #[cfg(test)]
    pub(crate) fn physical_row(&self) -> usize {
        self.physical_row
    }

    /// Raw slot `slot` of this row, or `None` past the row width.
    pub fn slot(&self, slot: usize) -> Option<i16> {
        (slot < self.ring.row_width)
            .then(|| self.ring.storage.read_slot(self.physical_row * self.ring.row_width + slot))
    }

    /// The time-delta slot.
    pub fn delta_slot(&self) -> i16 {
        self.ring
            .storage
            .read_slot(self.physical_row * self.ring.row_width)
    }

    /// Value slots in column order.
    pub fn values(&self) -> impl Iterator<Item = i16> + use<'a, S> {
        let ring = self.ring;
        let base = self.physical_row * ring.row_width;
        (base + 1..base + ring.row_width).map(move |index| ring.storage.read_slot(index))
    }

    #[cfg(test)]
    pub(crate) fn to_vec(&self) -> Vec<i16> {
        let base = self.physical_row * self.ring.row_width;
        (base..base + self.ring.row_width)
            .map(|index| self.ring.storage.read_slot(index))
            .collect()
    }
}

/// Oldest-to-newest iterator over a [`RingStore`].
#[derive(Debug)]
pub struct RowIter<'a, S = Storage> {
    ring: &'a RingStore<S>,
    next_row: usize,
    remaining: usize,
}

impl<S> Clone for RowIter<'_, S> {
    fn clone(&self) -> Self {
        Self {
            ring: self.ring,
            next_row: self.next_row,
            remaining: self.remaining,
        }
    }
}

impl<'a, S: SlotStorage> Iterator for RowIter<'a, S> {
    type Item = RowRef<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let row = RowRef {
            ring: self.ring,
            physical_row: self.next_row,
        };
        self.next_row = (self.next_row + 1) % self.ring.max_rows;
        self.remaining -= 1;

        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<S: SlotStorage> ExactSizeIterator for RowIter<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WraplogError;
    use crate::schema::StorageBackend;
    use crate::slab::{ByteSlab, SlotRing};

    fn create_test_ring(capacity_budget: usize, row_width: usize) -> RingStore<SlotRing> {
        RingStore::new(SlotRing::new(capacity_budget), row_width).unwrap()
    }

    fn collect(ring: &RingStore<impl SlotStorage>) -> Vec<Vec<i16>> {
        ring.iter().map(|row| row.to_vec()).collect()
    }

    #[test]
    fn test_empty_ring() {
        let ring = create_test_ring(10, 2);

        assert!(ring.is_empty());
        assert!(!ring.has_wrapped());
        assert!(!ring.is_full());
        assert_eq!(ring.max_rows(), 5);
        assert_eq!(ring.occupied_rows(), 0);
        assert_eq!(ring.inserted_rows(), 0);
        assert!(ring.newest().is_none());
        assert_eq!(ring.iter().count(), 0);
    }

    #[test]
    fn test_capacity() {
        let ring = create_test_ring(99, 3);
        assert_eq!(ring.max_rows(), 33);
        assert_eq!(ring.capacity(2), 33);
        assert_eq!(ring.capacity(1), 49);
        assert_eq!(ring.capacity(98), 1);
        assert_eq!(ring.capacity(99), 0);
    }

    #[test]
    fn test_construction_errors() {
        let err = RingStore::new(SlotRing::new(10), 1).unwrap_err();
        assert!(matches!(err, WraplogError::Table(TableError::NoColumns)));

        let err = RingStore::new(SlotRing::new(2), 3).unwrap_err();
        assert!(matches!(
            err,
            WraplogError::Table(TableError::InsufficientCapacity {
                capacity_budget: 2,
                row_width: 3
            })
        ));
    }

    #[test]
    fn test_single_append() {
        let mut ring = create_test_ring(10, 2);

        assert!(!ring.append(&[0, 42]));

        assert!(!ring.is_empty());
        assert_eq!(ring.occupied_rows(), 1);
        assert_eq!(ring.newest().unwrap().to_vec(), vec![0, 42]);
        assert_eq!(collect(&ring), vec![vec![0, 42]]);
    }

    #[test]
    fn test_fill_without_wrap() {
        let mut ring = create_test_ring(6, 2);

        for i in 0..3 {
            assert!(!ring.append(&[i, i * 10]));
        }

        assert!(ring.is_full());
        assert!(!ring.has_wrapped());
        assert_eq!(ring.occupied_rows(), 3);
        assert_eq!(collect(&ring), vec![vec![0, 0], vec![1, 10], vec![2, 20]]);
    }

    #[test]
    fn test_wraparound_evicts_oldest() {
        let mut ring = create_test_ring(6, 2);

        for i in 0..3 {
            ring.append(&[1, i]);
        }
        assert!(ring.append(&[1, 3]));

        assert!(ring.has_wrapped());
        assert_eq!(ring.inserted_rows(), 4);
        assert_eq!(ring.occupied_rows(), 3);
        assert_eq!(collect(&ring), vec![vec![1, 1], vec![1, 2], vec![1, 3]]);
        assert_eq!(ring.iter().next().unwrap().physical_row(), 1);
        assert_eq!(ring.newest().unwrap().physical_row(), 0);
    }

    #[test]
    fn test_many_wraps_keep_most_recent() {
        let mut ring = create_test_ring(15, 3);
        assert_eq!(ring.max_rows(), 5);

        for i in 0..23 {
            ring.append(&[0, i, -i]);
        }

        let values: Vec<i16> = ring.iter().map(|row| row.slot(1).unwrap()).collect();
        assert_eq!(values, vec![18, 19, 20, 21, 22]);
        assert_eq!(ring.occupied_rows(), 5);
        assert_eq!(ring.inserted_rows(), 23);
    }

    #[test]
    fn test_exact_multiple_of_capacity() {
        let mut ring = create_test_ring(8, 2);

        for i in 0..8 {
            ring.append(&[0, i]);
        }

        let values: Vec<i16> = ring.iter().map(|row| row.slot(1).unwrap()).collect();
        assert_eq!(values, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_single_row_ring() {
        let mut ring = create_test_ring(2, 2);
        assert_eq!(ring.max_rows(), 1);

        ring.append(&[0, 1]);
        ring.append(&[5, 2]);
        ring.append(&[7, 3]);

        assert_eq!(collect(&ring), vec![vec![7, 3]]);
    }

    #[test]
    fn test_unused_trailing_slots() {
        // 11 slots of width 3: 3 rows, 2 slots never touched
        let mut ring = create_test_ring(11, 3);
        assert_eq!(ring.max_rows(), 3);

        for i in 0..7 {
            ring.append(&[i, i, i]);
        }

        assert_eq!(ring.storage().get(9), Some(0));
        assert_eq!(ring.storage().get(10), Some(0));
        let deltas: Vec<i16> = ring.iter().map(|row| row.delta_slot()).collect();
        assert_eq!(deltas, vec![4, 5, 6]);
    }

    #[test]
    fn test_slot_ring_cursor_tracks_write_row() {
        let mut ring = create_test_ring(9, 3);

        for i in 0..7 {
            ring.append(&[1, i, -i]);
            assert_eq!(ring.storage().cursor(), ring.write_row() * ring.row_width());
        }

        assert!(ring.has_wrapped());
        assert_eq!(ring.storage().cursor(), 3);
        let values: Vec<i16> = ring.iter().map(|row| row.slot(1).unwrap()).collect();
        assert_eq!(values, vec![4, 5, 6]);
    }

    #[test]
    fn test_short_and_long_rows() {
        let mut ring = create_test_ring(9, 3);

        ring.append(&[1]);
        ring.append(&[2, 3, 4, 5, 6]);

        assert_eq!(collect(&ring), vec![vec![1, 0, 0], vec![2, 3, 4]]);
    }

    #[test]
    fn test_row_accessors() {
        let mut ring = create_test_ring(8, 4);
        ring.append(&[9, 1, 2, 3]);

        let row = ring.iter().next().unwrap();
        assert_eq!(row.delta_slot(), 9);
        assert_eq!(row.values().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(row.slot(3), Some(3));
        assert_eq!(row.slot(4), None);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let mut ring = create_test_ring(6, 2);
        for i in 0..5 {
            ring.append(&[0, i]);
        }

        let mut iter = ring.iter();
        assert_eq!(iter.len(), 3);
        iter.next();
        let resumed = iter.clone();
        assert_eq!(resumed.len(), 2);

        assert_eq!(collect(&ring), collect(&ring));
        assert_eq!((&ring).into_iter().count(), 3);
    }

    #[test]
    fn test_backends_behave_identically() {
        let mut bytes = RingStore::new(Storage::allocate(StorageBackend::ByteBuffer, 12), 3)
            .unwrap();
        let mut slots = RingStore::new(Storage::allocate(StorageBackend::SlotRing, 12), 3).unwrap();
        let mut raw = RingStore::new(ByteSlab::allocate(24), 3).unwrap();

        for i in 0..11 {
            let row = [i, i * 2, i16::MIN + i];
            bytes.append(&row);
            slots.append(&row);
            raw.append(&row);
        }

        assert_eq!(collect(&bytes), collect(&slots));
        assert_eq!(collect(&bytes), collect(&raw));
        assert_eq!(bytes.occupied_rows(), 4);
    }
}
