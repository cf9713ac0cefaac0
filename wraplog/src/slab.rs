//! Physical slot storage for wraplog ring stores.
//!
//! A ring store sees its memory as a flat array of signed 16-bit slots. This
//! module provides the two ways of holding those slots:
//!
//! - [`ByteSlab`]: a raw byte buffer addressed as little-endian `i16` words,
//!   the way a microcontroller pin buffer is used.
//! - [`SlotRing`]: a typed array of fixed-width elements.
//!
//! Both implement [`SlotStorage`], and [`Storage`] selects one of them from a
//! [`StorageBackend`]. Storage is allocated once and zero-filled; it never
//! grows.
//!
//! # Layout
//!
//! ```text
//! slot:   0        1     2     ..  W-1   | W        W+1  ..
//!         delta₀   v₀,₀  v₀,₁  ..        | delta₁   v₁,₀ ..
//! ```
//!
//! Row `r` occupies slots `[r * W, (r + 1) * W)` where `W` is the row width.
//! The ring store owns that mapping; storage only knows slot indices.

use crate::schema::StorageBackend;

/// Size of one slot in bytes.
pub const SLOT_SIZE: usize = 2;

/// Fixed-size array of signed 16-bit slots.
///
/// Indices are validated by the ring store's layout; implementations panic on
/// an out-of-range index rather than checking on every access.
pub trait SlotStorage {
    /// Total number of slots.
    fn slot_count(&self) -> usize;

    /// Writes `value` at slot `index`.
    fn write_slot(&mut self, index: usize, value: i16);

    /// Reads slot `index`.
    fn read_slot(&self, index: usize) -> i16;

    /// Writes one row of `row_width` slots starting at slot `base`.
    ///
    /// `row[0]` is the time delta. Slots missing from `row` are written as 0
    /// and extra ones are ignored.
    fn write_row(&mut self, base: usize, row: &[i16], row_width: usize) {
        for slot in 0..row_width {
            self.write_slot(base + slot, row.get(slot).copied().unwrap_or(0));
        }
    }
}

/// Raw byte buffer holding little-endian 16-bit words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSlab {
    bytes: Vec<u8>,
}

impl ByteSlab {
    /// Allocates a zeroed buffer of `size_bytes` bytes.
    ///
    /// A trailing odd byte is allocated but never addressed as a slot.
    pub fn allocate(size_bytes: usize) -> Self {
        Self {
            bytes: vec![0; size_bytes],
        }
    }

    /// Buffer size in bytes.
    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Writes `value` as two little-endian bytes at `offset_bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `offset_bytes + 2` exceeds the buffer size.
    pub fn write_i16_le(&mut self, offset_bytes: usize, value: i16) {
        self.bytes[offset_bytes..offset_bytes + SLOT_SIZE].copy_from_slice(&value.to_le_bytes());
    }

    /// Reads two little-endian bytes at `offset_bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `offset_bytes + 2` exceeds the buffer size.
    pub fn read_i16_le(&self, offset_bytes: usize) -> i16 {
        i16::from_le_bytes([self.bytes[offset_bytes], self.bytes[offset_bytes + 1]])
    }
}

impl SlotStorage for ByteSlab {
    fn slot_count(&self) -> usize {
        self.bytes.len() / SLOT_SIZE
    }

    fn write_slot(&mut self, index: usize, value: i16) {
        self.write_i16_le(index * SLOT_SIZE, value);
    }

    fn read_slot(&self, index: usize) -> i16 {
        self.read_i16_le(index * SLOT_SIZE)
    }
}

/// Fixed-capacity array of typed 16-bit elements.
///
/// Rows are fed in as a stream: [`append_time_delta`](Self::append_time_delta)
/// then one [`append`](Self::append) per value, each writing at a cursor
/// that wraps to 0 after the last element. A row write first places the
/// cursor at the row's base slot; single-slot writes leave it alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRing {
    elements: Box<[i16]>,
    cursor: usize,
}

impl SlotRing {
    /// Allocates `max_elements` zeroed elements.
    pub fn new(max_elements: usize) -> Self {
        Self {
            elements: vec![0; max_elements].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Writes `value` at the stream cursor and advances it.
    ///
    /// Does nothing on a zero-length ring.
    pub fn append(&mut self, value: i16) {
        if self.elements.is_empty() {
            return;
        }
        self.elements[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.elements.len();
    }

    /// Appends a time-delta slot. Deltas share the value stream; only the
    /// caller's row layout tells them apart.
    pub fn append_time_delta(&mut self, delta: i16) {
        self.append(delta);
    }

    /// Slot the next [`append`](Self::append) writes to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total element count.
    pub fn max_elements(&self) -> usize {
        self.elements.len()
    }

    /// Returns the element at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<i16> {
        self.elements.get(index).copied()
    }
}

impl SlotStorage for SlotRing {
    fn slot_count(&self) -> usize {
        self.elements.len()
    }

    fn write_slot(&mut self, index: usize, value: i16) {
        self.elements[index] = value;
    }

    fn read_slot(&self, index: usize) -> i16 {
        self.elements[index]
    }

    fn write_row(&mut self, base: usize, row: &[i16], row_width: usize) {
        assert!(base < self.elements.len(), "row base {base} out of range");
        self.cursor = base;

        let mut slots = (0..row_width).map(|slot| row.get(slot).copied().unwrap_or(0));
        if let Some(delta) = slots.next() {
            self.append_time_delta(delta);
        }
        for value in slots {
            self.append(value);
        }
    }
}

/// Storage selected by a [`StorageBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Raw little-endian byte buffer.
    Bytes(ByteSlab),
    /// Typed element array.
    Slots(SlotRing),
}

impl Storage {
    /// Allocates `slot_count` zeroed slots with the given backend.
    ///
    /// # Panics
    ///
    /// Panics if the storage does not fit in memory; a validated
    /// [`TableConfig`](crate::schema::TableConfig) never asks for that.
    pub fn allocate(backend: StorageBackend, slot_count: usize) -> Self {
        match backend {
            StorageBackend::ByteBuffer => {
                Self::Bytes(ByteSlab::allocate(slot_count.saturating_mul(SLOT_SIZE)))
            }
            StorageBackend::SlotRing => Self::Slots(SlotRing::new(slot_count)),
        }
    }

    /// The backend this storage was allocated with.
    pub fn backend(&self) -> StorageBackend {
        match self {
            Self::Bytes(_) => StorageBackend::ByteBuffer,
            Self::Slots(_) => StorageBackend::SlotRing,
        }
    }
}

impl SlotStorage for Storage {
    #[inline]
    fn slot_count(&self) -> usize {
        match self {
            Self::Bytes(slab) => slab.slot_count(),
            Self::Slots(ring) => ring.slot_count(),
        }
    }

    #[inline]
    fn write_slot(&mut self, index: usize, value: i16) {
        match self {
            Self::Bytes(slab) => slab.write_slot(index, value),
            Self::Slots(ring) => ring.write_slot(index, value),
        }
    }

    #[inline]
    fn read_slot(&self, index: usize) -> i16 {
        match self {
            Self::Bytes(slab) => slab.read_slot(index),
            Self::Slots(ring) => ring.read_slot(index),
        }
    }

    #[inline]
    fn write_row(&mut self, base: usize, row: &[i16], row_width: usize) {
        match self {
            Self::Bytes(slab) => slab.write_row(base, row, row_width),
            Self::Slots(ring) => ring.write_row(base, row, row_width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_slab_little_endian() {
        let mut slab = ByteSlab::allocate(6);
        slab.write_i16_le(2, 0x1234);
        slab.write_i16_le(4, -2);

        assert_eq!(slab.bytes, vec![0x00, 0x00, 0x34, 0x12, 0xFE, 0xFF]);
        assert_eq!(slab.read_i16_le(2), 0x1234);
        assert_eq!(slab.read_i16_le(4), -2);
        assert_eq!(slab.read_i16_le(0), 0);
    }

    #[test]
    fn test_byte_slab_slots() {
        let mut slab = ByteSlab::allocate(7);
        assert_eq!(slab.len_bytes(), 7);
        assert_eq!(slab.slot_count(), 3);

        slab.write_slot(2, i16::MIN);
        assert_eq!(slab.read_slot(2), i16::MIN);
        assert_eq!(slab.read_i16_le(4), i16::MIN);
    }

    #[test]
    #[should_panic]
    fn test_byte_slab_out_of_bounds() {
        let slab = ByteSlab::allocate(4);
        let _ = slab.read_slot(2);
    }

    #[test]
    fn test_slot_ring() {
        let mut ring = SlotRing::new(4);
        assert_eq!(ring.max_elements(), 4);
        assert_eq!(ring.get(3), Some(0));
        assert_eq!(ring.get(4), None);

        ring.write_slot(3, i16::MAX);
        assert_eq!(ring.read_slot(3), i16::MAX);
        assert_eq!(ring.get(3), Some(i16::MAX));
    }

    #[test]
    fn test_slot_ring_stream_wraps() {
        let mut ring = SlotRing::new(3);
        ring.append_time_delta(10);
        ring.append(1);
        ring.append(2);
        ring.append_time_delta(20);

        let elements: Vec<Option<i16>> = (0..3).map(|i| ring.get(i)).collect();
        assert_eq!(elements, vec![Some(20), Some(1), Some(2)]);

        let mut empty = SlotRing::new(0);
        empty.append(5);
        assert_eq!(empty.max_elements(), 0);
    }

    #[test]
    fn test_slot_ring_row_write_uses_stream() {
        let mut ring = SlotRing::new(6);
        ring.write_row(0, &[0, 10], 2);
        ring.write_row(2, &[1, 11], 2);

        let elements: Vec<i16> = (0..6).map(|i| ring.read_slot(i)).collect();
        assert_eq!(elements, vec![0, 10, 1, 11, 0, 0]);
        assert_eq!(ring.cursor(), 4);

        // Last row wraps the cursor back to the start
        ring.write_row(4, &[2], 2);
        assert_eq!(ring.read_slot(5), 0);
        assert_eq!(ring.cursor(), 0);
    }

    #[test]
    fn test_slot_ring_row_write_repositions_cursor() {
        let mut ring = SlotRing::new(7);
        ring.append(9);
        ring.write_row(3, &[4, 5, 6], 3);

        assert_eq!(ring.cursor(), 6);
        assert_eq!(ring.get(0), Some(9));
        assert_eq!(ring.get(3), Some(4));
        assert_eq!(ring.get(5), Some(6));
    }

    #[test]
    fn test_byte_slab_row_write() {
        let mut slab = ByteSlab::allocate(8);
        slab.write_row(1, &[7, 8, 9, 10], 3);

        let slots: Vec<i16> = (0..4).map(|i| slab.read_slot(i)).collect();
        assert_eq!(slots, vec![0, 7, 8, 9]);
    }

    #[test]
    fn test_storage_backends_agree() {
        for backend in [StorageBackend::ByteBuffer, StorageBackend::SlotRing] {
            let mut storage = Storage::allocate(backend, 5);
            assert_eq!(storage.backend(), backend);
            assert_eq!(storage.slot_count(), 5);

            for i in 0..5 {
                assert_eq!(storage.read_slot(i), 0);
            }
            for (i, value) in [-1, 0, 1, i16::MIN, i16::MAX].into_iter().enumerate() {
                storage.write_slot(i, value);
            }
            let read: Vec<i16> = (0..5).map(|i| storage.read_slot(i)).collect();
            assert_eq!(read, vec![-1, 0, 1, i16::MIN, i16::MAX]);
        }
    }
}
