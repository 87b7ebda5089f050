//! Segments and their two-level bitmaps
use core::{ops::Range, ptr::NonNull};

use crate::{
    arena::Arena,
    error::BeginError,
    utils::{
        bitscan::{first_zero_bit, set_bits},
        CellDivisor,
    },
    MAX_CELLS_PER_SEGMENT, MAX_CELL_SIZE, SEGMENT_STEP,
};

/// The number of cells summarized by one bit of the pool-summary byte.
pub(crate) const POOL_LEN: usize = 8;

/// Describes one segment of a [`MemPool`](crate::MemPool).
///
/// # Examples
///
/// ```
/// use r3_mempool::{SegmentSpec, SEGMENT_STEP};
/// // 12 cells of 16 bytes each
/// let spec = SegmentSpec::new(12, 16 / SEGMENT_STEP as u8);
/// assert_eq!(spec.cell_size(), 16);
/// // 12 × 16 bytes of cells + 2 bytes of cell-usage bitmap + 1 summary byte
/// assert_eq!(spec.footprint(), 195);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentSpec {
    /// The number of cells.
    pub count: u8,
    /// The cell size in units of [`SEGMENT_STEP`] bytes.
    pub size: u8,
}

impl SegmentSpec {
    #[inline]
    pub const fn new(count: u8, size: u8) -> Self {
        Self { count, size }
    }

    /// Get the cell size in bytes.
    #[inline]
    pub const fn cell_size(&self) -> usize {
        self.size as usize * SEGMENT_STEP
    }

    /// Get the number of pools (groups of up to eight cells).
    #[inline]
    pub const fn pool_count(&self) -> usize {
        (self.count as usize + POOL_LEN - 1) / POOL_LEN
    }

    /// Get the number of buffer bytes occupied by the segment: the
    /// pool-summary byte, the cell-usage bitmap, and the cells.
    #[inline]
    pub const fn footprint(&self) -> usize {
        1 + self.pool_count() + self.cell_size() * self.count as usize
    }

    pub(crate) fn validate(&self) -> Result<(), BeginError> {
        if self.size == 0 {
            Err(BeginError::ZeroCellSize)
        } else if self.cell_size() > MAX_CELL_SIZE {
            Err(BeginError::CellTooLarge)
        } else if self.count == 0 || self.count as usize > MAX_CELLS_PER_SEGMENT {
            Err(BeginError::BadCellCount)
        } else {
            Ok(())
        }
    }
}

/// Get a bitmap byte with the bits for the non-existent entries
/// `valid..8` set. `valid == 0` means the byte is fully populated.
#[inline]
const fn padding_mask(valid: usize) -> u8 {
    if valid == 0 || valid >= 8 {
        0
    } else {
        0xff << valid
    }
}

/// A segment in a formatted buffer.
///
/// The bitmaps live in the buffer, right before the cells:
///
///  - `header`: the pool-summary byte. Bit `p` is set iff every cell in pool
///    `p` is in use. Bits for non-existent pools are permanently set.
///
///  - `header + 1 + p`: the cell-usage byte of pool `p`. Bit `c` is set iff
///    cell `p * 8 + c` is in use. Bits for non-existent cells are permanently
///    set.
///
///  - `base..end`: the cells.
#[derive(Debug)]
pub(crate) struct Segment {
    pub(crate) cell_size: usize,
    pub(crate) cell_count: usize,
    header: usize,
    pub(crate) base: usize,
    divisor: CellDivisor,
    #[cfg(feature = "stats")]
    pub(crate) stats: crate::stats::SegmentStats,
}

impl Segment {
    /// Construct a `Segment` whose pool-summary byte is at `header`.
    pub(crate) fn new(spec: &SegmentSpec, header: usize) -> Self {
        let cell_size = spec.cell_size();
        Self {
            cell_size,
            cell_count: spec.count as usize,
            header,
            base: header + 1 + spec.pool_count(),
            divisor: CellDivisor::new(cell_size),
            #[cfg(feature = "stats")]
            stats: Default::default(),
        }
    }

    #[inline]
    fn pool_count(&self) -> usize {
        (self.cell_count + POOL_LEN - 1) / POOL_LEN
    }

    #[inline]
    fn usage(&self, pool: usize) -> usize {
        debug_assert!(pool < self.pool_count());
        self.header + 1 + pool
    }

    /// Get the buffer range occupied by the cells.
    #[inline]
    pub(crate) fn storage(&self) -> Range<usize> {
        self.base..self.base + self.cell_size * self.cell_count
    }

    /// Get the buffer offset of the specified cell.
    #[inline]
    pub(crate) fn cell_offset(&self, cell: usize) -> usize {
        self.base + cell * self.cell_size
    }

    /// Get the index of the cell containing `offset` (relative to `base`).
    #[inline]
    pub(crate) fn cell_index(&self, offset: usize) -> usize {
        debug_assert!(offset < self.cell_size * self.cell_count);
        self.divisor.divide(offset)
    }

    /// Pre-set the bits for the non-existent pools and cells. The bitmap bytes
    /// must be zero.
    pub(crate) fn format(&self, arena: &mut Arena<'_>) {
        arena.write(self.header, padding_mask(self.pool_count()));
        let last_pool = self.pool_count() - 1;
        arena.write(self.usage(last_pool), padding_mask(self.cell_count % POOL_LEN));
    }

    #[inline]
    pub(crate) fn is_full(&self, arena: &Arena<'_>) -> bool {
        arena.read(self.header) == 0xff
    }

    /// Find the lowest-indexed free cell, mark it as used, and return its
    /// index. The segment must not be full.
    pub(crate) fn take_free(&self, arena: &mut Arena<'_>) -> usize {
        let summary = arena.read(self.header);
        debug_assert_ne!(summary, 0xff, "segment is full");

        let pool = first_zero_bit(summary) as usize;
        let usage = arena.read(self.usage(pool));
        // Invariant: A pool is marked full iff its usage byte is `0xff`
        debug_assert_ne!(usage, 0xff);
        let bit = first_zero_bit(usage);

        let usage = usage | (1 << bit);
        arena.write(self.usage(pool), usage);
        if usage == 0xff {
            arena.write(self.header, summary | (1 << pool));
        }

        pool * POOL_LEN + bit as usize
    }

    #[inline]
    pub(crate) fn is_allocated(&self, arena: &Arena<'_>, cell: usize) -> bool {
        debug_assert!(cell < self.cell_count);
        arena.read(self.usage(cell / POOL_LEN)) & (1 << (cell % POOL_LEN)) != 0
    }

    /// Mark the specified cell as free.
    pub(crate) fn mark_free(&self, arena: &mut Arena<'_>, cell: usize) {
        debug_assert!(cell < self.cell_count);
        let (pool, bit) = (cell / POOL_LEN, cell % POOL_LEN);
        let usage = self.usage(pool);
        arena.write(usage, arena.read(usage) & !(1 << bit));
        // A pool that just had a cell freed is not full
        arena.write(self.header, arena.read(self.header) & !(1 << pool));
    }

    /// Iterate over the indices of the allocated cells in ascending order.
    pub(crate) fn allocated_cells<'a>(
        &'a self,
        arena: &'a Arena<'a>,
    ) -> impl Iterator<Item = usize> + 'a {
        (0..self.pool_count())
            .flat_map(move |pool| {
                set_bits(arena.read(self.usage(pool))).map(move |bit| pool * POOL_LEN + bit as usize)
            })
            .filter(move |&cell| cell < self.cell_count)
    }

    /// Get a summary of the segment.
    pub(crate) fn info(&self, arena: &Arena<'_>) -> SegmentInfo {
        SegmentInfo {
            cell_size: self.cell_size,
            cell_count: self.cell_count,
            cells_in_use: self.allocated_cells(arena).count(),
            first_cell: arena.ptr_at(self.base),
        }
    }
}

/// A snapshot of a segment's configuration and usage, returned by
/// [`MemPool::segment`](crate::MemPool::segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    /// The cell size in bytes.
    pub cell_size: usize,
    /// The number of cells.
    pub cell_count: usize,
    /// The number of cells currently allocated.
    pub cells_in_use: usize,
    /// The address of the first cell.
    pub first_cell: NonNull<u8>,
}

impl SegmentInfo {
    /// Get the address of the specified cell.
    ///
    /// `cell` must be less than `cell_count`.
    pub fn cell_ptr(&self, cell: usize) -> NonNull<u8> {
        assert!(cell < self.cell_count);
        // Safety: The cell is inside the segment, which is inside the buffer
        unsafe { NonNull::new_unchecked(self.first_cell.as_ptr().add(cell * self.cell_size)) }
    }

    /// Check if `ptr` points into this segment's cells.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let start = self.first_cell.as_ptr() as usize;
        let end = start + self.cell_size * self.cell_count;
        (start..end).contains(&(ptr.as_ptr() as usize))
    }
}
