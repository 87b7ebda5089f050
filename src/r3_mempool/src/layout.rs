//! Buffer layout construction
use arrayvec::ArrayVec;
use core::ptr::NonNull;

use crate::{
    arena::Arena,
    error::{BeginError, ReleaseError},
    segment::{Segment, SegmentSpec},
    utils::sort::slice_sort_stable_by,
    MAX_SEGMENTS, SEGMENT_STEP, SEGMENT_STEP_LOG2, SIZE_CLASS_COUNT,
};

/// Calculate the number of buffer bytes needed by the specified segments.
///
/// This doesn't validate `specs`; [`MemPool::begin`](crate::MemPool::begin)
/// does.
///
/// # Examples
///
/// ```
/// use r3_mempool::{required_buffer_len, SegmentSpec};
/// const SEGMENTS: [SegmentSpec; 2] = [SegmentSpec::new(4, 1), SegmentSpec::new(2, 2)];
/// const LEN: usize = required_buffer_len(&SEGMENTS);
/// assert_eq!(LEN, (1 + 1 + 4 * 8) + (1 + 1 + 2 * 16));
/// ```
pub const fn required_buffer_len(specs: &[SegmentSpec]) -> usize {
    let mut len = 0;
    // `for` is unusable in `const fn`
    let mut i = 0;
    while i < specs.len() {
        len += specs[i].footprint();
        i += 1;
    }
    len
}

#[doc = svgbobdoc::transform!(
/// The layout of a formatted buffer.
///
/// Segments are placed in ascending order of cell size. Each one starts with
/// its bitmaps, followed by the cells:
///
/// <center>
/// ```svgbob
///               segment 0                                 segment 1
///  ,---------+-------+-------+--------+--------+-----,---------+-------+-----
///  | summary | usage | usage | cell 0 | cell 1 | ... | summary | usage | ...
///  |         |   0   |   1   |        |        |     |         |   0   |
///  '---------+-------+-------+--------+--------+-----'---------+-------+-----
///   1 byte    1 byte per pool ^
///                             |
///                            base
/// ```
/// </center>
///
/// Bases are therefore strictly increasing, which lets [`Self::release_cell`]
/// find the owning segment by binary search.
)]
#[derive(Debug)]
pub(crate) struct Layout {
    pub(crate) segments: ArrayVec<Segment, MAX_SEGMENTS>,
    /// `size_classes[k]` is the index of the first segment whose cells can
    /// hold `(k + 1) * SEGMENT_STEP` bytes.
    size_classes: ArrayVec<Option<u8>, SIZE_CLASS_COUNT>,
    /// The number of buffer bytes in use.
    pub(crate) len: usize,
}

impl Layout {
    /// Compute a layout for `specs` that fits in `capacity` bytes.
    pub(crate) fn new(specs: &[SegmentSpec], capacity: usize) -> Result<Self, BeginError> {
        if specs.is_empty() {
            return Err(BeginError::NoSegments);
        }

        if specs.len() > MAX_SEGMENTS {
            return Err(BeginError::TooManySegments);
        }

        let mut sorted: ArrayVec<SegmentSpec, MAX_SEGMENTS> = specs.iter().copied().collect();

        for spec in &sorted {
            spec.validate()?;
        }

        // Equal sizes stay in the input order
        slice_sort_stable_by(&mut sorted, |x, y| x.size < y.size);

        let len = required_buffer_len(&sorted);
        if len > capacity {
            log::debug!(
                "the layout needs {len} bytes, but the buffer is only {capacity} bytes long"
            );
            return Err(BeginError::NoMemory);
        }

        let mut segments = ArrayVec::new();
        let mut header = 0;
        for spec in &sorted {
            segments.push(Segment::new(spec, header));
            header += spec.footprint();
        }
        debug_assert_eq!(header, len);

        let max_cell_size = sorted.last().map_or(0, SegmentSpec::cell_size);
        let size_classes = (1..=max_cell_size / SEGMENT_STEP)
            .map(|k| {
                let size = k * SEGMENT_STEP;
                sorted
                    .iter()
                    .position(|spec| spec.cell_size() >= size)
                    .map(|i| i as u8)
            })
            .collect();

        Ok(Self {
            segments,
            size_classes,
            len,
        })
    }

    /// Initialize the bitmaps in `arena`.
    pub(crate) fn format(&self, arena: &mut Arena<'_>) {
        arena.clear(self.len);
        for segment in &self.segments {
            segment.format(arena);
        }
    }

    /// Get the largest cell size.
    #[inline]
    pub(crate) fn max_cell_size(&self) -> usize {
        self.segments.last().map_or(0, |s| s.cell_size)
    }

    #[inline]
    pub(crate) fn size_classes(&self) -> &[Option<u8>] {
        &self.size_classes
    }

    /// Find the smallest segment whose cells can hold `size` bytes.
    pub(crate) fn size_class(&self, size: usize) -> Option<usize> {
        if size > self.max_cell_size() {
            return None;
        }
        // `ceil(size / SEGMENT_STEP)`, zero-sized requests are served like
        // one-byte ones
        let k = (size.max(1) + SEGMENT_STEP - 1) >> SEGMENT_STEP_LOG2;
        self.size_classes.get(k - 1).copied().flatten().map(usize::from)
    }

    /// Allocate a cell for `size` bytes, escalating to larger segments if
    /// the best-fitting one is full. Returns the segment index and the
    /// buffer offset of the cell.
    pub(crate) fn take_cell(&self, arena: &mut Arena<'_>, size: usize) -> Option<(usize, usize)> {
        let first = self.size_class(size)?;
        let (i, segment) = self
            .segments
            .iter()
            .enumerate()
            .skip(first)
            .find(|(i, segment)| {
                let full = segment.is_full(arena);
                if full {
                    log::trace!("segment {i} is full");
                }
                !full
            })?;
        let cell = segment.take_free(arena);
        Some((i, segment.cell_offset(cell)))
    }

    /// Find the segment owning `ptr` and free its cell. Returns the segment
    /// index.
    pub(crate) fn release_cell(
        &self,
        arena: &mut Arena<'_>,
        ptr: NonNull<u8>,
    ) -> Result<usize, ReleaseError> {
        let offset = arena.offset_of(ptr).ok_or(ReleaseError::ForeignPointer)?;

        // The last segment whose base is `<= offset`
        let i = lower_bound!(self.segments.len(), |i| self.segments[i].base <= offset)
            .checked_sub(1)
            .ok_or(ReleaseError::ForeignPointer)?;
        let segment = &self.segments[i];

        if !segment.storage().contains(&offset) {
            return Err(ReleaseError::ForeignPointer);
        }

        let cell = segment.cell_index(offset - segment.base);
        if segment.cell_offset(cell) != offset {
            return Err(ReleaseError::NotCellStart);
        }
        if !segment.is_allocated(arena, cell) {
            return Err(ReleaseError::NotAllocated);
        }

        segment.mark_free(arena, cell);
        Ok(i)
    }
}
