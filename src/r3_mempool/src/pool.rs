//! The memory pool
use core::{fmt, mem, ptr::NonNull};

use crate::{
    arena::Arena,
    error::{BeginError, ReleaseError},
    layout::Layout,
    segment::{SegmentInfo, SegmentSpec},
};

/// A segmented fixed-cell memory pool.
///
/// The pool carves a caller-provided buffer into up to [`MAX_SEGMENTS`]
/// segments, each holding up to [`MAX_CELLS_PER_SEGMENT`] cells of one fixed
/// size (at most [`MAX_CELL_SIZE`] bytes). An allocation request is served by
/// the first free cell of the smallest segment whose cells are large enough,
/// or of the next larger segment if that one is full.
///
/// `allocate` and `release` run in time bounded by the number of segments and
/// never touch a heap.
///
/// # Examples
///
/// ```
/// use r3_mempool::{required_buffer_len, MemPool, SegmentSpec};
///
/// const SEGMENTS: [SegmentSpec; 2] = [
///     SegmentSpec::new(16, 1), // 16 × 8 bytes
///     SegmentSpec::new(4, 4),  // 4 × 32 bytes
/// ];
/// let mut buffer = [0u8; required_buffer_len(&SEGMENTS)];
///
/// let mut pool = MemPool::new(&mut buffer);
/// pool.begin(&SEGMENTS).unwrap();
///
/// let small = pool.allocate(5).unwrap();
/// let large = pool.allocate(20).unwrap();
/// assert_eq!(pool.segment(0).unwrap().cells_in_use, 1);
/// assert_eq!(pool.segment(1).unwrap().cells_in_use, 1);
///
/// pool.release(small).unwrap();
/// pool.release(large).unwrap();
/// ```
///
/// # Thread safety
///
/// The pool performs no synchronization of its own. Every operation takes
/// `&mut self`, and `MemPool` is `Send` but not `Sync`. An instance shared
/// between threads or with interrupt handlers must be guarded by an external
/// lock (e.g., CPU Lock or a mutex).
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<r3_mempool::MemPool<'static>>();
/// ```
///
/// # Pointer validity
///
/// Returned pointers are valid for reads and writes of the cell size until
/// they are passed to [`release`](Self::release), or until the pool is
/// [reset](Self::reset) or dropped. Cells are not aligned beyond one byte in
/// general; see [`allocate_array`](Self::allocate_array).
///
/// [`MAX_SEGMENTS`]: crate::MAX_SEGMENTS
/// [`MAX_CELLS_PER_SEGMENT`]: crate::MAX_CELLS_PER_SEGMENT
/// [`MAX_CELL_SIZE`]: crate::MAX_CELL_SIZE
pub struct MemPool<'pool> {
    arena: Arena<'pool>,
    /// `Some(_)` iff the pool has been initialized by `begin`
    layout: Option<Layout>,
    #[cfg(feature = "stats")]
    counters: crate::stats::Counters,
}

impl<'pool> MemPool<'pool> {
    /// Construct an uninitialized `MemPool` backed by `buffer`.
    ///
    /// The contents of `buffer` are irrelevant; [`begin`](Self::begin)
    /// overwrites the part it uses.
    pub fn new(buffer: &'pool mut [u8]) -> Self {
        Self {
            arena: Arena::new(buffer),
            layout: None,
            #[cfg(feature = "stats")]
            counters: Default::default(),
        }
    }

    /// Release the buffer.
    pub fn into_buffer(self) -> &'pool mut [u8] {
        self.arena.into_buffer()
    }

    /// Get the length of the backing buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Get a flag indicating whether [`begin`](Self::begin) has succeeded.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.layout.is_some()
    }

    /// Lay out the specified segments in the buffer.
    ///
    /// The segments may be specified in any order; they are arranged in
    /// ascending order of cell size. Segments of the same size retain their
    /// relative order, and a full segment overflows into the next one.
    ///
    /// This method fails with [`BeginError::AlreadyInitialized`] if the pool
    /// is already initialized, leaving it untouched. On any other error the
    /// pool stays uninitialized.
    pub fn begin(&mut self, specs: &[SegmentSpec]) -> Result<(), BeginError> {
        if self.layout.is_some() {
            log::warn!("begin: the pool is already initialized");
            return Err(BeginError::AlreadyInitialized);
        }

        let layout = Layout::new(specs, self.arena.len()).map_err(|e| {
            log::warn!("begin: rejected configuration {specs:?}: {e}");
            e
        })?;
        layout.format(&mut self.arena);

        log::debug!(
            "begin: {} segments, {} of {} bytes used",
            layout.segments.len(),
            layout.len,
            self.arena.len(),
        );
        for (i, segment) in layout.segments.iter().enumerate() {
            log::debug!(
                "  segment {i}: {} × {} bytes at {:?}",
                segment.cell_count,
                segment.cell_size,
                segment.storage(),
            );
        }

        self.layout = Some(layout);
        #[cfg(feature = "stats")]
        {
            self.counters = Default::default();
        }
        Ok(())
    }

    /// Discard the layout and return to the uninitialized state, after which
    /// [`begin`](Self::begin) can be called again.
    ///
    /// All pointers returned by the pool become invalid.
    pub fn reset(&mut self) {
        if self.layout.take().is_some() {
            log::debug!("reset");
        }
        #[cfg(feature = "stats")]
        {
            self.counters = Default::default();
        }
    }

    /// Get the largest cell size, which is also the largest allocation size.
    /// Returns `0` if the pool is uninitialized.
    #[inline]
    pub fn max_cell_size(&self) -> usize {
        self.layout.as_ref().map_or(0, Layout::max_cell_size)
    }

    /// Get the number of segments.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.segments.len())
    }

    /// Get the number of buffer bytes used by the current layout.
    #[inline]
    pub fn used_len(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.len)
    }

    /// Get information about the `i`-th segment in ascending order of cell
    /// size.
    pub fn segment(&self, i: usize) -> Option<SegmentInfo> {
        let segment = self.layout.as_ref()?.segments.get(i)?;
        Some(segment.info(&self.arena))
    }

    /// Get the index of the segment a request for `size` bytes would be tried
    /// on first.
    pub fn size_class(&self, size: usize) -> Option<usize> {
        self.layout.as_ref()?.size_class(size)
    }

    /// Allocate a cell that can hold `size` bytes.
    ///
    /// Returns `None` if the pool is uninitialized, if `size` exceeds
    /// [`max_cell_size`](Self::max_cell_size), or if every segment that could
    /// hold `size` bytes is full. A zero-sized request consumes a cell of the
    /// smallest segment.
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        let Some((i, ptr)) = self.take_cell(size) else {
            self.record_failure();
            return None;
        };
        self.record_alloc(i);
        Some(ptr)
    }

    /// Mark a cell for `size` bytes as used without touching the statistics.
    /// Returns the segment index and the cell pointer.
    fn take_cell(&mut self, size: usize) -> Option<(usize, NonNull<u8>)> {
        let Some(layout) = &self.layout else {
            log::trace!("allocate({size}): the pool is uninitialized");
            return None;
        };

        let Some((i, offset)) = layout.take_cell(&mut self.arena, size) else {
            log::trace!("allocate({size}) = None");
            return None;
        };

        let ptr = self.arena.ptr_at(offset);
        log::trace!("allocate({size}) = {ptr:p} (segment {i})");
        Some((i, ptr))
    }

    #[inline]
    fn record_alloc(&mut self, _segment: usize) {
        #[cfg(feature = "stats")]
        {
            if let Some(layout) = &mut self.layout {
                self.counters.record_alloc();
                layout.segments[_segment].stats.record_alloc();
            }
        }
    }

    #[inline]
    fn record_failure(&mut self) {
        #[cfg(feature = "stats")]
        {
            if self.layout.is_some() {
                self.counters.record_failure();
            }
        }
    }

    /// Return a cell to the pool.
    ///
    /// The pool state is left unchanged if `ptr` does not point into any
    /// segment's cells ([`ForeignPointer`]), points into the middle of a cell
    /// ([`NotCellStart`]), or points to a cell that is not allocated
    /// ([`NotAllocated`], which includes releasing the same pointer twice).
    ///
    /// [`ForeignPointer`]: ReleaseError::ForeignPointer
    /// [`NotCellStart`]: ReleaseError::NotCellStart
    /// [`NotAllocated`]: ReleaseError::NotAllocated
    pub fn release(&mut self, ptr: NonNull<u8>) -> Result<(), ReleaseError> {
        let layout = self.layout.as_mut().ok_or(ReleaseError::NotInitialized)?;

        match layout.release_cell(&mut self.arena, ptr) {
            Ok(_i) => {
                log::trace!("release({ptr:p}) (segment {_i})");
                #[cfg(feature = "stats")]
                layout.segments[_i].stats.record_release();
                Ok(())
            }
            Err(e) => {
                log::warn!("release({ptr:p}) rejected: {e}");
                Err(e)
            }
        }
    }

    /// Allocate a cell for `count` elements of type `T`.
    ///
    /// In addition to the conditions of [`allocate`](Self::allocate), this
    /// method fails if `count * size_of::<T>()` overflows or if the cell
    /// chosen for the request is not suitably aligned for `T`. In the latter
    /// case the cell is returned to the pool before returning `None`.
    pub fn allocate_array<T>(&mut self, count: usize) -> Option<NonNull<T>> {
        let Some(size) = mem::size_of::<T>().checked_mul(count) else {
            self.record_failure();
            return None;
        };
        let Some((i, ptr)) = self.take_cell(size) else {
            self.record_failure();
            return None;
        };

        if ptr.as_ptr() as usize % mem::align_of::<T>() != 0 {
            log::debug!(
                "allocate_array: {ptr:p} is not aligned to {} bytes",
                mem::align_of::<T>()
            );
            if let Some(layout) = &self.layout {
                // We've just taken it, so this can't fail
                let _ = layout.release_cell(&mut self.arena, ptr);
            }
            self.record_failure();
            return None;
        }

        self.record_alloc(i);
        Some(ptr.cast())
    }

    /// Return a cell allocated by [`allocate_array`](Self::allocate_array).
    #[inline]
    pub fn release_array<T>(&mut self, ptr: NonNull<T>) -> Result<(), ReleaseError> {
        self.release(ptr.cast())
    }

    /// Get a snapshot of the allocation statistics.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> crate::stats::PoolStats {
        crate::stats::PoolStats {
            total_allocs: self.counters.total_allocs,
            failed_allocs: self.counters.failed_allocs,
            segments: self
                .layout
                .iter()
                .flat_map(|l| l.segments.iter())
                .map(|s| s.stats)
                .collect(),
        }
    }

    #[inline]
    pub(crate) fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    #[inline]
    pub(crate) fn arena(&self) -> &Arena<'pool> {
        &self.arena
    }
}

impl fmt::Debug for MemPool<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("MemPool");
        s.field("capacity", &self.capacity());
        if let Some(layout) = &self.layout {
            s.field("used_len", &layout.len).field(
                "segments",
                &DebugSegments {
                    layout,
                    arena: &self.arena,
                },
            );
        } else {
            s.field("segments", &format_args!("< uninitialized >"));
        }
        s.finish()
    }
}

struct DebugSegments<'a, 'pool> {
    layout: &'a Layout,
    arena: &'a Arena<'pool>,
}

impl fmt::Debug for DebugSegments<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.layout.segments.iter().map(|s| s.info(self.arena)))
            .finish()
    }
}
