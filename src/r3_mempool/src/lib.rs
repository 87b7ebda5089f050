#![deny(unsafe_op_in_unsafe_fn)]
#![doc = include_str!("./lib.md")]
#![cfg_attr(not(test), no_std)] // Link `std` only when building a test (`cfg(test)`)

#[macro_use]
mod utils;
mod arena;
mod diag;
mod error;
mod layout;
mod pool;
mod segment;
#[cfg(feature = "stats")]
pub mod stats;


pub use self::{
    diag::{BufferDump, Radix, SizeClassDump, StatsReport},
    error::{BeginError, ReleaseError, ResultCode},
    layout::required_buffer_len,
    pool::MemPool,
    segment::{SegmentInfo, SegmentSpec},
};

#[cfg(feature = "stats")]
#[doc(no_inline)]
pub use self::stats::{PoolStats, SegmentStats};

/// The base-2 logarithm of [`SEGMENT_STEP`].
pub const SEGMENT_STEP_LOG2: u32 = 3;

/// The granularity of cell sizes in bytes. [`SegmentSpec::size`] is measured
/// in this unit.
pub const SEGMENT_STEP: usize = 1 << SEGMENT_STEP_LOG2;

/// The largest supported cell size in bytes.
pub const MAX_CELL_SIZE: usize = 64;

/// The maximum number of segments in a pool.
pub const MAX_SEGMENTS: usize = 32;

/// The maximum number of cells in a segment. A segment's pool-summary bitmap
/// is a single byte, each bit of which covers eight cells.
///
/// [`MemPool::begin`] rejects larger counts with
/// [`BeginError::BadCellCount`] even though [`SegmentSpec::count`] could
/// express up to 255 cells.
pub const MAX_CELLS_PER_SEGMENT: usize = 64;

/// The number of entries in the size class table.
const SIZE_CLASS_COUNT: usize = MAX_CELL_SIZE / SEGMENT_STEP;

// `CellDivisor` works on word offsets
const _: () = assert!(SEGMENT_STEP % 4 == 0);
const _: () = assert!(MAX_CELL_SIZE % SEGMENT_STEP == 0);
const _: () = assert!(MAX_CELLS_PER_SEGMENT <= 64);
// Segment indices are stored as `u8`
const _: () = assert!(MAX_SEGMENTS <= u8::MAX as usize);
