//! Human-readable dumps for debugging
//!
//! Each dump is a `Display` proxy, so it can be written to any sink
//! implementing `fmt::Write` (a serial port driver, a `String`, etc.) without
//! allocating.
use core::fmt;

use crate::{layout::Layout, MemPool};

/// The base in which numbers are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radix {
    /// Eight binary digits per byte
    Binary,
    Decimal,
    /// Two lower-case hexadecimal digits per byte
    Hex,
}

impl Radix {
    fn fmt_byte(self, x: u8, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "{x:08b}"),
            Self::Decimal => write!(f, "{x}"),
            Self::Hex => write!(f, "{x:02x}"),
        }
    }
}

/// Write `items` separated by spaces.
fn fmt_spaced<T>(
    f: &mut fmt::Formatter,
    items: impl IntoIterator<Item = T>,
    mut fmt_item: impl FnMut(T, &mut fmt::Formatter) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        fmt_item(item, f)?;
    }
    Ok(())
}

/// Returned by [`MemPool::buffer_dump`].
pub struct BufferDump<'a, 'pool> {
    pool: &'a MemPool<'pool>,
    radix: Radix,
}

impl fmt::Display for BufferDump<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let arena = self.pool.arena();
        fmt_spaced(f, 0..self.pool.used_len(), |offset, f| {
            self.radix.fmt_byte(arena.read(offset), f)
        })
    }
}

/// Returned by [`MemPool::size_class_dump`].
pub struct SizeClassDump<'a> {
    layout: Option<&'a Layout>,
    radix: Radix,
}

impl fmt::Display for SizeClassDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Some(layout) = self.layout else {
            return Ok(());
        };
        fmt_spaced(f, layout.size_classes(), |entry, f| match entry {
            Some(i) => self.radix.fmt_byte(*i, f),
            None => f.write_str("-1"),
        })
    }
}

/// Returned by [`MemPool::stats_report`].
pub struct StatsReport<'a, 'pool> {
    #[cfg_attr(not(feature = "stats"), allow(dead_code))]
    pool: &'a MemPool<'pool>,
}

impl fmt::Display for StatsReport<'_, '_> {
    #[cfg(feature = "stats")]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let stats = self.pool.stats();
        writeln!(f, "Total allocs: {}", stats.total_allocs)?;
        writeln!(f, "Failed allocs: {}", stats.failed_allocs)?;
        for (i, segment) in stats.segments.iter().enumerate() {
            writeln!(
                f,
                "Segment {i}: max cells used = {}, allocs = {}",
                segment.peak_in_use, segment.allocs
            )?;
        }
        Ok(())
    }

    #[cfg(not(feature = "stats"))]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Statistics are not available. Enable the `stats` feature to see them."
        )
    }
}

impl<'pool> MemPool<'pool> {
    /// Get a `Display` proxy that prints every buffer byte used by the layout,
    /// bitmaps and cells alike, separated by spaces. Prints nothing if the
    /// pool is uninitialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use r3_mempool::{MemPool, Radix, SegmentSpec};
    /// let mut buffer = [0xaau8; 16];
    /// let mut pool = MemPool::new(&mut buffer);
    /// pool.begin(&[SegmentSpec::new(1, 1)]).unwrap();
    /// assert_eq!(
    ///     pool.buffer_dump(Radix::Hex).to_string(),
    ///     "fe fe 00 00 00 00 00 00 00 00",
    /// );
    /// ```
    pub fn buffer_dump(&self, radix: Radix) -> BufferDump<'_, 'pool> {
        BufferDump { pool: self, radix }
    }

    /// Get a `Display` proxy that prints the size class table. Entry `k` is
    /// the index of the first segment that can hold `(k + 1) * SEGMENT_STEP`
    /// bytes, or `-1` if there's none.
    pub fn size_class_dump(&self, radix: Radix) -> SizeClassDump<'_> {
        SizeClassDump {
            layout: self.layout(),
            radix,
        }
    }

    /// Get a `Display` proxy that prints the allocation statistics, one item
    /// per line. Without the `stats` feature, it prints a notice instead.
    pub fn stats_report(&self) -> StatsReport<'_, 'pool> {
        StatsReport { pool: self }
    }
}
