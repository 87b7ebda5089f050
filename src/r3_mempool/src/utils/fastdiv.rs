//! Division by a cell size without a hardware divider
//!
//! Most targets this crate is meant for have a 16×16 multiplier but no
//! divider, so recovering a cell index from a byte offset is done with either
//! a shift (power-of-two cell sizes) or a fixed-point reciprocal multiply.

/// The number of fractional bits of [`CellDivisor::Reciprocal`].
const RECIPROCAL_SHIFT: u32 = 16;

/// Divides a byte offset by a fixed cell size.
///
/// The reciprocal form requires the cell size to be a multiple of four: the
/// two low-order bits are discarded from the offset before multiplying, which
/// keeps the product within 32 bits for any offset inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellDivisor {
    /// `offset >> self.0`
    Shift(u32),
    /// `((offset >> 2) * self.0) >> 16`
    Reciprocal(u32),
}

impl CellDivisor {
    /// Construct a `CellDivisor` for `cell_size`.
    ///
    /// `cell_size` must be a power of two or a non-zero multiple of four.
    pub const fn new(cell_size: usize) -> Self {
        assert!(cell_size != 0);
        if cell_size.is_power_of_two() {
            Self::Shift(cell_size.trailing_zeros())
        } else {
            assert!(cell_size % 4 == 0, "cell size must be a multiple of four");
            let quarter = (cell_size >> 2) as u32;
            // `ceil(2¹⁶ / quarter)`
            Self::Reciprocal(((1 << RECIPROCAL_SHIFT) + quarter - 1) / quarter)
        }
    }

    /// Calculate `offset / cell_size`.
    ///
    /// The result is exact as long as `offset / 4` is small enough for the
    /// rounding error of the reciprocal to stay below one quotient step. For
    /// cell sizes up to [`MAX_CELL_SIZE`] this holds for every offset inside a
    /// segment of [`MAX_CELLS_PER_SEGMENT`] cells.
    ///
    /// [`MAX_CELL_SIZE`]: crate::MAX_CELL_SIZE
    /// [`MAX_CELLS_PER_SEGMENT`]: crate::MAX_CELLS_PER_SEGMENT
    #[inline]
    pub fn divide(self, offset: usize) -> usize {
        match self {
            Self::Shift(shift) => offset >> shift,
            Self::Reciprocal(magic) => {
                let quarter = offset as u32 >> 2;
                ((quarter * magic) >> RECIPROCAL_SHIFT) as usize
            }
        }
    }
}
