//! Error types
use core::{fmt, mem::transmute};

/// The macro to define [`ResultCode`].
macro_rules! define_result_code {
    (
        $( #[$meta:meta] )*
        pub enum ResultCode {
            $(
                $( #[$vmeta:meta] )*
                $vname:ident = $vd:expr
            ),* $(,)*
        }
    ) => {
        $( #[$meta] )*
        pub enum ResultCode {
            $(
                $( #[$vmeta] )*
                $vname = $vd
            ),*
        }

        impl ResultCode {
            /// Get the short name of the result code.
            ///
            /// # Examples
            ///
            /// ```
            /// use r3_mempool::ResultCode;
            /// assert_eq!(ResultCode::NotAllocated.as_str(), "NotAllocated");
            /// ```
            pub fn as_str(self) -> &'static str {
                match self {
                    $(
                        Self::$vname => stringify!($vname),
                    )*
                }
            }
        }

        impl fmt::Debug for ResultCode {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl fmt::Display for ResultCode {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_result_code! {
    /// All result codes (including success) that the pool operations can
    /// produce.
    ///
    /// The operation-specific error types ([`BeginError`], [`ReleaseError`])
    /// are subsets of this type sharing its discriminants, so converting them
    /// is free.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[repr(i8)]
    pub enum ResultCode {
        /// The operation was successful.
        Success = 0,
        /// The pool has already been initialized by [`MemPool::begin`].
        ///
        /// [`MemPool::begin`]: crate::MemPool::begin
        AlreadyInitialized = -1,
        /// The pool has not been initialized by [`MemPool::begin`] yet (or
        /// has been reset since).
        ///
        /// [`MemPool::begin`]: crate::MemPool::begin
        NotInitialized = -2,
        /// The segment list is empty.
        NoSegments = -3,
        /// The segment list contains more than [`MAX_SEGMENTS`] entries.
        ///
        /// [`MAX_SEGMENTS`]: crate::MAX_SEGMENTS
        TooManySegments = -4,
        /// A segment has a cell size of zero.
        ZeroCellSize = -5,
        /// A segment's cell size exceeds [`MAX_CELL_SIZE`] bytes.
        ///
        /// [`MAX_CELL_SIZE`]: crate::MAX_CELL_SIZE
        CellTooLarge = -6,
        /// A segment's cell count is zero or exceeds
        /// [`MAX_CELLS_PER_SEGMENT`].
        ///
        /// Counts in `65..=255` fit in [`SegmentSpec::count`] but are
        /// rejected: one pool-summary byte can only track eight pools of
        /// eight cells, so any cell past the 64th could never be allocated.
        /// Such a configuration is treated as an error rather than silently
        /// wasting the excess cells.
        ///
        /// [`SegmentSpec::count`]: crate::SegmentSpec::count
        /// [`MAX_CELLS_PER_SEGMENT`]: crate::MAX_CELLS_PER_SEGMENT
        BadCellCount = -7,
        /// The buffer is too small for the requested layout.
        NoMemory = -8,
        /// The pointer doesn't point into the cell storage of any segment.
        ForeignPointer = -9,
        /// The pointer points into a cell but not at its first byte.
        NotCellStart = -10,
        /// The cell is not allocated. This usually indicates a double release.
        NotAllocated = -11,
    }
}

impl ResultCode {
    /// Get a flag indicating whether the code represents a failure.
    ///
    /// Failure codes have negative values.
    #[inline]
    pub fn is_err(self) -> bool {
        (self as i8) < 0
    }

    /// Get a flag indicating whether the code represents a success.
    ///
    /// Success codes have non-negative values.
    #[inline]
    pub fn is_ok(self) -> bool {
        !self.is_err()
    }
}

macro_rules! define_error {
    (
        mod $mod_name:ident {}
        $( #[$meta:meta] )*
        $vis:vis enum $name:ident {
            $(
                $( #[$vmeta:meta] )*
                $vname:ident
            ),* $(,)*
        }
    ) => {
        $( #[$meta] )*
        ///
        /// See [`ResultCode`] for all result codes and generic descriptions.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(i8)]
        $vis enum $name {
            $(
                $( #[$vmeta] )*
                // Use the same discriminants as `ResultCode` for cost-free
                // conversion
                $vname = ResultCode::$vname as i8
            ),*
        }

        impl fmt::Debug for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Debug::fmt(&ResultCode::from(*self), f)
            }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&ResultCode::from(*self), f)
            }
        }

        impl From<$name> for ResultCode {
            #[inline]
            fn from(x: $name) -> Self {
                // Safety: `ResultCode` and `$name` has the same representation
                //         type, and the representation of `ResultCode` is a
                //         superset of `x`.
                unsafe { transmute(x) }
            }
        }

        #[cfg(test)]
        mod $mod_name {
            use super::*;

            #[test]
            fn to_result_code() {
                $(
                    assert_eq!(
                        ResultCode::$vname,
                        ResultCode::from($name::$vname),
                    );
                )*
            }

            #[test]
            fn is_err() {
                $(
                    assert!(ResultCode::from($name::$vname).is_err());
                )*
            }
        }
    };
}

define_error! {
    mod begin_error {}
    /// Error type for [`MemPool::begin`].
    ///
    /// [`AlreadyInitialized`](Self::AlreadyInitialized) leaves the existing
    /// layout untouched. Any other error leaves the pool uninitialized, so
    /// `begin` can be retried with a different configuration.
    ///
    /// [`MemPool::begin`]: crate::MemPool::begin
    pub enum BeginError {
        AlreadyInitialized,
        NoSegments,
        TooManySegments,
        ZeroCellSize,
        CellTooLarge,
        BadCellCount,
        NoMemory,
    }
}

define_error! {
    mod release_error {}
    /// Error type for [`MemPool::release`].
    ///
    /// The pool state is never modified when this is returned.
    ///
    /// [`MemPool::release`]: crate::MemPool::release
    pub enum ReleaseError {
        NotInitialized,
        ForeignPointer,
        NotCellStart,
        NotAllocated,
    }
}
