//! The backing buffer
use core::{marker::PhantomData, ptr::NonNull};

/// A byte buffer borrowed for `'pool`.
///
/// Cells handed out to the application alias this buffer, so after
/// construction it's only ever accessed through the raw pointer. The pool
/// itself reads and writes nothing but the bitmap bytes.
pub(crate) struct Arena<'pool> {
    start: NonNull<u8>,
    len: usize,
    _phantom: PhantomData<&'pool mut [u8]>,
}

// Safety: `Arena` is logically a `&'pool mut [u8]`, which is `Send`.
unsafe impl Send for Arena<'_> {}

impl<'pool> Arena<'pool> {
    #[inline]
    pub(crate) fn new(buffer: &'pool mut [u8]) -> Self {
        let len = buffer.len();
        Self {
            start: NonNull::from(buffer).cast(),
            len,
            _phantom: PhantomData,
        }
    }

    /// Give the buffer back.
    #[inline]
    pub(crate) fn into_buffer(self) -> &'pool mut [u8] {
        // Safety: `start` and `len` came from a `&'pool mut [u8]` whose
        //         lifetime `self` has been holding
        unsafe { core::slice::from_raw_parts_mut(self.start.as_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn read(&self, offset: usize) -> u8 {
        assert!(offset < self.len);
        // Safety: In bounds
        unsafe { self.start.as_ptr().add(offset).read() }
    }

    #[inline]
    pub(crate) fn write(&mut self, offset: usize, value: u8) {
        assert!(offset < self.len);
        // Safety: In bounds
        unsafe { self.start.as_ptr().add(offset).write(value) }
    }

    /// Zero-fill `0..len`.
    pub(crate) fn clear(&mut self, len: usize) {
        assert!(len <= self.len);
        // Safety: In bounds
        unsafe { self.start.as_ptr().write_bytes(0, len) }
    }

    /// Get a pointer to the byte at `offset`.
    #[inline]
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset < self.len);
        // Safety: In bounds, so it's derived from a non-null pointer without
        //         wrapping around
        unsafe { NonNull::new_unchecked(self.start.as_ptr().add(offset)) }
    }

    /// Get the offset of `ptr` if it points into the buffer.
    #[inline]
    pub(crate) fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = (ptr.as_ptr() as usize).checked_sub(self.start.as_ptr() as usize)?;
        (offset < self.len).then_some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_roundtrip() {
        let mut buffer = [0u8; 16];
        let arena = Arena::new(&mut buffer);
        for offset in 0..16 {
            assert_eq!(arena.offset_of(arena.ptr_at(offset)), Some(offset));
        }
    }

    #[test]
    fn offset_of_outside() {
        let mut buffer = [0u8; 32];
        let (before, rest) = buffer.split_at_mut(8);
        let (inside, after) = rest.split_at_mut(8);
        let before = NonNull::from(&mut before[7]);
        let after = NonNull::from(&mut after[0]);

        let arena = Arena::new(inside);
        assert_eq!(arena.offset_of(before), None);
        assert_eq!(arena.offset_of(after), None);
    }

    #[test]
    fn read_write_clear() {
        let mut buffer = [0xaau8; 8];
        let mut arena = Arena::new(&mut buffer);
        arena.write(3, 0x55);
        assert_eq!(arena.read(3), 0x55);
        arena.clear(4);
        assert_eq!(arena.into_buffer(), &[0, 0, 0, 0, 0xaa, 0xaa, 0xaa, 0xaa]);
    }
}
