//! The arena: every segment obtained from the extension primitive so far.

use std::ptr::{self, NonNull};

use libc::{c_void, intptr_t, sbrk};

use crate::{
  class::SEGMENT_SIZE,
  error::{AllocError, AllocResult},
};

/// Source of raw memory, handed out one [`SEGMENT_SIZE`] region at a time.
///
/// Regions must be valid for reads and writes of `SEGMENT_SIZE` bytes,
/// aligned for a block header, and never overlap each other. They need not
/// be contiguous.
pub trait SegmentSource {
  /// Returns a fresh segment, or `None` once the source is exhausted.
  fn extend(&mut self) -> Option<NonNull<u8>>;
}

/// Grows the program's data segment with `sbrk(2)`.
#[derive(Debug, Default)]
pub struct Sbrk;

impl SegmentSource for Sbrk {
  fn extend(&mut self) -> Option<NonNull<u8>> {
    let address = unsafe { sbrk(SEGMENT_SIZE as intptr_t) };

    if address == usize::MAX as *mut c_void {
      return None;
    }

    NonNull::new(address as *mut u8)
  }
}

#[derive(Clone, Copy)]
#[repr(C, align(2048))]
struct Segment([u8; SEGMENT_SIZE]);

/// A fixed number of owned segments, handed out in ascending address order.
///
/// The buffer is released when the pool is dropped, so blocks carved from it
/// are only valid while the owning allocator lives.
pub struct Pool {
  base: NonNull<Segment>,
  len: usize,
  next: usize,
}

impl Pool {
  pub fn new(segments: usize) -> Self {
    let buffer = vec![Segment([0; SEGMENT_SIZE]); segments].into_boxed_slice();
    let base = NonNull::from(Box::leak(buffer)).cast::<Segment>();

    Self {
      base,
      len: segments,
      next: 0,
    }
  }

  /// Segments not handed out yet.
  pub fn remaining(&self) -> usize {
    self.len - self.next
  }
}

impl SegmentSource for Pool {
  fn extend(&mut self) -> Option<NonNull<u8>> {
    if self.next == self.len {
      return None;
    }

    let segment = unsafe { self.base.add(self.next) };
    self.next += 1;
    Some(segment.cast())
  }
}

impl Drop for Pool {
  fn drop(&mut self) {
    let slice = ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.len);
    drop(unsafe { Box::from_raw(slice) });
  }
}

/// Owns the segment source and remembers where every segment starts.
pub struct Arena<S> {
  source: S,
  /// Segment start addresses, sorted ascending.
  segments: Vec<usize>,
  base: Option<NonNull<u8>>,
}

impl<S: SegmentSource> Arena<S> {
  pub fn new(source: S) -> Self {
    Self {
      source,
      segments: Vec::new(),
      base: None,
    }
  }

  /// Obtains one more segment. Nothing changes when the source is exhausted.
  pub fn extend(&mut self) -> AllocResult<NonNull<u8>> {
    let Some(segment) = self.source.extend() else {
      log::debug!("arena exhausted after {} segments", self.segments.len());
      return Err(AllocError::OutOfMemory);
    };

    let addr = segment.as_ptr() as usize;
    let pos = self.segments.partition_point(|&start| start < addr);
    self.segments.insert(pos, addr);
    if self.base.is_none() {
      self.base = Some(segment);
    }

    log::debug!("extended arena: segment {} at {:p}", self.segments.len(), segment);
    Ok(segment)
  }

  /// Start of the segment containing `addr`.
  pub fn segment_base(
    &self,
    addr: usize,
  ) -> Option<usize> {
    let pos = self.segments.partition_point(|&start| start <= addr);
    let start = *self.segments.get(pos.checked_sub(1)?)?;

    (addr < start + SEGMENT_SIZE).then_some(start)
  }

  /// Address of the very first segment.
  pub fn base(&self) -> Option<NonNull<u8>> {
    self.base
  }

  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }

  pub fn segments(&self) -> usize {
    self.segments.len()
  }

  pub fn total_bytes(&self) -> usize {
    self.segments.len() * SEGMENT_SIZE
  }

  pub fn source(&self) -> &S {
    &self.source
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pool_exhausts() {
    let mut pool = Pool::new(2);

    let first = pool.extend().unwrap();
    let second = pool.extend().unwrap();

    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, SEGMENT_SIZE);
    assert_eq!(first.as_ptr() as usize % SEGMENT_SIZE, 0);
    assert_eq!(pool.remaining(), 0);
    assert!(pool.extend().is_none());
  }

  #[test]
  fn test_extend_failure_leaves_arena_untouched() {
    let mut arena = Arena::new(Pool::new(1));

    let segment = arena.extend().unwrap();
    assert_eq!(arena.base(), Some(segment));

    assert_eq!(arena.extend(), Err(AllocError::OutOfMemory));
    assert_eq!(arena.segments(), 1);
    assert_eq!(arena.total_bytes(), SEGMENT_SIZE);
    assert_eq!(arena.base(), Some(segment));
  }

  #[test]
  fn test_segment_base() {
    let mut arena = Arena::new(Pool::new(3));
    assert_eq!(arena.segment_base(0x1000), None);

    let starts: Vec<usize> = (0..3)
      .map(|_| arena.extend().unwrap().as_ptr() as usize)
      .collect();

    for &start in &starts {
      assert_eq!(arena.segment_base(start), Some(start));
      assert_eq!(arena.segment_base(start + 1000), Some(start));
      assert_eq!(arena.segment_base(start + SEGMENT_SIZE - 1), Some(start));
    }

    assert_eq!(arena.segment_base(starts[0] - 1), None);
    assert_eq!(arena.segment_base(starts[2] + SEGMENT_SIZE), None);
  }
}
