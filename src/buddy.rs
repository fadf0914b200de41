use std::ptr::{self, NonNull};

use crate::{
  arena::{Arena, SegmentSource, Sbrk},
  block::{self, Block},
  class::{CLASS_COUNT, SEGMENT_SIZE, class_size, fits_in_segment, index_of, size_needed},
  error::{AllocError, AllocResult, ErrorCode},
  free_list::FreeLists,
  mem,
  stats::AllocStats,
};

/// A buddy-system allocator over an arena grown one segment at a time.
///
/// Every instance owns its arena and free lists; nothing is shared between
/// instances. It is not thread safe: concurrent callers need one lock
/// around every call.
pub struct BuddyAllocator<S: SegmentSource> {
  arena: Arena<S>,
  lists: FreeLists,
  errno: ErrorCode,
  in_use: usize,
  requested: usize,
}

impl BuddyAllocator<Sbrk> {
  /// An allocator backed by the program's data segment.
  pub fn sbrk() -> Self {
    Self::new(Sbrk)
  }
}

impl<S: SegmentSource> BuddyAllocator<S> {
  pub fn new(source: S) -> Self {
    Self {
      arena: Arena::new(source),
      lists: FreeLists::new(),
      errno: ErrorCode::NoError,
      in_use: 0,
      requested: 0,
    }
  }

  /// Result of the most recent call.
  pub fn last_error(&self) -> ErrorCode {
    self.errno
  }

  pub fn arena(&self) -> &Arena<S> {
    &self.arena
  }

  /// Allocates at least `size` bytes.
  ///
  /// Returns `Ok(None)` for a zero-byte request without touching any state.
  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> AllocResult<Option<NonNull<u8>>> {
    if !fits_in_segment(size) {
      return Err(AllocError::SingleRequestTooLarge { requested: size });
    }

    if size == 0 {
      return Ok(None);
    }

    if self.arena.is_empty() {
      self.grow()?;
    }

    let full_size = size_needed(size);
    let index = index_of(full_size);

    if self.lists.is_empty(index) {
      let current = match self.lists.first_non_empty(index + 1) {
        Some(current) => current,
        None => {
          self.grow()?;
          CLASS_COUNT - 1
        }
      };

      self.split(index, current);
    }

    let Some(block) = self.lists.pop_front(index) else {
      unreachable!("split leaves a free block of class {index}");
    };

    unsafe { (*block).in_use = true };
    self.in_use += full_size;
    self.requested += size;

    let payload = block::payload(block);
    log::trace!("allocated {} bytes in a {} byte block at {:p}", size, full_size, payload);
    Ok(NonNull::new(payload))
  }

  /// Allocates at least `size` bytes, returning null on failure or for a
  /// zero-byte request. Failures are reported through [`last_error`].
  ///
  /// [`last_error`]: Self::last_error
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    match self.try_allocate(size) {
      Ok(Some(payload)) => {
        self.errno = ErrorCode::NoError;
        payload.as_ptr()
      }
      Ok(None) => ptr::null_mut(),
      Err(err) => {
        self.errno = ErrorCode::from(&err);
        ptr::null_mut()
      }
    }
  }

  /// Allocates room for `count` elements of `elem_size` bytes and zeroes the
  /// whole payload of the granted block, which may exceed `count * elem_size`.
  pub fn try_zero_allocate(
    &mut self,
    count: usize,
    elem_size: usize,
  ) -> AllocResult<Option<NonNull<u8>>> {
    let total = match count.checked_mul(elem_size) {
      Some(total) if total <= SEGMENT_SIZE => total,
      _ => {
        return Err(AllocError::SingleRequestTooLarge {
          requested: count.saturating_mul(elem_size),
        });
      }
    };

    let Some(payload) = self.try_allocate(total)? else {
      return Ok(None);
    };

    unsafe {
      let capacity = (*block::header(payload.as_ptr())).capacity();
      ptr::write_bytes(payload.as_ptr(), 0, capacity);
    }

    Ok(Some(payload))
  }

  /// Pointer-returning form of [`try_zero_allocate`](Self::try_zero_allocate).
  pub fn zero_allocate(
    &mut self,
    count: usize,
    elem_size: usize,
  ) -> *mut u8 {
    match self.try_zero_allocate(count, elem_size) {
      Ok(Some(payload)) => {
        self.errno = ErrorCode::NoError;
        payload.as_ptr()
      }
      Ok(None) => ptr::null_mut(),
      Err(err) => {
        self.errno = ErrorCode::from(&err);
        ptr::null_mut()
      }
    }
  }

  /// Returns a block to the allocator, coalescing it with its buddy for as
  /// long as the buddy is free. Null is ignored.
  ///
  /// # Safety
  ///
  /// `address` must be null or a live pointer returned by this allocator.
  pub unsafe fn release(
    &mut self,
    address: *mut u8,
  ) {
    if address.is_null() {
      return;
    }

    unsafe {
      let mut block = block::header(address);
      (*block).in_use = false;
      self.in_use -= (*block).size();
      log::trace!("released {} byte block at {:p}", (*block).size(), address);

      self.lists.insert(block);
      while let Some(merged) = self.merge_with_buddy(block) {
        self.lists.insert(merged);
        block = merged;
      }
    }

    self.errno = ErrorCode::NoError;
  }

  /// See [`mem::move_bytes`].
  ///
  /// # Safety
  ///
  /// `src` must be valid for reads and `dest` valid for writes of `n` bytes.
  pub unsafe fn move_bytes(
    &mut self,
    dest: *mut u8,
    src: *const u8,
    n: usize,
  ) -> *mut u8 {
    self.errno = ErrorCode::NoError;
    unsafe { mem::move_bytes(dest, src, n) }
  }

  /// Bytes usable at `address`.
  ///
  /// # Safety
  ///
  /// `address` must be a live pointer returned by this allocator.
  pub unsafe fn usable_size(
    &self,
    address: *mut u8,
  ) -> usize {
    unsafe { (*block::header(address)).capacity() }
  }

  pub fn stats(&self) -> AllocStats {
    let mut free_blocks = [0; CLASS_COUNT];
    for (index, count) in free_blocks.iter_mut().enumerate() {
      *count = self.lists.len(index);
    }

    AllocStats {
      segments: self.arena.segments(),
      total: self.arena.total_bytes(),
      in_use: self.in_use,
      requested: self.requested,
      free_blocks,
    }
  }

  /// Adds a new segment to the top free list.
  fn grow(&mut self) -> AllocResult<()> {
    let segment = self.arena.extend()?;

    unsafe {
      let block = Block::init(segment.as_ptr(), SEGMENT_SIZE);
      self.lists.insert(block);
    }
    Ok(())
  }

  /// Halves the head of list `current` until list `target` holds a block.
  ///
  /// Lists between `target` and `current` must be empty, so the block split
  /// on each step is the half produced by the step before.
  fn split(
    &mut self,
    target: usize,
    mut current: usize,
  ) {
    while current > target {
      let Some(block) = self.lists.pop_front(current) else {
        unreachable!("split needs a free block of class {current}");
      };

      let half = class_size(current - 1);
      unsafe {
        (*block).set_size(half);
        self.lists.insert(block);

        let sibling = Block::init(block::sibling(block, half) as *mut u8, half);
        self.lists.insert(sibling);
        log::trace!("split {:p} into two {} byte blocks", block, half);
      }

      current -= 1;
    }
  }

  /// Coalesces the free `block` with its buddy if the buddy is free and the
  /// same size. Both leave their list; the lower one, doubled, is returned
  /// for the caller to insert. On `None` nothing is touched.
  ///
  /// # Safety
  ///
  /// `block` must be a free block linked into the registry.
  unsafe fn merge_with_buddy(
    &mut self,
    block: *mut Block,
  ) -> Option<*mut Block> {
    unsafe {
      let size = (*block).size();
      if size == SEGMENT_SIZE || (*block).in_use {
        return None;
      }

      let segment_base = self.arena.segment_base(block as usize)?;
      let buddy = block::buddy(block, segment_base, size);

      if buddy == block || (*buddy).size() != size || (*buddy).in_use {
        return None;
      }

      self.lists.remove(block);
      self.lists.remove(buddy);

      let first = if block < buddy { block } else { buddy };
      (*first).set_size(size * 2);
      (*first).in_use = false;

      log::trace!("merged {:p} and {:p} into a {} byte block", block, buddy, size * 2);
      Some(first)
    }
  }
}
