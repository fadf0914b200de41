use std::ptr;

use crate::class::HEADER_SIZE;

/// Header embedded at the start of every block.
///
/// `prev` and `next` only mean something while the block sits in a free list.
#[repr(C)]
pub struct Block {
  pub prev: *mut Block,
  pub next: *mut Block,
  size: u16,
  pub in_use: bool,
}

impl Block {
  /// Writes a fresh, free, unlinked header of `size` bytes at `at`.
  ///
  /// # Safety
  ///
  /// `at` must be valid for writes of `size` bytes and aligned for `Block`.
  pub unsafe fn init(
    at: *mut u8,
    size: usize,
  ) -> *mut Block {
    let block = at as *mut Block;
    unsafe {
      ptr::write(
        block,
        Block {
          prev: ptr::null_mut(),
          next: ptr::null_mut(),
          size: size as u16,
          in_use: false,
        },
      );
    }
    block
  }

  pub fn size(&self) -> usize {
    self.size as usize
  }

  pub fn set_size(
    &mut self,
    size: usize,
  ) {
    self.size = size as u16;
  }

  /// Bytes of this block available to the caller.
  pub fn capacity(&self) -> usize {
    self.size() - HEADER_SIZE
  }
}

/// Address handed to the caller for `block`.
pub fn payload(block: *mut Block) -> *mut u8 {
  (block as *mut u8).wrapping_add(HEADER_SIZE)
}

/// Recovers the header from a payload address returned by [`payload`].
pub fn header(payload: *mut u8) -> *mut Block {
  payload.wrapping_sub(HEADER_SIZE) as *mut Block
}

/// The upper half created when `block` is split into halves of `half` bytes.
pub fn sibling(
  block: *mut Block,
  half: usize,
) -> *mut Block {
  (block as *mut u8).wrapping_add(half) as *mut Block
}

/// The address-buddy of a block of `size` bytes, relative to the start of
/// the segment it lives in.
pub fn buddy(
  block: *mut Block,
  segment_base: usize,
  size: usize,
) -> *mut Block {
  let addr = block as usize;
  let offset = (addr - segment_base) ^ size;

  (block as *mut u8).wrapping_add(segment_base + offset).wrapping_sub(addr) as *mut Block
}
