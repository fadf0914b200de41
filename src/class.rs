//! Size classes: the eight power-of-two block sizes the allocator hands out.

use std::mem;

use crate::block::Block;

/// Size of one region obtained from the arena-extension primitive.
/// This is also the largest block size.
pub const SEGMENT_SIZE: usize = 2048;

/// The smallest block size.
pub const MIN_BLOCK_SIZE: usize = 16;

/// Number of size classes, `16, 32, ..., 2048`.
pub const CLASS_COUNT: usize = 8;

/// Bytes at the start of every block reserved for its header.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

/// The largest payload a single request may ask for.
pub const MAX_PAYLOAD: usize = SEGMENT_SIZE - HEADER_SIZE;

/// Returns the block size that serves a request of `requested` payload bytes:
/// the smallest power of two `>= requested + HEADER_SIZE`, floored at
/// [`MIN_BLOCK_SIZE`].
///
/// Callers reject requests above [`MAX_PAYLOAD`] before calling this.
///
/// ```rust
/// use rbuddy::class::{size_needed, HEADER_SIZE};
///
/// assert_eq!(size_needed(1), (1 + HEADER_SIZE).next_power_of_two().max(16));
/// ```
pub fn size_needed(requested: usize) -> usize {
  (requested + HEADER_SIZE).next_power_of_two().max(MIN_BLOCK_SIZE)
}

/// Returns whether a request of `requested` bytes fits in one segment.
pub fn fits_in_segment(requested: usize) -> bool {
  matches!(requested.checked_add(HEADER_SIZE), Some(total) if total <= SEGMENT_SIZE)
}

/// Free-list index of a block of `block_size` bytes.
pub fn index_of(block_size: usize) -> usize {
  debug_assert!(block_size.is_power_of_two());
  debug_assert!((MIN_BLOCK_SIZE..=SEGMENT_SIZE).contains(&block_size));

  (block_size.trailing_zeros() - MIN_BLOCK_SIZE.trailing_zeros()) as usize
}

/// Block size held by free-list `index`.
pub fn class_size(index: usize) -> usize {
  MIN_BLOCK_SIZE << index
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_index_of() {
    let sizes = [16, 32, 64, 128, 256, 512, 1024, 2048];

    for (expected, size) in sizes.into_iter().enumerate() {
      assert_eq!(expected, index_of(size));
      assert_eq!(size, class_size(expected));
    }

    assert_eq!(class_size(CLASS_COUNT - 1), SEGMENT_SIZE);
  }

  #[test]
  fn test_size_needed() {
    for requested in 1..=MAX_PAYLOAD {
      let size = size_needed(requested);
      let total = requested + HEADER_SIZE;

      assert!(size.is_power_of_two());
      assert!(size >= total);
      assert!(size / 2 < total || size == MIN_BLOCK_SIZE);
      assert!(size <= SEGMENT_SIZE);
    }

    assert_eq!(size_needed(MAX_PAYLOAD), SEGMENT_SIZE);
  }

  #[test]
  fn test_fits_in_segment() {
    assert!(fits_in_segment(0));
    assert!(fits_in_segment(MAX_PAYLOAD));
    assert!(!fits_in_segment(MAX_PAYLOAD + 1));
    assert!(!fits_in_segment(usize::MAX));
  }
}
