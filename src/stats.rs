use std::fmt;

use crate::class::{CLASS_COUNT, class_size};

/// Snapshot of an allocator's memory usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocStats {
  /// Segments obtained from the source.
  pub segments: usize,
  /// Bytes obtained from the source.
  pub total: usize,
  /// Bytes in blocks currently owned by callers, headers included.
  pub in_use: usize,
  /// Sum of payload sizes requested by successful allocations, ever.
  pub requested: usize,
  /// Number of free blocks per size class.
  pub free_blocks: [usize; CLASS_COUNT],
}

impl AllocStats {
  /// Bytes sitting in free lists.
  pub fn free(&self) -> usize {
    self
      .free_blocks
      .iter()
      .enumerate()
      .map(|(index, count)| count * class_size(index))
      .sum()
  }
}

impl fmt::Display for AllocStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Buddy Allocator")?;
    writeln!(f, "~~~~~~~~~~~~~~~")?;
    writeln!(f, "Segments:        {}", self.segments)?;
    writeln!(f, "Total bytes:     0x{:x}", self.total)?;
    writeln!(f, "In-use bytes:    0x{:x}", self.in_use)?;
    writeln!(f, "Requested bytes: 0x{:x}", self.requested)?;
    for (index, count) in self.free_blocks.iter().enumerate() {
      writeln!(f, "Free {:>4}:       {}", class_size(index), count)?;
    }
    writeln!(f, "~~~~~~~~~~~~~~~")
  }
}
