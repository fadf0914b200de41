//! Allocator errors.

use thiserror::Error;

use crate::class::MAX_PAYLOAD;

/// Result type for allocator operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Reasons an allocation request can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  /// The arena-extension primitive has no more memory.
  #[error("out of memory: the arena could not be extended")]
  OutOfMemory,

  /// The request plus header does not fit in one segment.
  #[error("request of {requested} bytes exceeds the {max} byte maximum", max = MAX_PAYLOAD)]
  SingleRequestTooLarge { requested: usize },
}

/// Last-error indicator of an allocator instance.
///
/// Every call overwrites it, so it must be read right after a call that
/// returned null.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
  #[default]
  NoError,
  OutOfMemory,
  SingleRequestTooLarge,
}

impl From<&AllocError> for ErrorCode {
  fn from(err: &AllocError) -> Self {
    match err {
      AllocError::OutOfMemory => ErrorCode::OutOfMemory,
      AllocError::SingleRequestTooLarge { .. } => ErrorCode::SingleRequestTooLarge,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_code() {
    assert_eq!(ErrorCode::default(), ErrorCode::NoError);
    assert_eq!(ErrorCode::from(&AllocError::OutOfMemory), ErrorCode::OutOfMemory);
    assert_eq!(
      ErrorCode::from(&AllocError::SingleRequestTooLarge { requested: 4096 }),
      ErrorCode::SingleRequestTooLarge
    );
  }

  #[test]
  fn test_display() {
    let err = AllocError::SingleRequestTooLarge { requested: 4096 };
    assert_eq!(
      err.to_string(),
      format!("request of 4096 bytes exceeds the {} byte maximum", MAX_PAYLOAD)
    );
  }
}
