/// Copies `n` bytes from `src` to `dest`, correct when the ranges overlap.
///
/// Copies front to back when `dest < src` and back to front when
/// `dest > src`, so no source byte is overwritten before it is read.
/// Returns `dest`.
///
/// # Safety
///
/// `src` must be valid for reads and `dest` valid for writes of `n` bytes.
pub unsafe fn move_bytes(
  dest: *mut u8,
  src: *const u8,
  n: usize,
) -> *mut u8 {
  unsafe {
    if (dest as *const u8) < src {
      for i in 0..n {
        *dest.add(i) = *src.add(i);
      }
    } else if (dest as *const u8) > src {
      for i in (0..n).rev() {
        *dest.add(i) = *src.add(i);
      }
    }
  }

  dest
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
  }

  /// Expected buffer after moving `n` bytes from `src` to `dest`, computed
  /// through a separate temporary copy.
  fn reference(
    buf: &[u8],
    dest: usize,
    src: usize,
    n: usize,
  ) -> Vec<u8> {
    let tmp = buf[src..src + n].to_vec();
    let mut out = buf.to_vec();
    out[dest..dest + n].copy_from_slice(&tmp);
    out
  }

  #[test]
  fn test_forward_overlap() {
    let mut buf = pattern(64);
    let expected = reference(&buf, 10, 4, 40);

    let base = buf.as_mut_ptr();
    let ret = unsafe { move_bytes(base.add(10), base.add(4), 40) };

    assert_eq!(ret, unsafe { base.add(10) });
    assert_eq!(buf, expected);
  }

  #[test]
  fn test_backward_overlap() {
    let mut buf = pattern(64);
    let expected = reference(&buf, 2, 9, 50);

    let base = buf.as_mut_ptr();
    unsafe { move_bytes(base.add(2), base.add(9), 50) };

    assert_eq!(buf, expected);
  }

  #[test]
  fn test_same_and_disjoint() {
    let mut buf = pattern(32);
    let before = buf.clone();

    let base = buf.as_mut_ptr();
    unsafe { move_bytes(base, base, 32) };
    assert_eq!(buf, before);

    let expected = reference(&buf, 16, 0, 16);
    let base = buf.as_mut_ptr();
    unsafe { move_bytes(base.add(16), base, 16) };
    assert_eq!(buf, expected);

    let base = buf.as_mut_ptr();
    unsafe { move_bytes(base.add(1), base, 0) };
    assert_eq!(buf, expected);
  }
}
