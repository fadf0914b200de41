//! Intrusive doubly linked free lists, one per size class.

use std::{marker::PhantomData, ptr};

use crate::{
  block::Block,
  class::{CLASS_COUNT, index_of},
};

/// The free-list registry.
///
/// Blocks are appended at the tail and taken from the head, so each class
/// hands out its least recently freed block first.
pub struct FreeLists {
  heads: [*mut Block; CLASS_COUNT],
  tails: [*mut Block; CLASS_COUNT],
}

impl FreeLists {
  pub const fn new() -> Self {
    Self {
      heads: [ptr::null_mut(); CLASS_COUNT],
      tails: [ptr::null_mut(); CLASS_COUNT],
    }
  }

  pub fn is_empty(
    &self,
    index: usize,
  ) -> bool {
    self.heads[index].is_null()
  }

  /// Appends `block` to the list matching its size.
  ///
  /// # Safety
  ///
  /// `block` must point to a valid free header that is in no list.
  pub unsafe fn insert(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let index = index_of((*block).size());
      let tail = self.tails[index];

      (*block).prev = tail;
      (*block).next = ptr::null_mut();

      if tail.is_null() {
        self.heads[index] = block;
      } else {
        (*tail).next = block;
      }
      self.tails[index] = block;
    }
  }

  /// Unlinks `block` from the list matching its size and clears its links.
  ///
  /// # Safety
  ///
  /// `block` must currently be linked into the list for its size.
  pub unsafe fn remove(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let index = index_of((*block).size());
      let prev = (*block).prev;
      let next = (*block).next;

      if prev.is_null() {
        self.heads[index] = next;
      } else {
        (*prev).next = next;
      }

      if next.is_null() {
        self.tails[index] = prev;
      } else {
        (*next).prev = prev;
      }

      (*block).prev = ptr::null_mut();
      (*block).next = ptr::null_mut();
    }
  }

  /// Removes and returns the head of list `index`, if any.
  pub fn pop_front(
    &mut self,
    index: usize,
  ) -> Option<*mut Block> {
    let head = self.heads[index];
    if head.is_null() {
      return None;
    }

    // SAFETY: every block in the registry was linked by `insert`.
    unsafe { self.remove(head) };
    Some(head)
  }

  /// Smallest non-empty list with an index `>= from`.
  pub fn first_non_empty(
    &self,
    from: usize,
  ) -> Option<usize> {
    (from..CLASS_COUNT).find(|&index| !self.is_empty(index))
  }

  /// Iterates list `index` from head to tail.
  pub fn iter(
    &self,
    index: usize,
  ) -> Iter<'_> {
    Iter {
      current: self.heads[index],
      _lifetime: PhantomData,
    }
  }

  pub fn len(
    &self,
    index: usize,
  ) -> usize {
    self.iter(index).count()
  }
}

pub struct Iter<'list> {
  current: *mut Block,
  _lifetime: PhantomData<&'list FreeLists>,
}

impl Iterator for Iter<'_> {
  type Item = *mut Block;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let item = self.current;
    // SAFETY: linked blocks stay valid while the registry is borrowed.
    self.current = unsafe { (*item).next };
    Some(item)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[repr(C, align(64))]
  struct Slots([[u8; 64]; 4]);

  fn blocks(slots: &mut Slots) -> Vec<*mut Block> {
    slots
      .0
      .iter_mut()
      .map(|slot| unsafe { Block::init(slot.as_mut_ptr(), 64) })
      .collect()
  }

  fn collect(
    lists: &FreeLists,
    index: usize,
  ) -> Vec<*mut Block> {
    lists.iter(index).collect()
  }

  #[test]
  fn test_insert_appends_to_tail() {
    let mut slots = Slots([[0; 64]; 4]);
    let b = blocks(&mut slots);
    let mut lists = FreeLists::new();
    let index = index_of(64);

    unsafe {
      lists.insert(b[0]);
      lists.insert(b[1]);
      lists.insert(b[2]);
    }

    assert_eq!(collect(&lists, index), vec![b[0], b[1], b[2]]);
    assert_eq!(lists.len(index), 3);
    assert!(lists.is_empty(index + 1));

    unsafe {
      assert!((*b[0]).prev.is_null());
      assert_eq!((*b[1]).prev, b[0]);
      assert!((*b[2]).next.is_null());
    }
  }

  #[test]
  fn test_remove_any_position() {
    let mut slots = Slots([[0; 64]; 4]);
    let b = blocks(&mut slots);
    let mut lists = FreeLists::new();
    let index = index_of(64);

    unsafe {
      for &block in &b {
        lists.insert(block);
      }

      // interior
      lists.remove(b[1]);
      assert_eq!(collect(&lists, index), vec![b[0], b[2], b[3]]);
      assert!((*b[1]).prev.is_null() && (*b[1]).next.is_null());

      // tail
      lists.remove(b[3]);
      assert_eq!(collect(&lists, index), vec![b[0], b[2]]);

      // head
      lists.remove(b[0]);
      assert_eq!(collect(&lists, index), vec![b[2]]);

      // sole element
      lists.remove(b[2]);
      assert!(lists.is_empty(index));

      // tail tracking survives emptying the list
      lists.insert(b[3]);
      lists.insert(b[0]);
      assert_eq!(collect(&lists, index), vec![b[3], b[0]]);
    }
  }

  #[test]
  fn test_pop_front_is_fifo() {
    let mut slots = Slots([[0; 64]; 4]);
    let b = blocks(&mut slots);
    let mut lists = FreeLists::new();
    let index = index_of(64);

    unsafe {
      lists.insert(b[2]);
      lists.insert(b[0]);
    }

    assert_eq!(lists.first_non_empty(0), Some(index));
    assert_eq!(lists.first_non_empty(index + 1), None);
    assert_eq!(lists.pop_front(index), Some(b[2]));
    assert_eq!(lists.pop_front(index), Some(b[0]));
    assert_eq!(lists.pop_front(index), None);
  }
}
