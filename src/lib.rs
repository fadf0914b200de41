//! # rbuddy - A Buddy-System Memory Allocator
//!
//! This crate provides a **buddy allocator** with eight fixed size classes
//! (16 to 2048 bytes), carved out of an arena that grows one 2048-byte
//! segment at a time. By default segments come from the `sbrk` system call.
//!
//! ## Overview
//!
//! Every block is a power of two in size. A larger free block is halved until
//! it matches a request, and the two halves are *buddies*: their offsets
//! within the segment differ in exactly one bit.
//!
//! ```text
//!   Splitting a segment for a 200 byte request:
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                          2048 (segment)                          │
//!   └──────────────────────────────────────────────────────────────────┘
//!   ┌────────────────────────────────┬─────────────────────────────────┐
//!   │              1024              │              1024               │
//!   └────────────────────────────────┴─────────────────────────────────┘
//!   ┌────────────────┬───────────────┬─────────────────────────────────┐
//!   │      512       │      512      │              1024               │
//!   └────────────────┴───────────────┴─────────────────────────────────┘
//!   ┌───────┬────────┬───────────────┬─────────────────────────────────┐
//!   │  256  │  256   │      512      │              1024               │
//!   └───────┴────────┴───────────────┴─────────────────────────────────┘
//!       ▲       ▲
//!       │       └── buddy, stays free
//!       └── handed to the caller
//! ```
//!
//! On release the process runs backwards: while a block's buddy is free and
//! the same size, both are merged into one block of twice the size.
//!
//! ## Crate Structure
//!
//! ```text
//!   rbuddy
//!   ├── arena      - SegmentSource, Sbrk, Pool and the segment registry
//!   ├── block      - Block header and all header/payload/buddy addressing
//!   ├── buddy      - BuddyAllocator: allocate, zero_allocate, release
//!   ├── class      - Size classes and constants
//!   ├── error      - AllocError and the last-error ErrorCode
//!   ├── free_list  - Intrusive doubly linked free lists (internal)
//!   ├── mem        - move_bytes
//!   └── stats      - AllocStats
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rbuddy::{BuddyAllocator, ErrorCode, Pool};
//!
//! let mut allocator = BuddyAllocator::new(Pool::new(4));
//!
//! let ptr = allocator.allocate(100) as *mut u64;
//! assert!(!ptr.is_null());
//! assert_eq!(allocator.last_error(), ErrorCode::NoError);
//!
//! unsafe {
//!     *ptr = 42;
//!     allocator.release(ptr as *mut u8);
//! }
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         Payload                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ prev, next      │  │  size - HEADER_SIZE bytes      │
//!   │  │ size: 16..2048  │  │                                │
//!   │  │ in_use          │  │                                │
//!   │  └─────────────────┘  │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Small requests only**: At most one segment minus the header
//! - **Never shrinks**: Segments are not given back to the environment
//!
//! ## Safety
//!
//! `release`, `move_bytes` and `usable_size` trust that their pointers came
//! from the same allocator; this is not checked.

pub mod arena;
mod block;
mod buddy;
pub mod class;
pub mod error;
mod free_list;
pub mod mem;
mod stats;

pub use arena::{Pool, Sbrk, SegmentSource};
pub use buddy::BuddyAllocator;
pub use class::{HEADER_SIZE, MAX_PAYLOAD, SEGMENT_SIZE};
pub use error::{AllocError, AllocResult, ErrorCode};
pub use stats::AllocStats;
