use std::{io::Read, ptr};

use libc::sbrk;
use rbuddy::{BuddyAllocator, MAX_PAYLOAD, SegmentSource};

struct Logger;

impl log::Log for Logger {
  fn enabled(
    &self,
    _metadata: &log::Metadata<'_>,
  ) -> bool {
    true
  }

  fn log(
    &self,
    record: &log::Record<'_>,
  ) {
    if self.enabled(record.metadata()) {
      println!("[ {:>5} ] [{}] {}", record.level(), record.module_path().unwrap_or("<n/a>"), record.args());
    }
  }

  fn flush(&self) {}
}

static LOGGER: Logger = Logger;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`
/// or `gdb` between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn print_alloc<S: SegmentSource>(
  allocator: &BuddyAllocator<S>,
  size: usize,
  addr: *mut u8,
) {
  println!(
    "Requested {} bytes, address = {:?}, usable = {}, last error = {:?}",
    size,
    addr,
    if addr.is_null() { 0 } else { unsafe { allocator.usable_size(addr) } },
    allocator.last_error(),
  );
}

fn main() {
  if log::set_logger(&LOGGER).is_ok() {
    log::set_max_level(log::LevelFilter::Trace);
  }

  let mut allocator = BuddyAllocator::sbrk();

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // 1) The first request extends the arena by one segment and splits it.
    let first = allocator.allocate(4);
    println!("\n[1] Allocate 4 bytes");
    print_alloc(&allocator, 4, first);
    (first as *mut u32).write(0xDEADBEEF);
    print_program_break("after first alloc");

    block_until_enter_pressed();

    // 2) A mid-sized request is served from the halves left by step 1.
    let second = allocator.allocate(200);
    println!("\n[2] Allocate 200 bytes");
    print_alloc(&allocator, 200, second);
    ptr::write_bytes(second, 0xAB, 200);

    block_until_enter_pressed();

    // 3) A zeroed array; the whole granted block is cleared.
    let third = allocator.zero_allocate(16, 2);
    println!("\n[3] Zero-allocate [u16; 16]");
    print_alloc(&allocator, 32, third);

    block_until_enter_pressed();

    // 4) Move bytes inside the second block, overlapping ranges.
    allocator.move_bytes(second.add(8), second, 64);
    println!("\n[4] Moved 64 bytes forward by 8 inside second block");

    // 5) Free the first block, then ask again for the same size.
    allocator.release(first);
    let reused = allocator.allocate(4);
    println!("\n[5] Released first block and allocated 4 bytes again");
    println!("[5] reused == first? {}", reused == first);

    block_until_enter_pressed();

    // 6) A full segment does not fit in the leftovers, so the arena grows.
    let big = allocator.allocate(MAX_PAYLOAD);
    println!("\n[6] Allocate {} bytes", MAX_PAYLOAD);
    print_alloc(&allocator, MAX_PAYLOAD, big);
    print_program_break("after full segment");

    // 7) Too large for any segment.
    let too_large = allocator.allocate(MAX_PAYLOAD + 1);
    println!("\n[7] Allocate {} bytes", MAX_PAYLOAD + 1);
    print_alloc(&allocator, MAX_PAYLOAD + 1, too_large);

    for address in [reused, second, third, big] {
      allocator.release(address);
    }

    println!("\n[8] Released everything\n");
    print!("{}", allocator.stats());
  }
}
