//! `GlobalAlloc` over a lazily built arena.
//!
//! The arena is created by `init` on the first allocation, so a freestanding
//! program can name a `LazyArena` as its `#[global_allocator]` before any
//! memory has been requested from the host.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr;

use spin::Once;
use tinyrt_abi::MAX_ALIGN;
use tinyrt_lib::{klog_error, klog_warn};

use crate::arena::HeapArena;

pub struct LazyArena {
    arena: Once<Option<HeapArena>>,
    init: fn() -> Option<HeapArena>,
}

impl LazyArena {
    pub const fn new(init: fn() -> Option<HeapArena>) -> Self {
        Self {
            arena: Once::new(),
            init,
        }
    }

    /// The arena, building it on first use. `None` if `init` failed; the
    /// failure is sticky.
    pub fn arena(&self) -> Option<&HeapArena> {
        self.arena
            .call_once(|| {
                let arena = (self.init)();
                if arena.is_none() {
                    klog_error!("heap: lazy arena initialization failed");
                }
                arena
            })
            .as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.arena.is_completed()
    }
}

// SAFETY: every block handed out is exclusively owned until `dealloc`, is
// aligned to MAX_ALIGN and holds at least `layout.size()` bytes. Layouts
// needing more alignment are refused with null.
unsafe impl GlobalAlloc for LazyArena {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > MAX_ALIGN {
            klog_warn!("heap: alignment {} above {} refused", layout.align(), MAX_ALIGN);
            return ptr::null_mut();
        }
        match self.arena().and_then(|arena| arena.allocate(layout.size())) {
            Some(block) => block.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        if let Some(arena) = self.arena() {
            // SAFETY: `ptr` came from `alloc` on this arena.
            unsafe { arena.release(ptr) };
        }
    }
}
