use core::ptr::{self, NonNull};

use spin::Mutex;
use tinyrt_abi::MAX_ALIGN;
use tinyrt_lib::alignment::{align_down, align_up, is_aligned};
use tinyrt_lib::{klog_debug, klog_warn};

use crate::block::{
    BlockHeader, HEADER_SIZE, MAGIC_FREE, MAGIC_USED, MIN_BLOCK_SIZE, try_split_block,
};

/// Returned for zero-sized requests. Non-null and aligned, never dereferenced.
/// Releasing it is a no-op.
pub const ZERO_SIZE_SENTINEL: *mut u8 = ptr::without_provenance_mut(MAX_ALIGN);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub total_size: u64,
    pub allocated_size: u64,
    pub free_size: u64,
    pub allocated_blocks: u32,
    pub free_blocks: u32,
    pub largest_free_block: u64,
    pub allocation_count: u32,
    pub free_count: u32,
    pub failed_count: u32,
    pub invalid_release_count: u32,
}

enum Backing {
    Borrowed,
    #[cfg(feature = "alloc")]
    Owned {
        base: *mut u8,
        layout: core::alloc::Layout,
    },
}

struct ArenaInner {
    start: *mut u8,
    end: *mut u8,
    /// Address-ordered list of free blocks.
    free_head: *mut BlockHeader,
    stats: HeapStats,
}

// SAFETY: the raw pointers address memory owned exclusively by the arena and
// are only dereferenced under the arena lock.
unsafe impl Send for ArenaInner {}

impl ArenaInner {
    fn contains_payload(&self, data: *mut u8) -> bool {
        let addr = data as usize;
        addr >= self.start as usize + HEADER_SIZE
            && addr < self.end as usize
            && is_aligned(addr, MAX_ALIGN)
    }

    fn refresh_free_stats(&mut self) {
        let mut blocks = 0u32;
        let mut largest = 0u64;
        let mut cur = self.free_head;
        while !cur.is_null() {
            unsafe {
                blocks += 1;
                largest = largest.max((*cur).size as u64);
                cur = (*cur).next;
            }
        }
        self.stats.free_blocks = blocks;
        self.stats.largest_free_block = largest;
    }

    fn find_first_fit(&self, size: usize) -> (*mut BlockHeader, *mut BlockHeader) {
        let mut prev = ptr::null_mut();
        let mut cur = self.free_head;
        while !cur.is_null() {
            unsafe {
                if (*cur).size >= size {
                    return (prev, cur);
                }
                prev = cur;
                cur = (*cur).next;
            }
        }
        (ptr::null_mut(), ptr::null_mut())
    }

    unsafe fn unlink(&mut self, prev: *mut BlockHeader, block: *mut BlockHeader) {
        unsafe {
            if prev.is_null() {
                self.free_head = (*block).next;
            } else {
                (*prev).next = (*block).next;
            }
            (*block).next = ptr::null_mut();
        }
    }

    /// Insert in address order, merging with adjacent free neighbours.
    unsafe fn insert_and_coalesce(&mut self, block: *mut BlockHeader) {
        unsafe {
            (*block).mark_free();

            let mut prev: *mut BlockHeader = ptr::null_mut();
            let mut cur = self.free_head;
            while !cur.is_null() && (cur as usize) < (block as usize) {
                prev = cur;
                cur = (*cur).next;
            }

            (*block).next = cur;
            if prev.is_null() {
                self.free_head = block;
            } else {
                (*prev).next = block;
            }

            if !cur.is_null() && BlockHeader::block_end(block) == cur as *mut u8 {
                let merged = (*block).size + HEADER_SIZE + (*cur).size;
                (*block).next = (*cur).next;
                (*block).set_size(merged);
                // Free space grows by the header that disappeared.
                self.stats.free_size += HEADER_SIZE as u64;
            }

            if !prev.is_null() && BlockHeader::block_end(prev) == block as *mut u8 {
                let merged = (*prev).size + HEADER_SIZE + (*block).size;
                (*prev).next = (*block).next;
                (*prev).set_size(merged);
                self.stats.free_size += HEADER_SIZE as u64;
            }
        }
    }
}

/// A free-list allocator over one contiguous region.
///
/// First fit over an address-ordered free list, splitting on allocation and
/// coalescing both neighbours on release. Every payload is aligned to
/// `MAX_ALIGN`. All state sits behind a `spin::Mutex`, so a shared arena can
/// be used from any context; allocation and release never suspend.
pub struct HeapArena {
    inner: Mutex<ArenaInner>,
    backing: Backing,
}

impl HeapArena {
    /// Allocate a backing region of `capacity` bytes from the global
    /// allocator. Returns `None` if that allocation fails.
    #[cfg(feature = "alloc")]
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        let size = align_up(capacity.max(1), MAX_ALIGN)?;
        let layout = core::alloc::Layout::from_size_align(size, MAX_ALIGN).ok()?;
        // SAFETY: the layout has a non-zero size.
        let base = unsafe { alloc::alloc::alloc(layout) };
        if base.is_null() {
            klog_warn!("heap: backing allocation of {} bytes failed", size);
            return None;
        }
        // SAFETY: `base` is a fresh allocation of `size` bytes owned by the arena.
        let mut arena = unsafe { Self::from_raw_parts(base, size) };
        arena.backing = Backing::Owned { base, layout };
        Some(arena)
    }

    /// Build an arena over a static buffer.
    pub fn from_static(region: &'static mut [u8]) -> Self {
        let len = region.len();
        // SAFETY: the exclusive 'static borrow hands the region to the arena
        // for the rest of the program.
        unsafe { Self::from_raw_parts(region.as_mut_ptr(), len) }
    }

    /// Build an arena over `len` bytes at `base`.
    ///
    /// # Safety
    /// The region must be valid for reads and writes, must not be accessed
    /// by anything else while the arena lives, and must outlive the arena.
    pub unsafe fn from_raw_parts(base: *mut u8, len: usize) -> Self {
        let raw_start = base as usize;
        let start_addr = align_up(raw_start, MAX_ALIGN).unwrap_or(usize::MAX);
        let end_addr = align_down(raw_start.saturating_add(len), MAX_ALIGN);

        let mut inner = ArenaInner {
            start: base,
            end: base,
            free_head: ptr::null_mut(),
            stats: HeapStats::default(),
        };

        if end_addr > start_addr && end_addr - start_addr >= HEADER_SIZE + MIN_BLOCK_SIZE {
            let usable = end_addr - start_addr;
            unsafe {
                let start = base.add(start_addr - raw_start);
                let first = start as *mut BlockHeader;
                BlockHeader::init(first, usable - HEADER_SIZE, MAGIC_FREE);
                inner.start = start;
                inner.end = start.add(usable);
                inner.free_head = first;
            }
            inner.stats.total_size = usable as u64;
            inner.stats.free_size = (usable - HEADER_SIZE) as u64;
            inner.refresh_free_stats();
            klog_debug!("heap: arena of {} bytes at {:p}", usable, inner.start);
        } else {
            klog_warn!("heap: region of {} bytes too small for an arena", len);
        }

        Self {
            inner: Mutex::new(inner),
            backing: Backing::Borrowed,
        }
    }

    /// Allocate at least `size` bytes aligned to `MAX_ALIGN`.
    ///
    /// Size 0 yields `ZERO_SIZE_SENTINEL`. Exhaustion yields `None`.
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return NonNull::new(ZERO_SIZE_SENTINEL);
        }

        let mut heap = self.inner.lock();
        let Some(rounded) = align_up(size, MAX_ALIGN).map(|s| s.max(MIN_BLOCK_SIZE)) else {
            heap.stats.failed_count += 1;
            return None;
        };

        let (prev, block) = heap.find_first_fit(rounded);
        if block.is_null() {
            heap.stats.failed_count += 1;
            klog_debug!("heap: exhausted, request of {} bytes", size);
            return None;
        }

        unsafe {
            heap.unlink(prev, block);
            let rest = try_split_block(block, rounded);
            if !rest.is_null() {
                // Put the remainder where the block used to be.
                (*rest).next = if prev.is_null() {
                    heap.free_head
                } else {
                    (*prev).next
                };
                if prev.is_null() {
                    heap.free_head = rest;
                } else {
                    (*prev).next = rest;
                }
                heap.stats.free_size = heap.stats.free_size.saturating_sub(HEADER_SIZE as u64);
            }

            (*block).mark_allocated();
            let granted = (*block).size as u64;
            heap.stats.allocated_size += granted;
            heap.stats.free_size = heap.stats.free_size.saturating_sub(granted);
            heap.stats.allocated_blocks += 1;
            heap.stats.allocation_count += 1;
            heap.refresh_free_stats();

            NonNull::new(BlockHeader::data_ptr(block))
        }
    }

    /// Return a region obtained from `allocate`.
    ///
    /// Null and the zero-size sentinel are ignored. Pointers the arena does
    /// not recognise (foreign, corrupted, or already released) are logged and
    /// ignored; detection is best effort.
    ///
    /// # Safety
    /// `data` must be null, the sentinel, or a live allocation from this
    /// arena that is not used afterwards.
    pub unsafe fn release(&self, data: *mut u8) {
        if data.is_null() || data == ZERO_SIZE_SENTINEL {
            return;
        }

        let mut heap = self.inner.lock();
        if !heap.contains_payload(data) {
            heap.stats.invalid_release_count += 1;
            klog_warn!("heap: release of foreign pointer {:p}", data);
            return;
        }

        unsafe {
            let block = BlockHeader::from_data_ptr(data);
            if !(*block).is_valid() || (*block).magic != MAGIC_USED {
                heap.stats.invalid_release_count += 1;
                klog_warn!("heap: invalid block or double release at {:p}", data);
                return;
            }

            let size = (*block).size as u64;
            heap.stats.allocated_size = heap.stats.allocated_size.saturating_sub(size);
            heap.stats.allocated_blocks = heap.stats.allocated_blocks.saturating_sub(1);
            heap.stats.free_size += size;
            heap.stats.free_count += 1;
            heap.insert_and_coalesce(block);
            heap.refresh_free_stats();
        }
    }

    /// Payload size granted for a live allocation, `None` if `data` is not one.
    pub fn usable_size(&self, data: *const u8) -> Option<usize> {
        let heap = self.inner.lock();
        let data = data as *mut u8;
        if !heap.contains_payload(data) {
            return None;
        }
        unsafe {
            let block = BlockHeader::from_data_ptr(data);
            ((*block).is_valid() && (*block).is_allocated()).then(|| (*block).size)
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().stats.total_size as usize
    }

    pub fn stats(&self) -> HeapStats {
        self.inner.lock().stats
    }

    /// Log a usage summary at debug level.
    pub fn log_stats(&self) {
        let stats = self.stats();
        klog_debug!(
            "heap: {} of {} bytes in use ({} blocks), {} free in {} blocks, largest {}",
            stats.allocated_size,
            stats.total_size,
            stats.allocated_blocks,
            stats.free_size,
            stats.free_blocks,
            stats.largest_free_block
        );
        klog_debug!(
            "heap: {} allocations, {} frees, {} failed, {} invalid releases",
            stats.allocation_count,
            stats.free_count,
            stats.failed_count,
            stats.invalid_release_count
        );
    }
}

impl Drop for HeapArena {
    fn drop(&mut self) {
        match self.backing {
            Backing::Borrowed => {}
            #[cfg(feature = "alloc")]
            Backing::Owned { base, layout } => {
                // SAFETY: allocated in `with_capacity` with this layout.
                unsafe { alloc::alloc::dealloc(base, layout) };
            }
        }
    }
}

// SAFETY: the owned backing pointer is only freed on drop; all other access
// goes through the inner mutex.
unsafe impl Send for HeapArena {}
unsafe impl Sync for HeapArena {}
