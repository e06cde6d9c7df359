//! In-band block headers for the arena free list.
//!
//! Every block starts with a `BlockHeader`; the payload follows at
//! `HEADER_SIZE`. Free blocks are threaded through `next` in address order.

use core::mem::size_of;
use core::ptr;

use tinyrt_abi::MAX_ALIGN;

pub const MAGIC_FREE: u32 = 0xF4EE_B10C;
pub const MAGIC_USED: u32 = 0xA110_CA7E;
const CHECKSUM_SALT: u32 = 0x5EED_1234;

/// Smallest payload a split may leave behind.
pub const MIN_BLOCK_SIZE: usize = MAX_ALIGN;

#[repr(C, align(16))]
pub struct BlockHeader {
    pub magic: u32,
    pub checksum: u32,
    pub size: usize,
    pub next: *mut BlockHeader,
}

pub const HEADER_SIZE: usize = size_of::<BlockHeader>();

const _: () = assert!(HEADER_SIZE % MAX_ALIGN == 0);

#[inline]
const fn checksum_for(magic: u32, size: usize) -> u32 {
    let wide = size as u64;
    magic ^ (wide as u32) ^ ((wide >> 32) as u32) ^ CHECKSUM_SALT
}

impl BlockHeader {
    /// Write a fresh header at `block`.
    ///
    /// # Safety
    /// `block` must be aligned and point to at least `HEADER_SIZE + size`
    /// writable bytes owned by the arena.
    pub unsafe fn init(block: *mut BlockHeader, size: usize, magic: u32) {
        unsafe {
            block.write(BlockHeader {
                magic,
                checksum: checksum_for(magic, size),
                size,
                next: ptr::null_mut(),
            });
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        (self.magic == MAGIC_FREE || self.magic == MAGIC_USED)
            && self.checksum == checksum_for(self.magic, self.size)
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.magic == MAGIC_FREE
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.magic == MAGIC_USED
    }

    #[inline]
    pub fn mark_free(&mut self) {
        self.magic = MAGIC_FREE;
        self.update_checksum();
    }

    #[inline]
    pub fn mark_allocated(&mut self) {
        self.magic = MAGIC_USED;
        self.next = ptr::null_mut();
        self.update_checksum();
    }

    #[inline]
    pub fn set_size(&mut self, size: usize) {
        self.size = size;
        self.update_checksum();
    }

    #[inline]
    pub fn update_checksum(&mut self) {
        self.checksum = checksum_for(self.magic, self.size);
    }

    /// # Safety
    /// `block` must point to a live header.
    #[inline]
    pub unsafe fn data_ptr(block: *mut BlockHeader) -> *mut u8 {
        unsafe { (block as *mut u8).add(HEADER_SIZE) }
    }

    /// # Safety
    /// `data` must be at least `HEADER_SIZE` bytes past the start of the
    /// arena region.
    #[inline]
    pub unsafe fn from_data_ptr(data: *mut u8) -> *mut BlockHeader {
        unsafe { data.sub(HEADER_SIZE) as *mut BlockHeader }
    }

    /// One past the last payload byte.
    ///
    /// # Safety
    /// `block` must point to a live header.
    #[inline]
    pub unsafe fn block_end(block: *mut BlockHeader) -> *mut u8 {
        unsafe { Self::data_ptr(block).add((*block).size) }
    }
}

/// Split `block` so its payload is exactly `size`, returning the remainder
/// as a new free block, or null when the remainder would be too small.
///
/// # Safety
/// `block` must point to a valid header with `size <= (*block).size`.
pub unsafe fn try_split_block(block: *mut BlockHeader, size: usize) -> *mut BlockHeader {
    unsafe {
        let total = (*block).size;
        if total < size + HEADER_SIZE + MIN_BLOCK_SIZE {
            return ptr::null_mut();
        }
        let rest = BlockHeader::data_ptr(block).add(size) as *mut BlockHeader;
        BlockHeader::init(rest, total - size - HEADER_SIZE, MAGIC_FREE);
        (*block).set_size(size);
        rest
    }
}
