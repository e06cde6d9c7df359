pub const SUITE_ALLOCATOR: u32 = 1 << 0;
pub const SUITE_HANDLE_IO: u32 = 1 << 1;
pub const SUITE_LIFECYCLE: u32 = 1 << 2;
pub const SUITE_DIAGNOSTICS: u32 = 1 << 3;
pub const SUITE_ALL: u32 = SUITE_ALLOCATOR | SUITE_HANDLE_IO | SUITE_LIFECYCLE | SUITE_DIAGNOSTICS;

/// Map a suite name to its mask bit.
pub fn suite_mask_for(name: &str) -> Option<u32> {
    match name {
        "allocator" => Some(SUITE_ALLOCATOR),
        "handle_io" => Some(SUITE_HANDLE_IO),
        "lifecycle" => Some(SUITE_LIFECYCLE),
        "diagnostics" => Some(SUITE_DIAGNOSTICS),
        "all" => Some(SUITE_ALL),
        _ => None,
    }
}

/// Parse a comma-separated suite list such as `allocator,handle_io`.
/// Unknown names are ignored; an empty list selects nothing.
pub fn suite_mask_from_list(list: &str) -> u32 {
    list.split(',')
        .map(str::trim)
        .filter_map(suite_mask_for)
        .fold(0, |mask, bit| mask | bit)
}
