/// Align `value` down to the nearest multiple of `alignment`.
/// If `alignment` is zero, the input is returned unchanged.
#[inline(always)]
pub const fn align_down(value: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return value;
    }
    value & !(alignment - 1)
}

/// Align `value` up to the nearest multiple of `alignment`.
/// If `alignment` is zero, the input is returned unchanged.
///
/// Returns `None` when rounding up would overflow.
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> Option<usize> {
    if alignment == 0 {
        return Some(value);
    }
    match value.checked_add(alignment - 1) {
        Some(adjusted) => Some(adjusted & !(alignment - 1)),
        None => None,
    }
}

#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    alignment == 0 || value & (alignment - 1) == 0
}
