use alloc::string::String;

pub fn rightmost_unset_bit(n: u64) -> usize {
    return rightmost_set_bit(!n);
}

pub fn rightmost_set_bit(n: u64) -> usize {
    return n.trailing_zeros() as usize;
}

/// Copies `value` into a fixed-width field, truncating on a character boundary and padding
/// the remainder with null bytes.
pub fn write_fixed_str(dest: &mut [u8], value: &str) {
    let mut end = value.len().min(dest.len());

    while !value.is_char_boundary(end) {
        end -= 1;
    }

    dest[..end].copy_from_slice(&value.as_bytes()[..end]);

    for b in dest[end..].iter_mut() {
        *b = 0;
    }
}

/// Reads a null-padded fixed-width field up to the first null byte.
pub fn read_fixed_str(src: &[u8]) -> String {
    let end = src.iter().position(|b| *b == 0).unwrap_or(src.len());

    return String::from_utf8_lossy(&src[..end]).into_owned();
}

/// Whether `value` fits a fixed-width field of `width` bytes without truncation.
pub fn fits_field(value: &str, width: usize) -> bool {
    return !value.is_empty() && value.len() <= width && !value.contains('\0');
}
