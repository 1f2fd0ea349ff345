/// Linear interpolation between two f32 values
pub fn lerp(start: f32, end: f32, alpha: f32) -> f32 {
    start + (end - start) * alpha
}

/// Constrain a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Maps a destination pixel index to its nearest source index when scaling
/// `src_len` pixels onto `dst_len` pixels. `dst_len` must be non-zero.
pub fn nearest_source_index(dst_index: u32, src_len: u32, dst_len: u32) -> u32 {
    let idx = (dst_index as u64 * src_len as u64) / dst_len as u64;
    (idx as u32).min(src_len.saturating_sub(1))
}

/// Multiplies an 8-bit channel by an 8-bit factor (255 = identity)
pub fn multiply_channel(channel: u8, factor: u8) -> u8 {
    ((channel as u16 * factor as u16 + 127) / 255) as u8
}

/// Saturating additive blend of `src` onto `dst` weighted by `alpha` (0-255)
pub fn add_channel(dst: u8, src: u8, alpha: u8) -> u8 {
    dst.saturating_add(multiply_channel(src, alpha))
}
