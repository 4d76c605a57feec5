//! Test payloads

/// A JPEG-looking payload of `len` bytes (SOI marker, filler, EOI marker)
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0xAB; len.max(4)];
    data[0] = 0xFF;
    data[1] = 0xD8;
    let end = data.len();
    data[end - 2] = 0xFF;
    data[end - 1] = 0xD9;
    data
}

/// A deterministic, non-repeating-per-chunk payload of `len` bytes
pub fn video_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
