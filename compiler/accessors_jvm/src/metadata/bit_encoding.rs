//! `d1` string encoding.
//!
//! Annotation values can only hold strings, so the serialized metadata is
//! smuggled through `String[]`. In UTF-8 mode every byte becomes the char
//! with the same value, and the first string starts with a `\u{0}` marker.
//! A constant pool string holds at most 65535 bytes of modified UTF-8, where
//! bytes 1..=127 take one byte and everything else (the marker included)
//! takes two, so the output is split before that limit is reached.

/// Marker char opening the first string in UTF-8 mode.
pub const UTF8_MODE_MARKER: char = '\u{0}';

const MAX_UTF8_INFO_LENGTH: usize = 65_535;

pub fn encode_bytes(data: &[u8]) -> Vec<String> {
    let mut result = Vec::with_capacity(1);
    let mut buffer = String::new();
    buffer.push(UTF8_MODE_MARKER);
    let mut bytes_in_buffer = 2;

    for &b in data {
        buffer.push(char::from(b));
        bytes_in_buffer += if (1..=127).contains(&b) { 1 } else { 2 };
        if bytes_in_buffer >= MAX_UTF8_INFO_LENGTH - 1 {
            result.push(std::mem::take(&mut buffer));
            bytes_in_buffer = 0;
        }
    }

    if !buffer.is_empty() {
        result.push(buffer);
    }
    result
}
