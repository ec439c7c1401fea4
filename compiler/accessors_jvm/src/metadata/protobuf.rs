//! Write-only protobuf encoding.
//!
//! Covers the wire types the metadata messages use: varints (wire type 0)
//! and length-delimited payloads (wire type 2). Messages are built bottom-up
//! by encoding each nested message into its own writer first.

const WIRE_VARINT: u32 = 0;
const WIRE_LENGTH_DELIMITED: u32 = 2;

#[derive(Debug, Default)]
pub(crate) struct ProtoWriter {
    buffer: Vec<u8>,
}

impl ProtoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buffer.push((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    fn write_tag(&mut self, field: u32, wire_type: u32) {
        self.write_varint(u64::from((field << 3) | wire_type));
    }

    /// `int32` field. Negative values are sign-extended to ten bytes.
    #[allow(clippy::cast_sign_loss)]
    pub fn int32_field(&mut self, field: u32, value: i32) {
        self.write_tag(field, WIRE_VARINT);
        self.write_varint(i64::from(value) as u64);
    }

    pub fn bytes_field(&mut self, field: u32, bytes: &[u8]) {
        self.write_tag(field, WIRE_LENGTH_DELIMITED);
        self.write_varint(bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
    }

    pub fn string_field(&mut self, field: u32, value: &str) {
        self.bytes_field(field, value.as_bytes());
    }

    pub fn message_field(&mut self, field: u32, message: ProtoWriter) {
        self.bytes_field(field, &message.buffer);
    }

    /// Varint length prefix followed by the message (delimited framing).
    pub fn write_delimited(&mut self, message: ProtoWriter) {
        self.write_varint(message.buffer.len() as u64);
        self.buffer.extend_from_slice(&message.buffer);
    }

    pub fn append(&mut self, message: ProtoWriter) {
        self.buffer.extend_from_slice(&message.buffer);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}
