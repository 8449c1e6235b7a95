//! BER encoding.
//!
//! Uses a reverse buffer approach: writes from end backwards to avoid
//! needing to pre-calculate lengths. Encoding exists for building trap
//! messages in tests and tooling; the receive path is decode-only.

use super::length::encode_length;
use super::tag;
use bytes::Bytes;

/// Buffer for BER encoding that writes backwards.
///
/// This approach avoids needing to pre-calculate content lengths:
/// we write the content first, then prepend the length and tag.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Push multiple bytes (prepends to front, reversed).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, count) = encode_length(len);
        // encode_length returns bytes in reverse order for prepending
        for byte in bytes.iter().take(count) {
            self.buf.push(*byte);
        }
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Get the current length of encoded data.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start_len = self.len();
        f(self);
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i32) {
        let (arr, len) = encode_integer_stack(value);
        // Valid bytes are at the end of the array
        self.push_bytes(&arr[4 - len..]);
        self.push_length(len);
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode a BOOLEAN.
    pub fn push_boolean(&mut self, value: bool) {
        self.push_bytes(&[if value { 0xFF } else { 0x00 }]);
        self.push_length(1);
        self.push_tag(tag::universal::BOOLEAN);
    }

    /// Encode a 64-bit integer (for Counter64).
    pub fn push_integer64(&mut self, value: u64) {
        let (arr, len) = encode_integer64_stack(value);
        self.push_bytes(&arr[9 - len..]);
        self.push_length(len);
        self.push_tag(tag::application::COUNTER64);
    }

    /// Encode an unsigned 32-bit integer with a specific tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let (arr, len) = encode_unsigned32_stack(value);
        self.push_bytes(&arr[5 - len..]);
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &crate::oid::Oid) {
        let ber = oid.to_ber_smallvec();
        self.push_bytes(&ber);
        self.push_length(ber.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Encode an IP address.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Finalize and return the encoded bytes.
    ///
    /// The buffer is reversed to produce the correct order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Finalize and return as `Vec<u8>`.
    pub fn finish_vec(mut self) -> Vec<u8> {
        self.buf.reverse();
        self.buf
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a signed 32-bit integer in minimal BER form.
///
/// Returns a stack-allocated array and the number of valid bytes.
/// The valid bytes are at the END of the array (for reverse-buffer compatibility).
#[inline]
fn encode_integer_stack(value: i32) -> ([u8; 4], usize) {
    let bytes = value.to_be_bytes();

    // Find first significant byte
    let mut start = 0;
    if value >= 0 {
        // For positive/zero, skip leading 0x00 bytes (but keep one if needed for sign)
        while start < 3 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        // For negative, skip leading 0xFF bytes (but keep one if needed for sign)
        while start < 3 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }

    (bytes, 4 - start)
}

/// Encode an unsigned 32-bit integer.
///
/// Unsigned SNMP types need a leading zero byte when the high bit is set,
/// since BER integers are signed.
#[inline]
fn encode_unsigned32_stack(value: u32) -> ([u8; 5], usize) {
    if value == 0 {
        return ([0, 0, 0, 0, 0], 1);
    }

    let mut arr = [0u8; 5];
    arr[1..].copy_from_slice(&value.to_be_bytes());

    // Skip leading zeros, keeping one if the next byte has the high bit set
    let mut start = 1;
    while start < 4 && arr[start] == 0 && arr[start + 1] & 0x80 == 0 {
        start += 1;
    }
    if arr[start] & 0x80 != 0 {
        start -= 1; // Keep a zero byte for the sign
    }

    (arr, 5 - start)
}

/// Encode an unsigned 64-bit integer (Counter64).
#[inline]
fn encode_integer64_stack(value: u64) -> ([u8; 9], usize) {
    if value == 0 {
        return ([0; 9], 1);
    }

    let mut arr = [0u8; 9];
    arr[1..].copy_from_slice(&value.to_be_bytes());

    let mut start = 1;
    while start < 8 && arr[start] == 0 && arr[start + 1] & 0x80 == 0 {
        start += 1;
    }
    if arr[start] & 0x80 != 0 {
        start -= 1;
    }

    (arr, 9 - start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::Decoder;
    use crate::oid;

    #[test]
    fn test_encode_integer_minimal() {
        for (value, expected) in [
            (0i32, vec![0x02, 0x01, 0x00]),
            (127, vec![0x02, 0x01, 0x7F]),
            (128, vec![0x02, 0x02, 0x00, 0x80]),
            (-1, vec![0x02, 0x01, 0xFF]),
            (-128, vec![0x02, 0x01, 0x80]),
        ] {
            let mut buf = EncodeBuf::new();
            buf.push_integer(value);
            assert_eq!(buf.finish_vec(), expected, "value {}", value);
        }
    }

    #[test]
    fn test_encode_unsigned32_high_bit() {
        // Values with the high bit set need a leading zero byte
        let mut buf = EncodeBuf::new();
        buf.push_unsigned32(tag::application::COUNTER32, 0x8000_0000);
        let wire = buf.finish_vec();
        assert_eq!(wire, vec![0x41, 0x05, 0x00, 0x80, 0x00, 0x00, 0x00]);

        let mut dec = Decoder::from_slice(&wire);
        let len = dec.expect_tag(tag::application::COUNTER32).unwrap();
        assert_eq!(dec.read_unsigned32_value(len).unwrap(), 0x8000_0000);
    }

    #[test]
    fn test_encode_counter64_roundtrip() {
        for value in [0u64, 1, 255, 256, u32::MAX as u64, u64::MAX] {
            let mut buf = EncodeBuf::new();
            buf.push_integer64(value);
            let wire = buf.finish_vec();

            let mut dec = Decoder::from_slice(&wire);
            let len = dec.expect_tag(tag::application::COUNTER64).unwrap();
            assert_eq!(dec.read_integer64_value(len).unwrap(), value, "{}", value);
        }
    }

    #[test]
    fn test_encode_sequence_nesting() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_octet_string(b"public");
            buf.push_integer(1);
        });
        let wire = buf.finish_vec();

        let mut dec = Decoder::from_slice(&wire);
        let mut seq = dec.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), 1);
        assert_eq!(&seq.read_octet_string().unwrap()[..], b"public");
        assert!(seq.is_empty());
    }

    #[test]
    fn test_encode_oid() {
        let mut buf = EncodeBuf::new();
        buf.push_oid(&oid!(1, 3, 6, 1));
        assert_eq!(buf.finish_vec(), vec![0x06, 0x03, 0x2B, 0x06, 0x01]);
    }

    #[test]
    fn test_encode_boolean() {
        let mut buf = EncodeBuf::new();
        buf.push_boolean(true);
        assert_eq!(buf.finish_vec(), vec![0x01, 0x01, 0xFF]);
    }
}
