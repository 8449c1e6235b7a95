//! BER (Basic Encoding Rules) primitives for SNMP.
//!
//! SNMP uses a restricted subset of BER per RFC 3417. The decoder is
//! deliberately permissive about non-minimal encodings, matching the
//! tolerance of widely deployed agents; the encoder always emits
//! minimal definite-length form.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::Decoder;
pub use encode::EncodeBuf;
pub use length::{MAX_LENGTH, decode_length, encode_length};
