//! SNMP message framing.
//!
//! Two wire formats exist: the community-based v1/v2c envelope and the
//! v3 envelope with its header, security parameters, and scoped PDU.
//! Both start with `SEQUENCE { version INTEGER, ... }`, so the version
//! can be peeked before committing to a format.

mod community;
mod v3;

pub use community::{CommunityMessage, EncodedPdu};
pub use v3::{
    MsgFlags, MsgGlobalData, ScopedPdu, ScopedPduData, SecurityLevel, UsmSecurityParams, V3Message,
};

use crate::ber::Decoder;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::version::Version;

/// Read the version field out of a message without consuming the
/// decoder. Both envelope formats place it first inside the outer
/// SEQUENCE.
pub fn peek_version(data: &bytes::Bytes) -> Result<Version> {
    let mut decoder = Decoder::new(data.clone());
    let mut seq = decoder.read_sequence()?;
    let offset = seq.offset();
    let raw = seq.read_integer()?;
    Version::from_i32(raw)
        .ok_or_else(|| Error::decode(offset, DecodeErrorKind::UnknownVersion(raw)))
}
