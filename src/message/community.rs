//! Community-based message envelope (SNMPv1 and v2c).

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::version::Version;
use bytes::Bytes;

/// An SNMPv1/v2c message: `SEQUENCE { version, community, PDU }`.
///
/// The PDU is kept as raw bytes here; the caller picks the decode path
/// from the PDU tag (the v1 trap format differs structurally from
/// every other PDU).
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    pub version: Version,
    pub community: Bytes,
    pub pdu_bytes: Bytes,
}

impl CommunityMessage {
    /// Decode a community message from a datagram.
    pub fn decode(data: Bytes) -> Result<CommunityMessage> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let version_offset = seq.offset();
        let raw_version = seq.read_integer()?;
        let version = Version::from_i32(raw_version).ok_or_else(|| {
            Error::decode(version_offset, DecodeErrorKind::UnknownVersion(raw_version))
        })?;

        let community = seq.read_octet_string()?;
        let pdu_bytes = seq.read_bytes(seq.remaining())?;

        Ok(CommunityMessage {
            version,
            community,
            pdu_bytes,
        })
    }

    /// Encode a community message wrapping an already-encoded PDU.
    pub fn encode(version: Version, community: &[u8], pdu: &EncodedPdu) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_bytes(&pdu.0);
            buf.push_octet_string(community);
            buf.push_integer(version.as_i32());
        });
        buf.finish()
    }
}

/// A fully-encoded PDU ready to be framed in a message.
pub struct EncodedPdu(pub Bytes);

impl EncodedPdu {
    /// Encode a v2-format PDU.
    pub fn from_pdu(pdu: &crate::pdu::Pdu) -> Self {
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        Self(buf.finish())
    }

    /// Encode a v1 trap PDU.
    pub fn from_trap_v1(pdu: &crate::pdu::TrapV1Pdu) -> Self {
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        Self(buf.finish())
    }
}
