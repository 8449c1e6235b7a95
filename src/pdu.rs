//! SNMP PDU structures.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};
use std::fmt;

/// SNMP PDU types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    Response,
    SetRequest,
    TrapV1,
    GetBulkRequest,
    InformRequest,
    TrapV2,
    Report,
}

impl PduType {
    /// Parse from a BER tag byte.
    pub fn from_tag(tag_byte: u8) -> Option<PduType> {
        match tag_byte {
            tag::pdu::GET_REQUEST => Some(PduType::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(PduType::GetNextRequest),
            tag::pdu::RESPONSE => Some(PduType::Response),
            tag::pdu::SET_REQUEST => Some(PduType::SetRequest),
            tag::pdu::TRAP_V1 => Some(PduType::TrapV1),
            tag::pdu::GET_BULK_REQUEST => Some(PduType::GetBulkRequest),
            tag::pdu::INFORM_REQUEST => Some(PduType::InformRequest),
            tag::pdu::TRAP_V2 => Some(PduType::TrapV2),
            tag::pdu::REPORT => Some(PduType::Report),
            _ => None,
        }
    }

    /// The BER tag for this PDU type.
    pub fn tag(&self) -> u8 {
        match self {
            PduType::GetRequest => tag::pdu::GET_REQUEST,
            PduType::GetNextRequest => tag::pdu::GET_NEXT_REQUEST,
            PduType::Response => tag::pdu::RESPONSE,
            PduType::SetRequest => tag::pdu::SET_REQUEST,
            PduType::TrapV1 => tag::pdu::TRAP_V1,
            PduType::GetBulkRequest => tag::pdu::GET_BULK_REQUEST,
            PduType::InformRequest => tag::pdu::INFORM_REQUEST,
            PduType::TrapV2 => tag::pdu::TRAP_V2,
            PduType::Report => tag::pdu::REPORT,
        }
    }

    /// True for the unsolicited notification types a receiver accepts.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            PduType::TrapV1 | PduType::TrapV2 | PduType::InformRequest
        )
    }
}

impl fmt::Display for PduType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PduType::GetRequest => "GetRequest",
            PduType::GetNextRequest => "GetNextRequest",
            PduType::Response => "Response",
            PduType::SetRequest => "SetRequest",
            PduType::TrapV1 => "Trap-v1",
            PduType::GetBulkRequest => "GetBulkRequest",
            PduType::InformRequest => "InformRequest",
            PduType::TrapV2 => "Trap-v2",
            PduType::Report => "Report",
        };
        f.write_str(name)
    }
}

/// A standard v2-format PDU: request-id, error-status, error-index,
/// varbind list. Used by TrapV2 and InformRequest (and everything else
/// except the v1 trap format).
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Decode a PDU. The PDU tag must already be known to be a
    /// v2-format type.
    pub fn decode(decoder: &mut Decoder) -> Result<Pdu> {
        let offset = decoder.offset();
        let tag_byte = decoder.read_tag()?;
        let pdu_type = PduType::from_tag(tag_byte)
            .ok_or_else(|| Error::decode(offset, DecodeErrorKind::UnknownPduType(tag_byte)))?;
        let len = decoder.read_length()?;
        let mut body = decoder.sub_decoder(len)?;

        let request_id = body.read_integer()?;
        let error_status = body.read_integer()?;
        let error_index = body.read_integer()?;
        let varbinds = decode_varbind_list(&mut body)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }

    /// Encode this PDU into the buffer.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }
}

/// Generic trap categories for SNMPv1 traps (RFC 1157).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericTrap {
    ColdStart,
    WarmStart,
    LinkDown,
    LinkUp,
    AuthenticationFailure,
    EgpNeighborLoss,
    EnterpriseSpecific,
}

impl GenericTrap {
    pub fn from_i32(value: i32) -> Option<GenericTrap> {
        match value {
            0 => Some(GenericTrap::ColdStart),
            1 => Some(GenericTrap::WarmStart),
            2 => Some(GenericTrap::LinkDown),
            3 => Some(GenericTrap::LinkUp),
            4 => Some(GenericTrap::AuthenticationFailure),
            5 => Some(GenericTrap::EgpNeighborLoss),
            6 => Some(GenericTrap::EnterpriseSpecific),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            GenericTrap::ColdStart => 0,
            GenericTrap::WarmStart => 1,
            GenericTrap::LinkDown => 2,
            GenericTrap::LinkUp => 3,
            GenericTrap::AuthenticationFailure => 4,
            GenericTrap::EgpNeighborLoss => 5,
            GenericTrap::EnterpriseSpecific => 6,
        }
    }
}

/// The SNMPv1 trap PDU format (RFC 1157 Section 4.1.6).
///
/// Structurally different from every other PDU: carries enterprise,
/// agent address, generic/specific trap numbers, and a timestamp
/// instead of request-id and error fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapV1Pdu {
    pub enterprise: Oid,
    pub agent_addr: [u8; 4],
    pub generic_trap: i32,
    pub specific_trap: i32,
    pub timestamp: u32,
    pub varbinds: Vec<VarBind>,
}

impl TrapV1Pdu {
    /// Decode a v1 trap PDU. The caller has already seen the 0xA4 tag.
    pub fn decode(decoder: &mut Decoder) -> Result<TrapV1Pdu> {
        let len = decoder.expect_tag(tag::pdu::TRAP_V1)?;
        let mut body = decoder.sub_decoder(len)?;

        let enterprise = body.read_oid()?;

        let addr_offset = body.offset();
        let addr_len = body.expect_tag(tag::application::IP_ADDRESS)?;
        if addr_len != 4 {
            return Err(Error::decode(
                addr_offset,
                DecodeErrorKind::InvalidIpAddressLength { length: addr_len },
            ));
        }
        let addr_bytes = body.read_bytes(4)?;
        let agent_addr = [addr_bytes[0], addr_bytes[1], addr_bytes[2], addr_bytes[3]];

        let generic_trap = body.read_integer()?;
        let specific_trap = body.read_integer()?;

        let ts_len = body.expect_tag(tag::application::TIMETICKS)?;
        let timestamp = body.read_unsigned32_value(ts_len)?;

        let varbinds = decode_varbind_list(&mut body)?;

        Ok(TrapV1Pdu {
            enterprise,
            agent_addr,
            generic_trap,
            specific_trap,
            timestamp,
            varbinds,
        })
    }

    /// Encode this trap PDU into the buffer.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(tag::pdu::TRAP_V1, |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_unsigned32(tag::application::TIMETICKS, self.timestamp);
            buf.push_integer(self.specific_trap);
            buf.push_integer(self.generic_trap);
            buf.push_ip_address(self.agent_addr);
            buf.push_oid(&self.enterprise);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;
    use bytes::Bytes;

    #[test]
    fn test_pdu_type_tag_roundtrip() {
        for pdu_type in [
            PduType::GetRequest,
            PduType::GetNextRequest,
            PduType::Response,
            PduType::SetRequest,
            PduType::TrapV1,
            PduType::GetBulkRequest,
            PduType::InformRequest,
            PduType::TrapV2,
            PduType::Report,
        ] {
            assert_eq!(PduType::from_tag(pdu_type.tag()), Some(pdu_type));
        }
        assert_eq!(PduType::from_tag(0xA9), None);
    }

    #[test]
    fn test_v2_trap_pdu_roundtrip() {
        let pdu = Pdu {
            pdu_type: PduType::TrapV2,
            request_id: 0x1234_5678,
            error_status: 0,
            error_index: 0,
            varbinds: vec![
                VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(42)),
                VarBind::new(
                    oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0),
                    Value::ObjectIdentifier(oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1)),
                ),
            ],
        };
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        let mut dec = Decoder::new(buf.finish());
        assert_eq!(Pdu::decode(&mut dec).unwrap(), pdu);
    }

    #[test]
    fn test_v1_trap_pdu_roundtrip() {
        let pdu = TrapV1Pdu {
            enterprise: oid!(1, 3, 6, 1, 4, 1, 8072),
            agent_addr: [192, 0, 2, 10],
            generic_trap: GenericTrap::LinkDown.as_i32(),
            specific_trap: 0,
            timestamp: 98765,
            varbinds: vec![VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 3),
                Value::Integer(3),
            )],
        };
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        let mut dec = Decoder::new(buf.finish());
        assert_eq!(TrapV1Pdu::decode(&mut dec).unwrap(), pdu);
    }

    #[test]
    fn test_v1_trap_rejects_bad_agent_addr() {
        // Build a v1 trap, then corrupt the IpAddress length
        let pdu = TrapV1Pdu {
            enterprise: oid!(1, 3, 6, 1, 4, 1, 8072),
            agent_addr: [10, 0, 0, 1],
            generic_trap: 6,
            specific_trap: 17,
            timestamp: 0,
            varbinds: vec![],
        };
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        let mut wire = buf.finish_vec();
        // IpAddress TLV follows the enterprise OID; its tag is 0x40
        let pos = wire.iter().position(|&b| b == 0x40).unwrap();
        wire[pos + 1] = 3; // claim 3 content bytes
        wire.remove(pos + 2);
        let mut dec = Decoder::new(Bytes::from(wire));
        assert!(TrapV1Pdu::decode(&mut dec).is_err());
    }

    #[test]
    fn test_pdu_decode_unknown_tag() {
        let mut dec = Decoder::from_slice(&[0xA9, 0x00]);
        assert!(Pdu::decode(&mut dec).is_err());
    }
}
