//! SNMP value types.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;
use std::fmt;

/// An SNMP value as carried in a varbind.
///
/// Covers the universal and application types SNMP uses plus the
/// v2c/v3 exception markers. Tags the decoder does not recognize are
/// preserved as [`Value::Unknown`] with their raw content so callers
/// can decide how to treat them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// BOOLEAN (0x01). Not part of SMIv2 but accepted on ingest.
    Boolean(bool),
    /// INTEGER (0x02)
    Integer(i32),
    /// OCTET STRING (0x04)
    OctetString(Bytes),
    /// NULL (0x05)
    Null,
    /// OBJECT IDENTIFIER (0x06)
    ObjectIdentifier(Oid),
    /// IpAddress (0x40) - 4 bytes
    IpAddress([u8; 4]),
    /// Counter32 (0x41)
    Counter32(u32),
    /// Gauge32 / Unsigned32 (0x42)
    Gauge32(u32),
    /// TimeTicks (0x43) - hundredths of seconds
    TimeTicks(u32),
    /// Opaque (0x44) - raw bytes, possibly wrapping a legacy float encoding
    Opaque(Bytes),
    /// Counter64 (0x46)
    Counter64(u64),
    /// noSuchObject exception (0x80)
    NoSuchObject,
    /// noSuchInstance exception (0x81)
    NoSuchInstance,
    /// endOfMibView exception (0x82)
    EndOfMibView,
    /// Unrecognized tag, content preserved as-is.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// Decode a value from the decoder.
    ///
    /// Reads the tag, length, and content. Integer truncation and
    /// non-minimal lengths are tolerated the way net-snmp tolerates
    /// them; indefinite lengths and constructed OCTET STRINGs are not.
    pub fn decode(decoder: &mut Decoder) -> Result<Value> {
        let offset = decoder.offset();
        let tag_byte = decoder.read_tag()?;
        let len = decoder.read_length()?;

        match tag_byte {
            tag::universal::BOOLEAN => {
                if len != 1 {
                    return Err(Error::decode(
                        offset,
                        DecodeErrorKind::InvalidBooleanLength { length: len },
                    ));
                }
                let byte = decoder.read_byte()?;
                Ok(Value::Boolean(byte != 0))
            }
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            tag::universal::OCTET_STRING_CONSTRUCTED => Err(Error::decode(
                offset,
                DecodeErrorKind::ConstructedOctetString,
            )),
            tag::universal::NULL => {
                if len != 0 {
                    return Err(Error::decode(offset, DecodeErrorKind::InvalidNull));
                }
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(Error::decode(
                        offset,
                        DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let bytes = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            tag::application::COUNTER32 => Ok(Value::Counter32(decoder.read_unsigned32_value(len)?)),
            tag::application::GAUGE32 | tag::application::UINTEGER32 => {
                Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::TIMETICKS => Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?)),
            tag::application::OPAQUE => Ok(Value::Opaque(decoder.read_bytes(len)?)),
            tag::application::COUNTER64 => Ok(Value::Counter64(decoder.read_integer64_value(len)?)),
            tag::context::NO_SUCH_OBJECT => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchObject)
            }
            tag::context::NO_SUCH_INSTANCE => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchInstance)
            }
            tag::context::END_OF_MIB_VIEW => {
                decoder.read_bytes(len)?;
                Ok(Value::EndOfMibView)
            }
            other => {
                let data = decoder.read_bytes(len)?;
                tracing::debug!(
                    target: "trapsink::ber",
                    tag = format_args!("{:#04x}", other),
                    len,
                    "unrecognized value tag"
                );
                Ok(Value::Unknown { tag: other, data })
            }
        }
    }

    /// Encode this value into the buffer.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Boolean(b) => buf.push_boolean(*b),
            Value::Integer(i) => buf.push_integer(*i),
            Value::OctetString(s) => buf.push_octet_string(s),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Opaque(data) => {
                buf.push_bytes(data);
                buf.push_length(data.len());
                buf.push_tag(tag::application::OPAQUE);
            }
            Value::Counter64(v) => buf.push_integer64(*v),
            Value::NoSuchObject => {
                buf.push_length(0);
                buf.push_tag(tag::context::NO_SUCH_OBJECT);
            }
            Value::NoSuchInstance => {
                buf.push_length(0);
                buf.push_tag(tag::context::NO_SUCH_INSTANCE);
            }
            Value::EndOfMibView => {
                buf.push_length(0);
                buf.push_tag(tag::context::END_OF_MIB_VIEW);
            }
            Value::Unknown { tag, data } => {
                buf.push_bytes(data);
                buf.push_length(data.len());
                buf.push_tag(*tag);
            }
        }
    }

    /// The BER tag this value carries on the wire.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Boolean(_) => tag::universal::BOOLEAN,
            Value::Integer(_) => tag::universal::INTEGER,
            Value::OctetString(_) => tag::universal::OCTET_STRING,
            Value::Null => tag::universal::NULL,
            Value::ObjectIdentifier(_) => tag::universal::OBJECT_IDENTIFIER,
            Value::IpAddress(_) => tag::application::IP_ADDRESS,
            Value::Counter32(_) => tag::application::COUNTER32,
            Value::Gauge32(_) => tag::application::GAUGE32,
            Value::TimeTicks(_) => tag::application::TIMETICKS,
            Value::Opaque(_) => tag::application::OPAQUE,
            Value::Counter64(_) => tag::application::COUNTER64,
            Value::NoSuchObject => tag::context::NO_SUCH_OBJECT,
            Value::NoSuchInstance => tag::context::NO_SUCH_INSTANCE,
            Value::EndOfMibView => tag::context::END_OF_MIB_VIEW,
            Value::Unknown { tag, .. } => *tag,
        }
    }

    /// Returns true for the v2c exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Get as i64 if this is any integer-like type.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i as i64),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v as i64),
            Value::Counter64(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as bytes if this is an OCTET STRING or Opaque.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::OctetString(b) | Value::Opaque(b) => Some(b),
            _ => None,
        }
    }

    /// Get as OID if this is an OBJECT IDENTIFIER.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::OctetString(s) => match std::str::from_utf8(s) {
                Ok(text) => write!(f, "{:?}", text),
                Err(_) => {
                    write!(f, "hex:")?;
                    for byte in s.iter() {
                        write!(f, "{:02x}", byte)?;
                    }
                    Ok(())
                }
            },
            Value::Null => write!(f, "null"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            Value::Counter32(v) => write!(f, "{}", v),
            Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Opaque(data) => {
                write!(f, "opaque:")?;
                for byte in data.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
            Value::Unknown { tag, data } => {
                write!(f, "unknown(tag={:#04x}, {} bytes)", tag, data.len())
            }
        }
    }
}
