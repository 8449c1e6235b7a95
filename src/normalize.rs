//! Varbind normalization.
//!
//! Collapses the full ASN.1 value zoo into a small set of host-side
//! shapes so downstream consumers never handle wire types directly.
//! Each varbind becomes a [`MultiResult`]: the OID plus exactly one
//! live payload (or one exception sentinel).

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::Value;
use std::fmt;

/// A normalized payload. Exactly one variant is ever live per result,
/// which is what lets callers dispatch on [`MultiResult::type_tag`]
/// without cross-checking fields.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    /// The varbind carried no usable value (NULL, noSuchInstance, or
    /// a tag-zero placeholder).
    NoSuchInstance,
    /// noSuchObject exception.
    NoSuchObject,
    /// endOfMibView exception.
    EndOfMibView,
    /// BOOLEAN.
    Bool(bool),
    /// All integral types, widened to i64. Counter64 wraps through the
    /// sign bit rather than saturating, so the full 64-bit pattern is
    /// preserved.
    Int(i64),
    /// Opaque-wrapped float (net-snmp legacy encoding).
    Float(f64),
    /// OCTET STRING, or an Opaque payload with no recognized wrapper.
    ByteArray(Vec<u8>),
    /// OBJECT IDENTIFIER or IpAddress, rendered as text.
    String(String),
}

/// One normalized varbind.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiResult {
    pub oid: Oid,
    pub value: NormalizedValue,
}

impl MultiResult {
    /// Normalize a decoded value.
    ///
    /// Every recognized wire type maps to exactly one variant; a tag
    /// the decoder could not classify (other than the tag-zero
    /// placeholder some agents emit) is an error, and the caller
    /// decides how fatal that is.
    pub fn build(oid: Oid, value: &Value) -> Result<MultiResult> {
        let normalized = match value {
            Value::Null => NormalizedValue::NoSuchInstance,
            Value::NoSuchInstance => NormalizedValue::NoSuchInstance,
            Value::NoSuchObject => NormalizedValue::NoSuchObject,
            Value::EndOfMibView => NormalizedValue::EndOfMibView,
            Value::Boolean(b) => NormalizedValue::Bool(*b),
            Value::Integer(i) => NormalizedValue::Int(*i as i64),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
                NormalizedValue::Int(*v as i64)
            }
            Value::Counter64(v) => NormalizedValue::Int(*v as i64),
            Value::Opaque(data) => match parse_opaque_float(data) {
                Some(f) => NormalizedValue::Float(f),
                None => NormalizedValue::ByteArray(data.to_vec()),
            },
            Value::OctetString(data) => NormalizedValue::ByteArray(data.to_vec()),
            Value::ObjectIdentifier(value_oid) => NormalizedValue::String(value_oid.to_string()),
            Value::IpAddress([a, b, c, d]) => {
                NormalizedValue::String(format!("{}.{}.{}.{}", a, b, c, d))
            }
            Value::Unknown { tag: 0, .. } => NormalizedValue::NoSuchInstance,
            Value::Unknown { tag, .. } => {
                return Err(Error::UnknownType { oid, tag: *tag });
            }
        };
        Ok(MultiResult {
            oid,
            value: normalized,
        })
    }

    /// The shape of the live payload, as a stable lowercase tag.
    pub fn type_tag(&self) -> &'static str {
        match &self.value {
            NormalizedValue::NoSuchInstance => "noSuchInstance",
            NormalizedValue::NoSuchObject => "noSuchObject",
            NormalizedValue::EndOfMibView => "endOfMibView",
            NormalizedValue::Bool(_) => "bool",
            NormalizedValue::Int(_) => "int",
            NormalizedValue::Float(_) => "float",
            NormalizedValue::ByteArray(_) => "bytearray",
            NormalizedValue::String(_) => "string",
        }
    }

    pub fn is_no_such_instance(&self) -> bool {
        matches!(self.value, NormalizedValue::NoSuchInstance)
    }

    pub fn is_no_such_object(&self) -> bool {
        matches!(self.value, NormalizedValue::NoSuchObject)
    }

    pub fn is_end_of_mib_view(&self) -> bool {
        matches!(self.value, NormalizedValue::EndOfMibView)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            NormalizedValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            NormalizedValue::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            NormalizedValue::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            NormalizedValue::ByteArray(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            NormalizedValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MultiResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ", self.oid, self.type_tag())?;
        match &self.value {
            NormalizedValue::NoSuchInstance
            | NormalizedValue::NoSuchObject
            | NormalizedValue::EndOfMibView => Ok(()),
            NormalizedValue::Bool(b) => write!(f, "{}", b),
            NormalizedValue::Int(i) => write!(f, "{}", i),
            NormalizedValue::Float(x) => write!(f, "{}", x),
            NormalizedValue::ByteArray(data) => match std::str::from_utf8(data) {
                Ok(text) => write!(f, "{:?}", text),
                Err(_) => {
                    write!(f, "hex:")?;
                    for byte in data {
                        write!(f, "{:02x}", byte)?;
                    }
                    Ok(())
                }
            },
            NormalizedValue::String(s) => f.write_str(s),
        }
    }
}

/// Parse the net-snmp Opaque float wrappers: context tag 0x78 wraps an
/// IEEE 754 single, 0x79 a double, both long-form tagged (0x9F prefix)
/// and big-endian. Anything else is left to the caller as raw bytes.
fn parse_opaque_float(data: &[u8]) -> Option<f64> {
    match data {
        [0x9F, 0x78, 0x04, rest @ ..] if rest.len() == 4 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(rest);
            Some(f32::from_be_bytes(bytes) as f64)
        }
        [0x9F, 0x79, 0x08, rest @ ..] if rest.len() == 8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(rest);
            Some(f64::from_be_bytes(bytes))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use bytes::Bytes;

    fn build(value: Value) -> MultiResult {
        MultiResult::build(oid!(1, 3, 6, 1, 4, 1, 8072, 2, 3, 2, 1), &value).unwrap()
    }

    #[test]
    fn test_null_maps_to_no_such_instance() {
        let r = build(Value::Null);
        assert!(r.is_no_such_instance());
        assert_eq!(r.type_tag(), "noSuchInstance");
    }

    #[test]
    fn test_exception_sentinels() {
        assert_eq!(build(Value::NoSuchInstance).type_tag(), "noSuchInstance");
        assert_eq!(build(Value::NoSuchObject).type_tag(), "noSuchObject");
        assert_eq!(build(Value::EndOfMibView).type_tag(), "endOfMibView");
        assert!(build(Value::NoSuchObject).is_no_such_object());
        assert!(build(Value::EndOfMibView).is_end_of_mib_view());
    }

    #[test]
    fn test_integral_types_widen() {
        assert_eq!(build(Value::Integer(-7)).as_int(), Some(-7));
        assert_eq!(build(Value::Counter32(u32::MAX)).as_int(), Some(4294967295));
        assert_eq!(build(Value::Gauge32(0)).as_int(), Some(0));
        assert_eq!(build(Value::TimeTicks(8675309)).as_int(), Some(8675309));
    }

    #[test]
    fn test_counter64_wraps_through_sign_bit() {
        assert_eq!(build(Value::Counter64(u64::MAX)).as_int(), Some(-1));
        assert_eq!(
            build(Value::Counter64(i64::MAX as u64 + 1)).as_int(),
            Some(i64::MIN)
        );
        assert_eq!(build(Value::Counter64(42)).as_int(), Some(42));
    }

    #[test]
    fn test_boolean() {
        assert_eq!(build(Value::Boolean(true)).as_bool(), Some(true));
        assert_eq!(build(Value::Boolean(false)).type_tag(), "bool");
    }

    #[test]
    fn test_opaque_float_single() {
        let pi = std::f32::consts::PI;
        let mut data = vec![0x9F, 0x78, 0x04];
        data.extend_from_slice(&pi.to_be_bytes());
        let r = build(Value::Opaque(Bytes::from(data)));
        assert_eq!(r.type_tag(), "float");
        assert_eq!(r.as_float(), Some(pi as f64));
    }

    #[test]
    fn test_opaque_float_double() {
        let e = std::f64::consts::E;
        let mut data = vec![0x9F, 0x79, 0x08];
        data.extend_from_slice(&e.to_be_bytes());
        assert_eq!(build(Value::Opaque(Bytes::from(data))).as_float(), Some(e));
    }

    #[test]
    fn test_opaque_without_wrapper_is_bytearray() {
        let r = build(Value::Opaque(Bytes::from_static(&[0x01, 0x02, 0x03])));
        assert_eq!(r.type_tag(), "bytearray");
        assert_eq!(r.as_bytes(), Some(&[0x01, 0x02, 0x03][..]));
    }

    #[test]
    fn test_octet_string_is_bytearray() {
        let r = build(Value::OctetString(Bytes::from_static(b"eth0")));
        assert_eq!(r.as_bytes(), Some(&b"eth0"[..]));
    }

    #[test]
    fn test_oid_and_ip_become_strings() {
        let r = build(Value::ObjectIdentifier(oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 4)));
        assert_eq!(r.as_str(), Some("1.3.6.1.6.3.1.1.5.4"));

        let r = build(Value::IpAddress([192, 0, 2, 33]));
        assert_eq!(r.as_str(), Some("192.0.2.33"));
        assert_eq!(r.type_tag(), "string");
    }

    #[test]
    fn test_empty_unknown_is_no_such_instance() {
        let r = build(Value::Unknown {
            tag: 0,
            data: Bytes::new(),
        });
        assert!(r.is_no_such_instance());
    }

    #[test]
    fn test_tag_zero_with_payload_is_no_such_instance() {
        // Tag zero collapses to the missing-binding sentinel no matter
        // what trails it; trailing bytes must never become an error a
        // remote sender can feed the fatal path.
        let r = build(Value::Unknown {
            tag: 0,
            data: Bytes::from_static(&[0x01]),
        });
        assert!(r.is_no_such_instance());
        assert_eq!(r.type_tag(), "noSuchInstance");

        // Same value as it arrives off the wire.
        let mut decoder = crate::ber::Decoder::from_slice(&[0x00, 0x01, 0x01]);
        let value = Value::decode(&mut decoder).unwrap();
        assert!(build(value).is_no_such_instance());
    }

    #[test]
    fn test_unknown_tag_is_error() {
        let err = MultiResult::build(
            oid!(1, 3, 6, 1),
            &Value::Unknown {
                tag: 0x45,
                data: Bytes::from_static(&[0x00]),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownType { tag: 0x45, .. }));
    }

    #[test]
    fn test_single_live_payload() {
        // The accessors are mutually exclusive: at most one returns Some
        // and the sentinel flags never overlap a live payload.
        let samples = vec![
            build(Value::Integer(5)),
            build(Value::Boolean(true)),
            build(Value::OctetString(Bytes::from_static(b"x"))),
            build(Value::IpAddress([10, 0, 0, 1])),
            build(Value::Null),
        ];
        for r in samples {
            let live = [
                r.as_bool().is_some(),
                r.as_int().is_some(),
                r.as_float().is_some(),
                r.as_bytes().is_some(),
                r.as_str().is_some(),
            ]
            .iter()
            .filter(|&&x| x)
            .count();
            let sentinels = [
                r.is_no_such_instance(),
                r.is_no_such_object(),
                r.is_end_of_mib_view(),
            ]
            .iter()
            .filter(|&&x| x)
            .count();
            assert!(live + sentinels == 1, "{:?}", r);
        }
    }
}
