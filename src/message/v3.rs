//! SNMPv3 message envelope (RFC 3412) and USM security parameters
//! (RFC 3414).
//!
//! Only the noAuthNoPriv level is processed: authenticated or
//! encrypted messages decode far enough to classify and are then
//! rejected by the caller. Privacy would need the USM key machinery,
//! which a pure receiver has no credentials for anyway.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use bytes::Bytes;

/// msgFlags bits (RFC 3412 Section 6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgFlags {
    pub auth: bool,
    pub priv_: bool,
    pub reportable: bool,
}

impl MsgFlags {
    const AUTH: u8 = 0x01;
    const PRIV: u8 = 0x02;
    const REPORTABLE: u8 = 0x04;

    /// Parse from the single msgFlags octet. Priv without auth is
    /// invalid per RFC 3412.
    pub fn from_byte(byte: u8) -> Option<MsgFlags> {
        let auth = byte & Self::AUTH != 0;
        let priv_ = byte & Self::PRIV != 0;
        if priv_ && !auth {
            return None;
        }
        Some(MsgFlags {
            auth,
            priv_,
            reportable: byte & Self::REPORTABLE != 0,
        })
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.auth {
            byte |= Self::AUTH;
        }
        if self.priv_ {
            byte |= Self::PRIV;
        }
        if self.reportable {
            byte |= Self::REPORTABLE;
        }
        byte
    }

    pub fn security_level(self) -> SecurityLevel {
        match (self.auth, self.priv_) {
            (false, _) => SecurityLevel::NoAuthNoPriv,
            (true, false) => SecurityLevel::AuthNoPriv,
            (true, true) => SecurityLevel::AuthPriv,
        }
    }
}

/// USM security levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SecurityLevel::NoAuthNoPriv => "noAuthNoPriv",
            SecurityLevel::AuthNoPriv => "authNoPriv",
            SecurityLevel::AuthPriv => "authPriv",
        };
        f.write_str(name)
    }
}

/// The USM security model identifier in msgSecurityModel.
pub const SECURITY_MODEL_USM: i32 = 3;

/// msgGlobalData header.
#[derive(Debug, Clone, PartialEq)]
pub struct MsgGlobalData {
    pub msg_id: i32,
    pub msg_max_size: i32,
    pub msg_flags: MsgFlags,
    pub msg_security_model: i32,
}

impl MsgGlobalData {
    fn decode(decoder: &mut Decoder) -> Result<MsgGlobalData> {
        let mut seq = decoder.read_sequence()?;
        let msg_id = seq.read_integer()?;
        let msg_max_size = seq.read_integer()?;

        let flags_offset = seq.offset();
        let flags_bytes = seq.read_octet_string()?;
        if flags_bytes.len() != 1 {
            return Err(Error::decode(flags_offset, DecodeErrorKind::InvalidMsgFlags));
        }
        let msg_flags = MsgFlags::from_byte(flags_bytes[0])
            .ok_or_else(|| Error::decode(flags_offset, DecodeErrorKind::InvalidMsgFlags))?;

        let model_offset = seq.offset();
        let msg_security_model = seq.read_integer()?;
        if msg_security_model != SECURITY_MODEL_USM {
            return Err(Error::decode(
                model_offset,
                DecodeErrorKind::UnknownSecurityModel(msg_security_model),
            ));
        }

        Ok(MsgGlobalData {
            msg_id,
            msg_max_size,
            msg_flags,
            msg_security_model,
        })
    }

    fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            buf.push_integer(self.msg_security_model);
            buf.push_octet_string(&[self.msg_flags.to_byte()]);
            buf.push_integer(self.msg_max_size);
            buf.push_integer(self.msg_id);
        });
    }
}

/// USM security parameters, carried as a BER SEQUENCE nested inside
/// the msgSecurityParameters OCTET STRING.
#[derive(Debug, Clone, PartialEq)]
pub struct UsmSecurityParams {
    pub engine_id: Bytes,
    pub engine_boots: i32,
    pub engine_time: i32,
    pub username: Bytes,
    pub auth_params: Bytes,
    pub priv_params: Bytes,
}

impl UsmSecurityParams {
    pub fn decode(data: Bytes) -> Result<UsmSecurityParams> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        Ok(UsmSecurityParams {
            engine_id: seq.read_octet_string()?,
            engine_boots: seq.read_integer()?,
            engine_time: seq.read_integer()?,
            username: seq.read_octet_string()?,
            auth_params: seq.read_octet_string()?,
            priv_params: seq.read_octet_string()?,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_octet_string(&self.priv_params);
            buf.push_octet_string(&self.auth_params);
            buf.push_octet_string(&self.username);
            buf.push_integer(self.engine_time);
            buf.push_integer(self.engine_boots);
            buf.push_octet_string(&self.engine_id);
        });
        buf.finish()
    }
}

/// The scoped PDU: context identification plus the PDU itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedPdu {
    pub context_engine_id: Bytes,
    pub context_name: Bytes,
    pub pdu: Pdu,
}

impl ScopedPdu {
    fn decode(decoder: &mut Decoder) -> Result<ScopedPdu> {
        let mut seq = decoder.read_sequence()?;
        let context_engine_id = seq.read_octet_string()?;
        let context_name = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;
        Ok(ScopedPdu {
            context_engine_id,
            context_name,
            pdu,
        })
    }

    fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.context_name);
            buf.push_octet_string(&self.context_engine_id);
        });
    }
}

/// msgData: plaintext scoped PDU, or the ciphertext when privacy is in
/// use.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopedPduData {
    Plaintext(ScopedPdu),
    Encrypted(Bytes),
}

/// A decoded SNMPv3 message.
#[derive(Debug, Clone, PartialEq)]
pub struct V3Message {
    pub global_data: MsgGlobalData,
    pub security_params: UsmSecurityParams,
    pub data: ScopedPduData,
}

impl V3Message {
    /// Decode a v3 message from a datagram. The caller has already
    /// confirmed the version field is 3.
    pub fn decode(data: Bytes) -> Result<V3Message> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let version_offset = seq.offset();
        let raw_version = seq.read_integer()?;
        if raw_version != crate::version::Version::V3.as_i32() {
            return Err(Error::decode(
                version_offset,
                DecodeErrorKind::UnknownVersion(raw_version),
            ));
        }

        let global_data = MsgGlobalData::decode(&mut seq)?;
        let security_params = UsmSecurityParams::decode(seq.read_octet_string()?)?;

        let data = if global_data.msg_flags.priv_ {
            // Ciphertext is an OCTET STRING; keep it opaque.
            ScopedPduData::Encrypted(seq.read_octet_string()?)
        } else {
            ScopedPduData::Plaintext(ScopedPdu::decode(&mut seq)?)
        };

        Ok(V3Message {
            global_data,
            security_params,
            data,
        })
    }

    /// Encode a plaintext v3 message. Only used for building test
    /// traffic; privacy is not implemented.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            match &self.data {
                ScopedPduData::Plaintext(scoped) => scoped.encode(buf),
                ScopedPduData::Encrypted(ct) => {
                    buf.push_bytes(ct);
                    buf.push_length(ct.len());
                    buf.push_tag(tag::universal::OCTET_STRING);
                }
            }
            buf.push_octet_string(&self.security_params.encode());
            self.global_data.encode(buf);
            buf.push_integer(crate::version::Version::V3.as_i32());
        });
        buf.finish()
    }
}
