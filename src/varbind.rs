//! Variable bindings.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::Result;
use crate::oid::Oid;
use crate::value::Value;
use std::fmt;

/// A variable binding: an OID paired with a value.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// A varbind with a NULL value, as used in request PDUs.
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Decode a single varbind: `SEQUENCE { OID, value }`.
    pub fn decode(decoder: &mut Decoder) -> Result<VarBind> {
        let mut seq = decoder.read_sequence()?;
        let oid = seq.read_oid()?;
        let value = Value::decode(&mut seq)?;
        Ok(VarBind { oid, value })
    }

    /// Encode this varbind into the buffer.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.value.encode(buf);
            buf.push_oid(&self.oid);
        });
    }
}

impl fmt::Display for VarBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Decode a varbind list: `SEQUENCE OF VarBind`.
pub fn decode_varbind_list(decoder: &mut Decoder) -> Result<Vec<VarBind>> {
    let mut list = decoder.read_sequence()?;
    let mut varbinds = Vec::new();
    while !list.is_empty() {
        varbinds.push(VarBind::decode(&mut list)?);
    }
    Ok(varbinds)
}

/// Encode a varbind list.
pub fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) {
    buf.push_sequence(|buf| {
        // Reverse buffer: encode in reverse so the list reads in order
        for vb in varbinds.iter().rev() {
            vb.encode(buf);
        }
    });
}
