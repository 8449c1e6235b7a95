//! Common test fixtures: wire-format trap builders and well-known OIDs.

use bytes::Bytes;
use trapsink::ber::EncodeBuf;
use trapsink::message::{
    CommunityMessage, EncodedPdu, MsgFlags, MsgGlobalData, ScopedPdu, ScopedPduData,
    UsmSecurityParams, V3Message,
};
use trapsink::pdu::{Pdu, PduType, TrapV1Pdu};
use trapsink::{Oid, Value, VarBind, Version, oid};

pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}

/// snmpTrapOID.0
pub fn trap_oid() -> Oid {
    oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
}

/// linkDown notification
pub fn link_down() -> Oid {
    oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)
}

/// The standard varbind prefix every v2c trap carries.
pub fn standard_varbinds() -> Vec<VarBind> {
    vec![
        VarBind::new(sys_uptime(), Value::TimeTicks(123456)),
        VarBind::new(trap_oid(), Value::ObjectIdentifier(link_down())),
    ]
}

/// Build a v2c trap datagram with the standard prefix plus `extra`.
pub fn v2c_trap(community: &[u8], extra: Vec<VarBind>) -> Bytes {
    let mut varbinds = standard_varbinds();
    varbinds.extend(extra);
    let pdu = Pdu {
        pdu_type: PduType::TrapV2,
        request_id: 1,
        error_status: 0,
        error_index: 0,
        varbinds,
    };
    CommunityMessage::encode(Version::V2c, community, &EncodedPdu::from_pdu(&pdu))
}

/// Build a v2c inform datagram.
pub fn v2c_inform(community: &[u8], extra: Vec<VarBind>) -> Bytes {
    let mut varbinds = standard_varbinds();
    varbinds.extend(extra);
    let pdu = Pdu {
        pdu_type: PduType::InformRequest,
        request_id: 7,
        error_status: 0,
        error_index: 0,
        varbinds,
    };
    CommunityMessage::encode(Version::V2c, community, &EncodedPdu::from_pdu(&pdu))
}

/// Build a v1 trap datagram.
pub fn v1_trap(community: &[u8], varbinds: Vec<VarBind>) -> Bytes {
    let trap = TrapV1Pdu {
        enterprise: oid!(1, 3, 6, 1, 4, 1, 8072),
        agent_addr: [192, 0, 2, 1],
        generic_trap: 2,
        specific_trap: 0,
        timestamp: 98765,
        varbinds,
    };
    CommunityMessage::encode(Version::V1, community, &EncodedPdu::from_trap_v1(&trap))
}

/// Build a v3 noAuthNoPriv trap datagram.
pub fn v3_trap(username: &[u8], extra: Vec<VarBind>) -> Bytes {
    let mut varbinds = standard_varbinds();
    varbinds.extend(extra);
    let msg = V3Message {
        global_data: MsgGlobalData {
            msg_id: 42,
            msg_max_size: 65507,
            msg_flags: MsgFlags {
                auth: false,
                priv_: false,
                reportable: false,
            },
            msg_security_model: 3,
        },
        security_params: UsmSecurityParams {
            engine_id: Bytes::from_static(&[0x80, 0x00, 0x1F, 0x88, 0x04, 0x61]),
            engine_boots: 1,
            engine_time: 100,
            username: Bytes::copy_from_slice(username),
            auth_params: Bytes::new(),
            priv_params: Bytes::new(),
        },
        data: ScopedPduData::Plaintext(ScopedPdu {
            context_engine_id: Bytes::from_static(&[0x80, 0x00, 0x1F, 0x88, 0x04, 0x61]),
            context_name: Bytes::new(),
            pdu: Pdu {
                pdu_type: PduType::TrapV2,
                request_id: 9,
                error_status: 0,
                error_index: 0,
                varbinds,
            },
        }),
    };
    msg.encode()
}

/// A structurally-valid SEQUENCE that is not an SNMP message.
pub fn garbage() -> Bytes {
    let mut buf = EncodeBuf::new();
    buf.push_sequence(|buf| {
        buf.push_octet_string(b"not snmp");
    });
    buf.finish()
}
