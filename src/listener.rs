//! UDP trap listener.
//!
//! A [`TrapListener`] owns the socket task: it binds, reports
//! readiness through a oneshot, then loops on `recv_from` until
//! cancelled. Every accepted notification is handed to the packet
//! handler inline, on the listener task itself, so traps reach the
//! handler in arrival order.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::ber::Decoder;
use crate::error::{Error, Result};
use crate::message::{
    CommunityMessage, ScopedPduData, SecurityLevel, V3Message, peek_version,
};
use crate::pdu::{Pdu, PduType, TrapV1Pdu};
use crate::util::bind_udp_socket;
use crate::varbind::VarBind;
use crate::version::Version;

/// Maximum UDP datagram we will read.
const MAX_DATAGRAM: usize = 65535;

/// Acceptance filters and socket options for a listener.
///
/// Empty filter lists accept everything of that kind, so the default
/// params take any community and any v3 user.
#[derive(Debug, Clone, Default)]
pub struct TrapParams {
    versions: Vec<Version>,
    communities: Vec<Bytes>,
    usernames: Vec<Bytes>,
    recv_buffer_size: Option<usize>,
}

impl TrapParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict accepted protocol versions. Unset accepts v1, v2c,
    /// and v3.
    pub fn versions(mut self, versions: impl IntoIterator<Item = Version>) -> Self {
        self.versions = versions.into_iter().collect();
        self
    }

    /// Restrict accepted v1/v2c community strings.
    pub fn community(mut self, community: impl Into<Bytes>) -> Self {
        self.communities.push(community.into());
        self
    }

    /// Restrict accepted v3 usernames.
    pub fn username(mut self, username: impl Into<Bytes>) -> Self {
        self.usernames.push(username.into());
        self
    }

    /// Request a socket receive buffer size. The kernel may cap it.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    fn accepts_version(&self, version: Version) -> bool {
        self.versions.is_empty() || self.versions.contains(&version)
    }

    fn accepts_community(&self, community: &Bytes) -> bool {
        self.communities.is_empty() || self.communities.contains(community)
    }

    fn accepts_username(&self, username: &Bytes) -> bool {
        self.usernames.is_empty() || self.usernames.contains(username)
    }
}

/// A notification that passed decoding and the acceptance filters.
#[derive(Debug, Clone)]
pub struct TrapPacket {
    pub version: Version,
    pub pdu_type: PduType,
    /// Community string for v1/v2c packets.
    pub community: Option<Bytes>,
    /// USM username for v3 packets.
    pub username: Option<Bytes>,
    pub varbinds: Vec<VarBind>,
}

/// Callback invoked for each accepted trap, on the listener task.
pub type PacketHandler = Arc<dyn Fn(&TrapPacket, SocketAddr) + Send + Sync>;

/// The socket-owning half of a trap receiver.
pub struct TrapListener {
    params: TrapParams,
    handler: PacketHandler,
    shutdown: CancellationToken,
}

impl TrapListener {
    pub fn new(params: TrapParams, handler: PacketHandler) -> Self {
        Self {
            params,
            handler,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the listen loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind and run the receive loop until cancelled.
    ///
    /// The bind outcome travels through `ready`: on success the bound
    /// local address (which resolves port 0 to the real port), on
    /// failure the bind error. The loop itself only returns an error
    /// for socket failures after a successful bind.
    pub async fn listen(
        self,
        addr: SocketAddr,
        ready: oneshot::Sender<Result<SocketAddr>>,
    ) -> Result<()> {
        let socket = match bind_udp_socket(addr, self.params.recv_buffer_size).await {
            Ok(socket) => socket,
            Err(e) => {
                let _ = ready.send(Err(Error::Io {
                    target: Some(addr),
                    source: e,
                }));
                return Ok(());
            }
        };
        let local_addr = match socket.local_addr() {
            Ok(local) => local,
            Err(e) => {
                let _ = ready.send(Err(Error::Io {
                    target: Some(addr),
                    source: e,
                }));
                return Ok(());
            }
        };

        tracing::info!(
            target: "trapsink::listener",
            %local_addr,
            "listening for notifications"
        );
        // The receiver may have gone away; keep serving regardless.
        let _ = ready.send(Ok(local_addr));

        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!(
                        target: "trapsink::listener",
                        %local_addr,
                        "listener shutting down"
                    );
                    return Ok(());
                }
                result = socket.recv_from(&mut buf) => {
                    let (len, source) = result.map_err(|e| {
                        tracing::error!(
                            target: "trapsink::listener",
                            %local_addr,
                            error = %e,
                            "socket receive failed"
                        );
                        Error::io(e)
                    })?;
                    let data = Bytes::copy_from_slice(&buf[..len]);
                    self.handle_datagram(data, source);
                }
            }
        }
    }

    /// Decode one datagram and dispatch it if it passes the filters.
    /// Malformed or filtered packets are logged and dropped; they
    /// never take the listener down.
    fn handle_datagram(&self, data: Bytes, source: SocketAddr) {
        let version = match peek_version(&data) {
            Ok(version) => version,
            Err(e) => {
                tracing::debug!(
                    target: "trapsink::listener",
                    %source,
                    error = %e,
                    "dropping undecodable datagram"
                );
                return;
            }
        };

        if !self.params.accepts_version(version) {
            tracing::debug!(
                target: "trapsink::listener",
                %source,
                %version,
                "dropping packet: version not accepted"
            );
            return;
        }

        let packet = match version {
            Version::V1 | Version::V2c => self.decode_community(data, source),
            Version::V3 => self.decode_v3(data, source),
        };

        if let Some(packet) = packet {
            tracing::debug!(
                target: "trapsink::listener",
                %source,
                version = %packet.version,
                pdu_type = %packet.pdu_type,
                varbinds = packet.varbinds.len(),
                "accepted notification"
            );
            (self.handler)(&packet, source);
        }
    }

    fn decode_community(&self, data: Bytes, source: SocketAddr) -> Option<TrapPacket> {
        let msg = match CommunityMessage::decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    target: "trapsink::listener",
                    %source,
                    error = %e,
                    "dropping malformed community message"
                );
                return None;
            }
        };

        if !self.params.accepts_community(&msg.community) {
            tracing::debug!(
                target: "trapsink::listener",
                %source,
                "dropping packet: community not accepted"
            );
            return None;
        }

        let mut decoder = Decoder::new(msg.pdu_bytes);
        let (pdu_type, varbinds) = match decoder.peek_tag() {
            Some(tag) if tag == crate::ber::tag::pdu::TRAP_V1 => {
                match TrapV1Pdu::decode(&mut decoder) {
                    Ok(trap) => (PduType::TrapV1, trap.varbinds),
                    Err(e) => {
                        tracing::debug!(
                            target: "trapsink::listener",
                            %source,
                            error = %e,
                            "dropping malformed v1 trap"
                        );
                        return None;
                    }
                }
            }
            _ => match Pdu::decode(&mut decoder) {
                Ok(pdu) if pdu.pdu_type.is_notification() => (pdu.pdu_type, pdu.varbinds),
                Ok(pdu) => {
                    tracing::debug!(
                        target: "trapsink::listener",
                        %source,
                        pdu_type = %pdu.pdu_type,
                        "ignoring non-notification PDU"
                    );
                    return None;
                }
                Err(e) => {
                    tracing::debug!(
                        target: "trapsink::listener",
                        %source,
                        error = %e,
                        "dropping malformed PDU"
                    );
                    return None;
                }
            },
        };

        Some(TrapPacket {
            version: msg.version,
            pdu_type,
            community: Some(msg.community),
            username: None,
            varbinds,
        })
    }

    fn decode_v3(&self, data: Bytes, source: SocketAddr) -> Option<TrapPacket> {
        let msg = match V3Message::decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    target: "trapsink::listener",
                    %source,
                    error = %e,
                    "dropping malformed v3 message"
                );
                return None;
            }
        };

        let level = msg.global_data.msg_flags.security_level();
        if level != SecurityLevel::NoAuthNoPriv {
            tracing::warn!(
                target: "trapsink::listener",
                %source,
                security_level = %level,
                "dropping v3 packet: only noAuthNoPriv is supported"
            );
            return None;
        }

        if !self.params.accepts_username(&msg.security_params.username) {
            tracing::debug!(
                target: "trapsink::listener",
                %source,
                "dropping packet: username not accepted"
            );
            return None;
        }

        let scoped = match msg.data {
            ScopedPduData::Plaintext(scoped) => scoped,
            // Unreachable at noAuthNoPriv, but the type allows it.
            ScopedPduData::Encrypted(_) => return None,
        };

        if !scoped.pdu.pdu_type.is_notification() {
            tracing::debug!(
                target: "trapsink::listener",
                %source,
                pdu_type = %scoped.pdu.pdu_type,
                "ignoring non-notification PDU"
            );
            return None;
        }

        Some(TrapPacket {
            version: Version::V3,
            pdu_type: scoped.pdu.pdu_type,
            community: None,
            username: Some(msg.security_params.username),
            varbinds: scoped.pdu.varbinds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::EncodedPdu;
    use crate::oid;
    use crate::value::Value;

    fn listener_with(params: TrapParams) -> (TrapListener, Arc<std::sync::Mutex<Vec<TrapPacket>>>)
    {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: PacketHandler = Arc::new(move |packet, _source| {
            sink.lock().unwrap().push(packet.clone());
        });
        (TrapListener::new(params, handler), seen)
    }

    fn v2c_trap_wire(community: &[u8]) -> Bytes {
        let pdu = Pdu {
            pdu_type: PduType::TrapV2,
            request_id: 1,
            error_status: 0,
            error_index: 0,
            varbinds: vec![VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
                Value::TimeTicks(10),
            )],
        };
        CommunityMessage::encode(Version::V2c, community, &EncodedPdu::from_pdu(&pdu))
    }

    fn source() -> SocketAddr {
        "192.0.2.7:50000".parse().unwrap()
    }

    #[test]
    fn test_accepts_v2c_trap() {
        let (listener, seen) = listener_with(TrapParams::new());
        listener.handle_datagram(v2c_trap_wire(b"public"), source());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].version, Version::V2c);
        assert_eq!(seen[0].pdu_type, PduType::TrapV2);
        assert_eq!(seen[0].community.as_deref(), Some(&b"public"[..]));
    }

    #[test]
    fn test_community_filter() {
        let (listener, seen) = listener_with(TrapParams::new().community(&b"secret"[..]));
        listener.handle_datagram(v2c_trap_wire(b"public"), source());
        assert!(seen.lock().unwrap().is_empty());
        listener.handle_datagram(v2c_trap_wire(b"secret"), source());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_version_filter() {
        let (listener, seen) = listener_with(TrapParams::new().versions([Version::V1]));
        listener.handle_datagram(v2c_trap_wire(b"public"), source());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ignores_non_notification_pdu() {
        let pdu = Pdu {
            pdu_type: PduType::GetRequest,
            request_id: 1,
            error_status: 0,
            error_index: 0,
            varbinds: vec![],
        };
        let wire = CommunityMessage::encode(Version::V2c, b"public", &EncodedPdu::from_pdu(&pdu));
        let (listener, seen) = listener_with(TrapParams::new());
        listener.handle_datagram(wire, source());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drops_garbage_silently() {
        let (listener, seen) = listener_with(TrapParams::new());
        listener.handle_datagram(Bytes::from_static(&[0xFF, 0x00, 0x42]), source());
        listener.handle_datagram(Bytes::new(), source());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_accepts_v1_trap() {
        let trap = TrapV1Pdu {
            enterprise: oid!(1, 3, 6, 1, 4, 1, 8072),
            agent_addr: [192, 0, 2, 9],
            generic_trap: 2,
            specific_trap: 0,
            timestamp: 100,
            varbinds: vec![VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 2),
                Value::Integer(2),
            )],
        };
        let wire =
            CommunityMessage::encode(Version::V1, b"public", &EncodedPdu::from_trap_v1(&trap));
        let (listener, seen) = listener_with(TrapParams::new());
        listener.handle_datagram(wire, source());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].pdu_type, PduType::TrapV1);
        assert_eq!(seen[0].varbinds.len(), 1);
    }
}
