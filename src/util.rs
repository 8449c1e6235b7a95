//! Internal utilities.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Create and bind a UDP socket with optional receive buffer size.
///
/// For IPv6 addresses, sets `IPV6_V6ONLY = false` so a single `[::]`
/// socket accepts both IPv4 and IPv6 traps.
///
/// The receive buffer matters more here than for a poller: trap
/// traffic is unsolicited and bursty, and anything the kernel drops
/// before `recv_from` is invisible to us. The kernel may still cap the
/// requested size at `net.core.rmem_max`.
pub(crate) async fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }

    // Allow address reuse for quick restarts
    socket.set_reuse_address(true)?;

    if let Some(size) = recv_buffer_size {
        // Ignore errors - kernel will cap at rmem_max
        let _ = socket.set_recv_buffer_size(size);
    }

    // Set non-blocking before converting to tokio socket
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}
