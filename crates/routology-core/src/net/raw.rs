use crate::error::{IoError, IoOperation, IoResult};
use crate::net::Transport;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tracing::instrument;

/// The port used when connecting a datagram socket to discover a local address.
///
/// No packets are sent to this port.
const DISCOVERY_PORT: u16 = 80;

/// A [`Transport`] over a raw `IPv4` socket with `IP_HDRINCL` set.
///
/// Requires `CAP_NET_RAW` or root.
// TODO the BSDs and macOS expect `total_length` in host byte order on raw
// sockets, packets are currently always written in network byte order.
#[derive(Debug)]
pub struct RawSocketTransport {
    inner: Socket,
}

impl RawSocketTransport {
    #[instrument(level = "trace")]
    pub fn new() -> IoResult<Self> {
        let inner = Socket::new(
            Domain::IPV4,
            Type::RAW,
            Some(Protocol::from(nix::libc::IPPROTO_RAW)),
        )
        .map_err(|err| IoError::Other(err, IoOperation::NewSocket))?;
        inner
            .set_header_included_v4(true)
            .map_err(|err| IoError::Other(err, IoOperation::SetHeaderIncluded))?;
        Ok(Self { inner })
    }
}

impl Transport for RawSocketTransport {
    #[instrument(skip(self, packet), level = "trace")]
    fn send_to(&self, packet: &[u8], dest_addr: Ipv4Addr) -> IoResult<()> {
        let addr = SockAddr::from(SocketAddrV4::new(dest_addr, 0));
        self.inner
            .send_to(packet, &addr)
            .map_err(|err| IoError::SendTo(err, dest_addr))?;
        Ok(())
    }

    /// Discover the local address by connecting a `UDP` datagram socket to
    /// `dest_addr` and reading back the address the kernel bound.
    #[instrument(skip(self), ret, level = "trace")]
    fn local_addr_for(&self, dest_addr: Ipv4Addr) -> IoResult<Ipv4Addr> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|err| IoError::Other(err, IoOperation::NewSocket))?;
        let remote = SocketAddr::V4(SocketAddrV4::new(dest_addr, DISCOVERY_PORT));
        socket
            .connect(&SockAddr::from(remote))
            .map_err(|err| IoError::Connect(err, remote))?;
        socket
            .local_addr()
            .map_err(|err| IoError::Other(err, IoOperation::LocalAddr))?
            .as_socket_ipv4()
            .map(|addr| *addr.ip())
            .ok_or_else(|| {
                IoError::Other(
                    io::Error::new(io::ErrorKind::AddrNotAvailable, "no IPv4 local address"),
                    IoOperation::LocalAddr,
                )
            })
    }
}
