use crate::error::IoResult;
use std::net::Ipv4Addr;
use std::sync::Arc;

#[cfg(unix)]
mod raw;

#[cfg(unix)]
pub use raw::RawSocketTransport;

/// A primitive for transmitting complete `IPv4` packets.
///
/// Packets handed to [`Transport::send_to`] carry their own `IPv4` header.
/// Implementations are shared between the background transmission threads so
/// must be `Send + Sync`.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Send a complete `IPv4` packet to `dest_addr`.
    fn send_to(&self, packet: &[u8], dest_addr: Ipv4Addr) -> IoResult<()>;

    /// The local address used to reach `dest_addr`.
    fn local_addr_for(&self, dest_addr: Ipv4Addr) -> IoResult<Ipv4Addr>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_to(&self, packet: &[u8], dest_addr: Ipv4Addr) -> IoResult<()> {
        (**self).send_to(packet, dest_addr)
    }

    fn local_addr_for(&self, dest_addr: Ipv4Addr) -> IoResult<Ipv4Addr> {
        (**self).local_addr_for(dest_addr)
    }
}
