use crate::probe::ProbeType;
use std::fmt::{Display, Formatter};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use thiserror::Error;

/// A sender error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A sender error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid packet size: {0}")]
    InvalidPacketSize(usize),
    #[error("invalid packet: {0}")]
    PacketError(#[from] routology_packet::error::Error),
    #[error("invalid config: {0}")]
    BadConfig(String),
    #[error("udp destination port overflow: {base} + serie {serie} + ttl {ttl} - 1 exceeds 65535")]
    PortOverflow { base: u16, serie: u16, ttl: u8 },
    #[error("invalid ttl {0}: must be in 1..={1}")]
    InvalidTtl(u8, u8),
    #[error("serie {0} is out of range: must be in 0..={1}")]
    SerieOutOfRange(u16, u16),
    #[error("misaligned {protocol} template: {field} has {actual} values, expected {expected}")]
    MisalignedTemplate {
        protocol: ProbeType,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    #[error("sender error: {0}")]
    Other(String),
}

/// Custom IO error result.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Custom IO error.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Sendto error for {1}: {0}")]
    SendTo(io::Error, Ipv4Addr),
    #[error("Connect error for {1}: {0}")]
    Connect(io::Error, SocketAddr),
    #[error("Failed to {1}: {0}")]
    Other(io::Error, IoOperation),
}

impl IoError {
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::SendTo(e, _) | Self::Connect(e, _) | Self::Other(e, _) => e.kind(),
        }
    }
}

/// Io operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IoOperation {
    NewSocket,
    SetHeaderIncluded,
    LocalAddr,
}

impl Display for IoOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSocket => write!(f, "create new socket"),
            Self::SetHeaderIncluded => write!(f, "set header included"),
            Self::LocalAddr => write!(f, "local addr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kind() {
        let err = IoError::SendTo(
            io::Error::from(io::ErrorKind::PermissionDenied),
            Ipv4Addr::LOCALHOST,
        );
        assert_eq!(io::ErrorKind::PermissionDenied, err.kind());
        assert_eq!(
            "Sendto error for 127.0.0.1: permission denied",
            err.to_string()
        );
    }

    #[test]
    fn test_port_overflow_message() {
        let err = Error::PortOverflow {
            base: 65500,
            serie: 10,
            ttl: 64,
        };
        assert_eq!(
            "udp destination port overflow: 65500 + serie 10 + ttl 64 - 1 exceeds 65535",
            err.to_string()
        );
    }
}
