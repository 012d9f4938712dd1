use thiserror::Error;

/// A packet error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A packet error.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum Error {
    /// The buffer is too small to hold the named packet.
    #[error("insufficient buffer for {0} packet, minimum={1}, provided={2}")]
    InsufficientPacketBuffer(&'static str, usize, usize),
    /// The payload does not match the space left in the buffer.
    #[error("payload of {0} bytes does not fit {1} packet with {2} bytes of payload space")]
    PayloadSize(usize, &'static str, usize),
}
