use derive_more::{Display, From};

/// `TimeToLive` (ttl) newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Display, From)]
pub struct TimeToLive(pub u8);

/// `Serie` newtype.
///
/// Distinguishes independent rounds of probing to the same (host, ttl) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Display, From)]
pub struct Serie(pub u16);

/// ICMP echo `Sequence` number newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Display, From)]
pub struct Sequence(pub u16);

/// TCP sequence number newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Display, From)]
pub struct TcpSequence(pub u32);

/// ICMP echo identifier newtype.
///
/// Fixed for a session and identifies the probing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Display, From)]
pub struct TraceId(pub u16);

/// Port newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Display, From)]
pub struct Port(pub u16);

/// `PacketSize` newtype.
///
/// The size of the UDP and ICMP datagrams, transport header included and
/// `IPv4` header excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Display)]
pub struct PacketSize(pub u16);

/// `PayloadPattern` newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct PayloadPattern(pub u8);

/// `TypeOfService` (aka `DSCP` & `ECN`) newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct TypeOfService(pub u8);
