use crate::types::{Serie, TimeToLive};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// The identity of a measurement target.
///
/// Two `HostId` values are equal when their addresses are equal, the display
/// name plays no part in equality or hashing.
///
/// Note that this type is cheaply cloneable.
#[derive(Debug, Clone)]
pub struct HostId {
    addr: Ipv4Addr,
    name: Option<Arc<str>>,
}

impl HostId {
    #[must_use]
    pub const fn new(addr: Ipv4Addr) -> Self {
        Self { addr, name: None }
    }

    #[must_use]
    pub fn with_name(addr: Ipv4Addr, name: impl Into<Arc<str>>) -> Self {
        Self {
            addr,
            name: Some(name.into()),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for HostId {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for HostId {}

impl Hash for HostId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl From<Ipv4Addr> for HostId {
    fn from(addr: Ipv4Addr) -> Self {
        Self::new(addr)
    }
}

impl Display for HostId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.addr),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// A request to probe `host` at `ttl` as part of probe series `serie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub ttl: TimeToLive,
    pub serie: Serie,
    pub host: HostId,
}

impl SendRequest {
    #[must_use]
    pub fn new(ttl: u8, serie: u16, host: impl Into<HostId>) -> Self {
        Self {
            ttl: TimeToLive(ttl),
            serie: Serie(serie),
            host: host.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_host_id_equality_ignores_name() {
        let addr = Ipv4Addr::new(192, 0, 2, 1);
        let named = HostId::with_name(addr, "example.com");
        let bare = HostId::new(addr);
        assert_eq!(named, bare);
        let set = HashSet::from([named, bare]);
        assert_eq!(1, set.len());
        assert_ne!(HostId::new(addr), HostId::new(Ipv4Addr::new(192, 0, 2, 2)));
    }

    #[test]
    fn test_host_id_display() {
        let addr = Ipv4Addr::new(192, 0, 2, 1);
        assert_eq!("192.0.2.1", HostId::new(addr).to_string());
        assert_eq!(
            "example.com (192.0.2.1)",
            HostId::with_name(addr, "example.com").to_string()
        );
    }

    #[test]
    fn test_send_request_new() {
        let req = SendRequest::new(3, 1, Ipv4Addr::LOCALHOST);
        assert_eq!(TimeToLive(3), req.ttl);
        assert_eq!(Serie(1), req.serie);
        assert_eq!(Ipv4Addr::LOCALHOST, req.host.addr());
    }
}
