//! Shared identifiers and value types.
//!
//! This crate has no behaviour of its own: it defines the small, `Copy`
//! newtypes that every other crate in the workspace passes around, plus the
//! composite FIX session key. Keeping these in one place means the session
//! engine and the replication core agree on what a "session id" or a
//! "position" is without depending on each other.

use std::fmt;

/// Cluster-unique identifier for a FIX session, stable across reconnects of
/// the same logical counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for SessionId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<SessionId> for u64 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Transport-local identifier for a physical connection. Distinct from
/// [`SessionId`] because a reconnecting counterparty gets a new
/// `ConnectionId` but keeps the same logical `SessionId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for ConnectionId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<ConnectionId> for u64 {
    fn from(id: ConnectionId) -> Self {
        id.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identifier for a node within the replication cluster (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(u8);

impl NodeId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// A monotonically increasing leadership epoch. Never decreases for the
/// lifetime of a node process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct LeadershipTermId(u64);

impl LeadershipTermId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LeadershipTermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term-{}", self.0)
    }
}

/// A byte offset into a transport log. Positions are monotonic within a
/// single publication and aligned to the transport's frame alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct LogPosition(u64);

impl LogPosition {
    pub const ZERO: Self = Self(0);

    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn advance(self, by: u64) -> Self {
        Self(self.0 + by)
    }
}

impl fmt::Display for LogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A FIX sequence number. Starts at 1; 0 is used internally as the "no
/// sequence number seen yet" sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SeqNum(u64);

impl SeqNum {
    pub const NONE: Self = Self(0);

    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-capacity ASCII identifier used for CompID / SubID fields.
///
/// FIX CompIDs are short (the venues this gateway talks to cap them well
/// under 32 bytes); storing them inline avoids an allocation per session
/// and gives `SessionKey` cheap `Copy` equality and hashing.
#[derive(Clone, Copy, Eq, serde::Serialize, serde::Deserialize)]
pub struct AsciiId {
    bytes: [u8; 32],
    len: u8,
}

impl AsciiId {
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        let len = raw.len().min(32);
        bytes[..len].copy_from_slice(&raw[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}

impl PartialEq for AsciiId {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl std::hash::Hash for AsciiId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for AsciiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl From<&str> for AsciiId {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

/// Composite identity used to deduplicate sessions across reconnects.
///
/// Structural equality and hashing are over the three ASCII components only
/// — two `SessionKey`s built from the same CompIDs compare equal regardless
/// of which `SessionId`/`ConnectionId` happens to be attached this time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub sender_comp_id: AsciiId,
    pub sender_sub_id: AsciiId,
    pub target_comp_id: AsciiId,
}

impl SessionKey {
    pub fn new(sender_comp_id: AsciiId, sender_sub_id: AsciiId, target_comp_id: AsciiId) -> Self {
        Self {
            sender_comp_id,
            sender_sub_id,
            target_comp_id,
        }
    }

    /// Builds the acceptor-side key from an inbound header by swapping
    /// sender and target: the peer's `SenderCompID` becomes our
    /// `TargetCompID` and vice versa.
    pub fn from_inbound_header(
        inbound_sender_comp_id: &str,
        inbound_sender_sub_id: &str,
        inbound_target_comp_id: &str,
    ) -> Self {
        Self::new(
            AsciiId::from(inbound_target_comp_id),
            AsciiId::from(inbound_sender_sub_id),
            AsciiId::from(inbound_sender_comp_id),
        )
    }
}
