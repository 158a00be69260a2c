//! Archiver / archive reader collaborator contract.
//!
//! `Archiver::poll` drains a subscription and persists fragments keyed by
//! `(session_id, position)`; `ArchiveReader::read` returns the fragment
//! beginning at a position, or `None` if it isn't present yet. Required
//! guarantees: durability before acknowledgement is sent, idempotent
//! re-reads, no partial fragments exposed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use fixgw_transport::Subscription;
use fixgw_types::{LogPosition, SessionId};

pub trait Archiver {
    /// Drains available fragments from the subscription into durable
    /// storage. Returns the number of fragments persisted.
    fn poll(&mut self) -> usize;
}

pub trait ArchiveReader: Send + Sync {
    fn read(&self, session_id: SessionId, position: LogPosition) -> Option<Vec<u8>>;

    /// The end offset of the region contiguously present from zero (i.e.
    /// the position one past the last byte archived without a gap), or
    /// `None` if nothing has been archived yet for this session.
    fn contiguous_through(&self, session_id: SessionId) -> Option<LogPosition>;
}

#[derive(Default)]
struct SessionArchive {
    fragments: BTreeMap<u64, Vec<u8>>,
}

/// In-memory archive: durable for the life of the process, not across
/// restarts. Exercises the same contract a disk-backed archiver would.
#[derive(Clone, Default)]
pub struct InMemoryArchive {
    sessions: Arc<Mutex<BTreeMap<SessionId, SessionArchive>>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader(&self) -> Self {
        self.clone()
    }
}

impl ArchiveReader for InMemoryArchive {
    fn read(&self, session_id: SessionId, position: LogPosition) -> Option<Vec<u8>> {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(&session_id)
            .and_then(|s| s.fragments.get(&position.value()))
            .cloned()
    }

    fn contiguous_through(&self, session_id: SessionId) -> Option<LogPosition> {
        let sessions = self.sessions.lock().unwrap();
        let session = sessions.get(&session_id)?;
        if session.fragments.is_empty() {
            return None;
        }
        let mut end = 0u64;
        for (&start, bytes) in &session.fragments {
            if start != end {
                break;
            }
            end += bytes.len() as u64;
        }
        Some(LogPosition::new(end))
    }
}

/// Persists fragments from one `Subscription` into an [`InMemoryArchive`].
pub struct InMemoryArchiver {
    subscription: Subscription,
    archive: InMemoryArchive,
    fragment_limit: usize,
}

impl InMemoryArchiver {
    pub fn new(subscription: Subscription, archive: InMemoryArchive, fragment_limit: usize) -> Self {
        Self {
            subscription,
            archive,
            fragment_limit,
        }
    }
}

impl Archiver for InMemoryArchiver {
    fn poll(&mut self) -> usize {
        let archive = self.archive.clone();
        let mut handler = move |session_id: SessionId, position: LogPosition, bytes: &[u8]| {
            let mut sessions = archive.sessions.lock().unwrap();
            sessions
                .entry(session_id)
                .or_default()
                .fragments
                .insert(position.value(), bytes.to_vec());
        };
        self.subscription.poll(&mut handler, self.fragment_limit)
    }
}
