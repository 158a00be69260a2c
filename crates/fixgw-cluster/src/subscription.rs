//! Reader-side facade: exposes only committed fragments, in commit order.

use fixgw_replication::ArchiveReader;
use fixgw_transport::{FragmentHandler, Subscription};
use fixgw_types::{LogPosition, SessionId};

/// Bounds delivery to `position < commit_position` one fragment at a time.
///
/// The underlying [`Subscription::poll`] has no notion of a commit
/// boundary and will happily hand back anything already physically
/// appended to the log; checking `subscription.position()` (the position
/// of the next undelivered frame) before each single-fragment poll keeps
/// this layer from ever exposing data no quorum has acknowledged yet.
pub struct ClusterSubscription {
    subscription: Subscription,
    session_id: SessionId,
}

impl ClusterSubscription {
    pub fn new(subscription: Subscription, session_id: SessionId) -> Self {
        Self { subscription, session_id }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn position(&self) -> LogPosition {
        self.subscription.position()
    }

    /// Delivers up to `limit` fragments whose position is already below
    /// `commit_position`, in log order.
    pub fn poll(&mut self, handler: &mut dyn FragmentHandler, limit: usize, commit_position: LogPosition) -> usize {
        let mut delivered = 0;
        while delivered < limit && self.subscription.position() < commit_position {
            if self.subscription.poll(handler, 1) == 0 {
                break;
            }
            delivered += 1;
        }
        delivered
    }

    /// Swaps in the subscription for a new leader's data publication after
    /// a term boundary, resyncing the read cursor from the archive
    /// reader's highest contiguously-known position for that session.
    pub fn resync(&mut self, new_subscription: Subscription, new_session_id: SessionId, archive_reader: &dyn ArchiveReader) {
        let mut subscription = new_subscription;
        if let Some(through) = archive_reader.contiguous_through(new_session_id) {
            subscription.seek(through);
        }
        self.subscription = subscription;
        self.session_id = new_session_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixgw_replication::InMemoryArchive;
    use fixgw_transport::{Publication, TransportLog};

    #[test]
    fn poll_never_exposes_uncommitted_fragments() {
        let session_id = SessionId::new(1);
        let publication = Publication::new(TransportLog::new(session_id));
        publication.offer(b"one").unwrap();
        let second_position = publication.offer(b"two").unwrap();

        let mut cluster_sub = ClusterSubscription::new(publication.subscription(), session_id);
        let mut seen = Vec::new();
        let delivered = cluster_sub.poll(&mut |_sid, pos, data: &[u8]| seen.push((pos, data.to_vec())), 10, LogPosition::new(3));
        assert_eq!(delivered, 1, "only the first fragment is below commit_position 3");
        assert_eq!(seen[0].1, b"one");

        let delivered = cluster_sub.poll(&mut |_sid, pos, data: &[u8]| seen.push((pos, data.to_vec())), 10, second_position.advance(3));
        assert_eq!(delivered, 1);
        assert_eq!(seen[1].1, b"two");
    }

    #[test]
    fn resync_seeks_to_archived_contiguous_position() {
        let old_session = SessionId::new(1);
        let new_session = SessionId::new(2);

        let archive = InMemoryArchive::new();
        let new_publication = Publication::new(TransportLog::new(new_session));
        new_publication.offer(b"alpha").unwrap();
        let mut archiver = fixgw_replication::InMemoryArchiver::new(new_publication.subscription(), archive.reader(), 16);
        archiver.poll();

        let mut cluster_sub = ClusterSubscription::new(
            Publication::new(TransportLog::new(old_session)).subscription(),
            old_session,
        );
        cluster_sub.resync(new_publication.subscription(), new_session, &archive);
        assert_eq!(cluster_sub.session_id(), new_session);
        assert_eq!(cluster_sub.position(), LogPosition::new(5));
    }
}
