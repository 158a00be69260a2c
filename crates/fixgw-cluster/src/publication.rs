//! Writer-side facade: a claim only succeeds while the local node is the
//! current leader.

use fixgw_transport::{BufferClaim, Publication};
use fixgw_types::{LogPosition, SessionId};

use crate::error::{ClusterError, Result};

/// Wraps a data-stream [`Publication`] and refuses every claim unless the
/// caller can show the local node currently holds leadership.
///
/// Leadership isn't tracked here — the role engine owns that single-writer
/// state — so every call takes the leader session id the caller most
/// recently observed (typically `RoleEngine::term_state().leader_session_id`).
pub struct ClusterPublication {
    publication: Publication,
    own_session_id: SessionId,
}

impl ClusterPublication {
    pub fn new(publication: Publication, own_session_id: SessionId) -> Self {
        Self {
            publication,
            own_session_id,
        }
    }

    pub fn own_session_id(&self) -> SessionId {
        self.own_session_id
    }

    fn require_leadership(&self, current_leader_session_id: Option<SessionId>) -> Result<()> {
        if current_leader_session_id == Some(self.own_session_id) {
            Ok(())
        } else {
            Err(ClusterError::NotLeader)
        }
    }

    /// Reserves `len` bytes on the data stream. Fails with
    /// [`ClusterError::NotLeader`] unless `current_leader_session_id`
    /// names this node.
    pub fn try_claim(&self, len: usize, current_leader_session_id: Option<SessionId>) -> Result<BufferClaim<'_>> {
        self.require_leadership(current_leader_session_id)?;
        self.publication
            .try_claim(len)
            .map_err(|_| ClusterError::NotLeader)
    }

    /// Convenience wrapper for callers that already have a complete
    /// fragment in hand.
    pub fn offer(&self, bytes: &[u8], current_leader_session_id: Option<SessionId>) -> Result<LogPosition> {
        self.require_leadership(current_leader_session_id)?;
        self.publication.offer(bytes).map_err(|_| ClusterError::NotLeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixgw_transport::TransportLog;

    #[test]
    fn claim_rejected_when_not_leader() {
        let own = SessionId::new(1);
        let publication = ClusterPublication::new(Publication::new(TransportLog::new(own)), own);
        assert_eq!(publication.offer(b"hi", Some(SessionId::new(2))), Err(ClusterError::NotLeader));
        assert_eq!(publication.offer(b"hi", None), Err(ClusterError::NotLeader));
    }

    #[test]
    fn claim_accepted_while_leader() {
        let own = SessionId::new(1);
        let publication = ClusterPublication::new(Publication::new(TransportLog::new(own)), own);
        let position = publication.offer(b"hi", Some(own)).unwrap();
        assert_eq!(position, LogPosition::ZERO);
    }
}
