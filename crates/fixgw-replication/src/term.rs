//! Shared term state for the replication role engine.

use fixgw_types::{LeadershipTermId, LogPosition, NodeId, SessionId};

/// Single-writer state owned by whichever role is currently active.
/// Role transitions hand off ownership atomically: the old role consumes
/// `self`, the new role is built from its fields, at the end of one `poll`.
#[derive(Debug, Clone)]
pub struct TermState {
    pub own_node_id: NodeId,
    pub leadership_term_id: LeadershipTermId,
    pub leader_session_id: Option<SessionId>,
    /// Highest contiguous log position known locally: the leader's own
    /// append position, or the highest position a follower has received
    /// from the leader's data publication.
    pub position: LogPosition,
    pub commit_position: LogPosition,
}

impl TermState {
    pub fn new(own_node_id: NodeId) -> Self {
        Self {
            own_node_id,
            leadership_term_id: LeadershipTermId::new(0),
            leader_session_id: None,
            position: LogPosition::ZERO,
            commit_position: LogPosition::ZERO,
        }
    }

    /// Advances the commit watermark, but only forward — a stale or
    /// regressed acknowledgement can never move it backward.
    pub fn advance_commit(&mut self, candidate: LogPosition) {
        if candidate > self.commit_position {
            self.commit_position = candidate;
        }
    }

    /// Advances the locally-known log position, only forward. `commit_position`
    /// must never exceed this.
    pub fn advance_position(&mut self, candidate: LogPosition) {
        if candidate > self.position {
            self.position = candidate;
        }
    }
}

#[cfg(test)]
mod term_invariants {
    use super::*;

    #[test]
    fn advance_position_never_regresses() {
        let mut term = TermState::new(NodeId::new(0));
        term.advance_position(LogPosition::new(100));
        term.advance_position(LogPosition::new(40));
        assert_eq!(term.position, LogPosition::new(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_commit_never_regresses() {
        let mut term = TermState::new(NodeId::new(0));
        term.advance_commit(LogPosition::new(100));
        term.advance_commit(LogPosition::new(50));
        assert_eq!(term.commit_position, LogPosition::new(100));
    }
}
