//! Wire messages carried on the control and acknowledgement streams.
//!
//! The transport only moves opaque byte fragments; this module is the
//! encoding the role engine and the transport agree on for the handful of
//! message shapes the replication protocol needs.

use fixgw_types::{LeadershipTermId, LogPosition, NodeId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    RequestVote {
        term: LeadershipTermId,
        candidate_id: NodeId,
        last_position: LogPosition,
    },
    ReplyVote {
        term: LeadershipTermId,
        voter_id: NodeId,
        granted: bool,
    },
    ConsensusHeartbeat {
        term: LeadershipTermId,
        leader_node_id: NodeId,
        position: LogPosition,
        commit_position: LogPosition,
        session_id: SessionId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledge {
    pub term: LeadershipTermId,
    pub node_id: NodeId,
    pub position: LogPosition,
}

const REQUEST_VOTE_TAG: u8 = 1;
const REPLY_VOTE_TAG: u8 = 2;
const CONSENSUS_HEARTBEAT_TAG: u8 = 3;

impl ControlMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(34);
        match *self {
            ControlMessage::RequestVote {
                term,
                candidate_id,
                last_position,
            } => {
                buf.push(REQUEST_VOTE_TAG);
                buf.extend_from_slice(&term.value().to_be_bytes());
                buf.push(candidate_id.as_u8());
                buf.extend_from_slice(&last_position.value().to_be_bytes());
            }
            ControlMessage::ReplyVote { term, voter_id, granted } => {
                buf.push(REPLY_VOTE_TAG);
                buf.extend_from_slice(&term.value().to_be_bytes());
                buf.push(voter_id.as_u8());
                buf.push(u8::from(granted));
            }
            ControlMessage::ConsensusHeartbeat {
                term,
                leader_node_id,
                position,
                commit_position,
                session_id,
            } => {
                buf.push(CONSENSUS_HEARTBEAT_TAG);
                buf.extend_from_slice(&term.value().to_be_bytes());
                buf.push(leader_node_id.as_u8());
                buf.extend_from_slice(&position.value().to_be_bytes());
                buf.extend_from_slice(&commit_position.value().to_be_bytes());
                buf.extend_from_slice(&u64::from(session_id).to_be_bytes());
            }
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let (&tag, rest) = bytes.split_first()?;
        match tag {
            REQUEST_VOTE_TAG => {
                let term = LeadershipTermId::new(u64::from_be_bytes(rest.get(0..8)?.try_into().ok()?));
                let candidate_id = NodeId::new(*rest.get(8)?);
                let last_position = LogPosition::new(u64::from_be_bytes(rest.get(9..17)?.try_into().ok()?));
                Some(ControlMessage::RequestVote {
                    term,
                    candidate_id,
                    last_position,
                })
            }
            REPLY_VOTE_TAG => {
                let term = LeadershipTermId::new(u64::from_be_bytes(rest.get(0..8)?.try_into().ok()?));
                let voter_id = NodeId::new(*rest.get(8)?);
                let granted = *rest.get(9)? != 0;
                Some(ControlMessage::ReplyVote { term, voter_id, granted })
            }
            CONSENSUS_HEARTBEAT_TAG => {
                let term = LeadershipTermId::new(u64::from_be_bytes(rest.get(0..8)?.try_into().ok()?));
                let leader_node_id = NodeId::new(*rest.get(8)?);
                let position = LogPosition::new(u64::from_be_bytes(rest.get(9..17)?.try_into().ok()?));
                let commit_position = LogPosition::new(u64::from_be_bytes(rest.get(17..25)?.try_into().ok()?));
                let session_id = SessionId::from(u64::from_be_bytes(rest.get(25..33)?.try_into().ok()?));
                Some(ControlMessage::ConsensusHeartbeat {
                    term,
                    leader_node_id,
                    position,
                    commit_position,
                    session_id,
                })
            }
            _ => None,
        }
    }
}

impl Acknowledge {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(17);
        buf.extend_from_slice(&self.term.value().to_be_bytes());
        buf.push(self.node_id.as_u8());
        buf.extend_from_slice(&self.position.value().to_be_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let term = LeadershipTermId::new(u64::from_be_bytes(bytes.get(0..8)?.try_into().ok()?));
        let node_id = NodeId::new(*bytes.get(8)?);
        let position = LogPosition::new(u64::from_be_bytes(bytes.get(9..17)?.try_into().ok()?));
        Some(Acknowledge { term, node_id, position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consensus_heartbeat_round_trips() {
        let message = ControlMessage::ConsensusHeartbeat {
            term: LeadershipTermId::new(4),
            leader_node_id: NodeId::new(2),
            position: LogPosition::new(1024),
            commit_position: LogPosition::new(900),
            session_id: SessionId::new(7),
        };
        let decoded = ControlMessage::decode(&message.encode()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn acknowledge_round_trips() {
        let ack = Acknowledge {
            term: LeadershipTermId::new(1),
            node_id: NodeId::new(3),
            position: LogPosition::new(55),
        };
        assert_eq!(Acknowledge::decode(&ack.encode()).unwrap(), ack);
    }

    #[test]
    fn decode_rejects_truncated_input() {
        assert!(ControlMessage::decode(&[REQUEST_VOTE_TAG, 0, 0]).is_none());
        assert!(ControlMessage::decode(&[]).is_none());
    }
}
