//! Follower / Candidate / Leader role engine sharing one [`TermState`].
//!
//! Each role is a pure `(self, input) -> (self, output)` transition over
//! its own state plus the shared `TermState`; the engine around it is the
//! only place that touches the transport. This keeps the election and
//! commit logic unit-testable without a real publication/subscription.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fixgw_types::{LeadershipTermId, LogPosition, NodeId, SessionId};

use crate::strategy::AcknowledgementStrategy;
use crate::term::TermState;

/// `[TIMEOUT, MAX_TO_MIN_TIMEOUT * TIMEOUT)`, uniformly distributed.
pub const MAX_TO_MIN_TIMEOUT_RATIO: u32 = 3;

/// A follower's periodic `Acknowledge` cadence is a fraction of the base
/// election timeout, so it always fires well before even the shortest
/// possible randomised election deadline.
const FOLLOWER_ACK_INTERVAL_DIVISOR: i64 = 4;

fn randomized_timeout(rng: &mut ChaCha8Rng, base_timeout_ms: i64) -> i64 {
    let span = base_timeout_ms * i64::from(MAX_TO_MIN_TIMEOUT_RATIO - 1);
    base_timeout_ms + rng.gen_range(0..=span.max(0))
}

fn ack_interval_ms(base_timeout_ms: i64) -> i64 {
    (base_timeout_ms / FOLLOWER_ACK_INTERVAL_DIVISOR).max(1)
}

/// Events the role engine reacts to. Produced by the engine's transport
/// polling, kept separate from the role logic so the logic stays pure.
#[derive(Debug, Clone)]
pub enum RoleEvent {
    Tick { now_ms: i64 },
    DataOrHeartbeatReceived { now_ms: i64, position: LogPosition },
    ConsensusHeartbeat {
        now_ms: i64,
        term: LeadershipTermId,
        leader_node_id: NodeId,
        session_id: SessionId,
        position: LogPosition,
        commit_position: LogPosition,
    },
    RequestVote {
        now_ms: i64,
        term: LeadershipTermId,
        candidate_id: NodeId,
        last_position: LogPosition,
    },
    ReplyVote {
        now_ms: i64,
        term: LeadershipTermId,
        voter_id: NodeId,
        granted: bool,
    },
    Acknowledge {
        node_id: NodeId,
        position: LogPosition,
    },
    DataSent { position: LogPosition },
}

/// Effects the engine must carry out against the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOutput {
    BroadcastRequestVote {
        term: LeadershipTermId,
        candidate_id: NodeId,
        last_position: LogPosition,
    },
    SendReplyVote {
        to: NodeId,
        term: LeadershipTermId,
        granted: bool,
    },
    BroadcastConsensusHeartbeat {
        term: LeadershipTermId,
        position: LogPosition,
        commit_position: LogPosition,
        session_id: SessionId,
    },
    PublishAcknowledge {
        term: LeadershipTermId,
        position: LogPosition,
    },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleKind {
    Follower,
    Candidate,
    Leader,
}

struct FollowerData {
    deadline_ms: i64,
    next_ack_ms: i64,
}

struct CandidateData {
    votes: BTreeMap<NodeId, bool>,
    deadline_ms: i64,
}

struct LeaderData {
    positions: BTreeMap<NodeId, LogPosition>,
    next_heartbeat_ms: i64,
    sent_data_since_heartbeat_slot: bool,
}

/// Owns [`TermState`] plus the state of whichever role is currently
/// active. The FCIS transitions live on the private `*Data` structs;
/// this type is the imperative shell that owns the PRNG and dispatches.
pub struct RoleEngine {
    term: TermState,
    kind: RoleKind,
    follower: Option<FollowerData>,
    candidate: Option<CandidateData>,
    leader: Option<LeaderData>,
    rng: ChaCha8Rng,
    base_timeout_ms: i64,
    cluster_size: usize,
    strategy: Box<dyn AcknowledgementStrategy>,
}

impl RoleEngine {
    pub fn new_follower(
        own_node_id: NodeId,
        now_ms: i64,
        base_timeout_ms: i64,
        cluster_size: usize,
        strategy: Box<dyn AcknowledgementStrategy>,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(own_node_id.as_u8()));
        let deadline_ms = now_ms + randomized_timeout(&mut rng, base_timeout_ms);
        Self {
            term: TermState::new(own_node_id),
            kind: RoleKind::Follower,
            follower: Some(FollowerData {
                deadline_ms,
                next_ack_ms: now_ms + ack_interval_ms(base_timeout_ms),
            }),
            candidate: None,
            leader: None,
            rng,
            base_timeout_ms,
            cluster_size,
            strategy,
        }
    }

    pub fn term_state(&self) -> &TermState {
        &self.term
    }

    pub fn is_leader(&self) -> bool {
        self.kind == RoleKind::Leader
    }

    pub fn commit_position(&self) -> LogPosition {
        self.term.commit_position
    }

    fn become_follower(&mut self, now_ms: i64) {
        let deadline_ms = now_ms + randomized_timeout(&mut self.rng, self.base_timeout_ms);
        self.kind = RoleKind::Follower;
        self.follower = Some(FollowerData {
            deadline_ms,
            next_ack_ms: now_ms + ack_interval_ms(self.base_timeout_ms),
        });
        self.candidate = None;
        self.leader = None;
    }

    fn become_candidate(&mut self, now_ms: i64) -> RoleOutput {
        self.term.leadership_term_id = self.term.leadership_term_id.next();
        self.term.leader_session_id = None;
        let deadline_ms = now_ms + randomized_timeout(&mut self.rng, self.base_timeout_ms);
        let mut votes = BTreeMap::new();
        votes.insert(self.term.own_node_id, true);
        self.kind = RoleKind::Candidate;
        self.candidate = Some(CandidateData { votes, deadline_ms });
        self.follower = None;
        self.leader = None;
        RoleOutput::BroadcastRequestVote {
            term: self.term.leadership_term_id,
            candidate_id: self.term.own_node_id,
            last_position: self.term.position,
        }
    }

    fn become_leader(&mut self, now_ms: i64, own_session_id: SessionId) -> RoleOutput {
        self.term.leader_session_id = Some(own_session_id);
        let mut positions = BTreeMap::new();
        positions.insert(self.term.own_node_id, self.term.position);
        self.kind = RoleKind::Leader;
        self.leader = Some(LeaderData {
            positions,
            next_heartbeat_ms: now_ms + self.base_timeout_ms,
            sent_data_since_heartbeat_slot: false,
        });
        self.candidate = None;
        self.follower = None;
        RoleOutput::BroadcastConsensusHeartbeat {
            term: self.term.leadership_term_id,
            position: self.term.position,
            commit_position: self.term.commit_position,
            session_id: own_session_id,
        }
    }

    /// Drives one event through the current role. Returns every effect the
    /// caller must carry out (usually zero or one).
    pub fn on_event(&mut self, event: RoleEvent, own_session_id: SessionId) -> Vec<RoleOutput> {
        match event {
            RoleEvent::Tick { now_ms } => self.on_tick(now_ms, own_session_id),
            RoleEvent::DataOrHeartbeatReceived { now_ms, position } => {
                self.term.advance_position(position);
                if let Some(follower) = &mut self.follower {
                    follower.deadline_ms = now_ms + randomized_timeout(&mut self.rng, self.base_timeout_ms);
                }
                vec![]
            }
            RoleEvent::ConsensusHeartbeat {
                now_ms,
                term,
                leader_node_id,
                session_id,
                position,
                commit_position,
                ..
            } => self.on_consensus_heartbeat(now_ms, term, leader_node_id, session_id, position, commit_position),
            RoleEvent::RequestVote {
                now_ms,
                term,
                candidate_id,
                last_position,
            } => vec![self.on_request_vote(now_ms, term, candidate_id, last_position)],
            RoleEvent::ReplyVote {
                now_ms,
                term,
                voter_id,
                granted,
            } => self.on_reply_vote(now_ms, term, voter_id, granted, own_session_id),
            RoleEvent::Acknowledge { node_id, position } => self.on_acknowledge(node_id, position),
            RoleEvent::DataSent { position } => {
                self.term.advance_position(position);
                if let Some(leader) = &mut self.leader {
                    leader.sent_data_since_heartbeat_slot = true;
                    leader.positions.insert(self.term.own_node_id, position);
                }
                vec![]
            }
        }
    }

    fn on_tick(&mut self, now_ms: i64, own_session_id: SessionId) -> Vec<RoleOutput> {
        match self.kind {
            RoleKind::Follower => {
                let expired = self.follower.as_ref().is_some_and(|f| now_ms >= f.deadline_ms);
                if expired {
                    return vec![self.become_candidate(now_ms)];
                }
                let Some(follower) = &mut self.follower else {
                    return vec![];
                };
                if now_ms >= follower.next_ack_ms {
                    follower.next_ack_ms = now_ms + ack_interval_ms(self.base_timeout_ms);
                    vec![RoleOutput::PublishAcknowledge {
                        term: self.term.leadership_term_id,
                        position: self.term.position,
                    }]
                } else {
                    vec![]
                }
            }
            RoleKind::Candidate => {
                let expired = self.candidate.as_ref().is_some_and(|c| now_ms >= c.deadline_ms);
                if expired {
                    vec![self.become_candidate(now_ms)]
                } else {
                    vec![]
                }
            }
            RoleKind::Leader => {
                let Some(leader) = &mut self.leader else { return vec![] };
                if now_ms >= leader.next_heartbeat_ms {
                    leader.next_heartbeat_ms = now_ms + self.base_timeout_ms;
                    if leader.sent_data_since_heartbeat_slot {
                        leader.sent_data_since_heartbeat_slot = false;
                        return vec![];
                    }
                    return vec![RoleOutput::BroadcastConsensusHeartbeat {
                        term: self.term.leadership_term_id,
                        position: self.term.position,
                        commit_position: self.term.commit_position,
                        session_id: own_session_id,
                    }];
                }
                vec![]
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn on_consensus_heartbeat(
        &mut self,
        now_ms: i64,
        term: LeadershipTermId,
        _leader_node_id: NodeId,
        session_id: SessionId,
        position: LogPosition,
        commit_position: LogPosition,
    ) -> Vec<RoleOutput> {
        if term < self.term.leadership_term_id {
            return vec![];
        }
        if term > self.term.leadership_term_id || self.kind != RoleKind::Follower {
            self.term.leadership_term_id = term;
            self.become_follower(now_ms);
        }
        self.term.leader_session_id = Some(session_id);
        self.term.advance_position(position);
        self.term.advance_commit(commit_position);
        if let Some(follower) = &mut self.follower {
            follower.deadline_ms = now_ms + randomized_timeout(&mut self.rng, self.base_timeout_ms);
        }
        vec![]
    }

    /// Grants a vote only if the candidate's log is at least as up to date
    /// as ours — the standard Raft-style election-safety check.
    fn on_request_vote(
        &mut self,
        now_ms: i64,
        term: LeadershipTermId,
        candidate_id: NodeId,
        last_position: LogPosition,
    ) -> RoleOutput {
        if term < self.term.leadership_term_id {
            return RoleOutput::SendReplyVote {
                to: candidate_id,
                term: self.term.leadership_term_id,
                granted: false,
            };
        }
        if term > self.term.leadership_term_id {
            self.term.leadership_term_id = term;
            self.become_follower(now_ms);
        }
        let granted = last_position >= self.term.position;
        RoleOutput::SendReplyVote {
            to: candidate_id,
            term: self.term.leadership_term_id,
            granted,
        }
    }

    fn on_reply_vote(
        &mut self,
        now_ms: i64,
        term: LeadershipTermId,
        voter_id: NodeId,
        granted: bool,
        own_session_id: SessionId,
    ) -> Vec<RoleOutput> {
        if self.kind != RoleKind::Candidate || term != self.term.leadership_term_id {
            return vec![];
        }
        let now_won = {
            let Some(candidate) = &mut self.candidate else {
                return vec![];
            };
            candidate.votes.insert(voter_id, granted);
            let grants = candidate.votes.values().filter(|g| **g).count();
            grants >= crate::strategy::quorum_size(self.cluster_size)
        };
        if now_won {
            vec![self.become_leader(now_ms, own_session_id)]
        } else {
            vec![]
        }
    }

    fn on_acknowledge(&mut self, node_id: NodeId, position: LogPosition) -> Vec<RoleOutput> {
        let Some(leader) = &mut self.leader else { return vec![] };
        leader.positions.insert(node_id, position);
        let positions: Vec<(NodeId, LogPosition)> = leader.positions.iter().map(|(&n, &p)| (n, p)).collect();
        if let Some(committed) = self.strategy.committed_position(&positions) {
            self.term.advance_commit(committed);
        }
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{EntireClusterAcknowledgementStrategy, MajorityAcknowledgementStrategy};

    fn engine(cluster_size: usize) -> RoleEngine {
        RoleEngine::new_follower(
            NodeId::new(0),
            0,
            1_000,
            cluster_size,
            Box::new(EntireClusterAcknowledgementStrategy::new(cluster_size)),
        )
    }

    #[test]
    fn follower_becomes_candidate_after_timeout() {
        let mut engine = engine(3);
        let outputs = engine.on_event(RoleEvent::Tick { now_ms: 10_000 }, SessionId::new(1));
        assert!(matches!(outputs[0], RoleOutput::BroadcastRequestVote { .. }));
        assert_eq!(engine.term_state().leadership_term_id, LeadershipTermId::new(1));
    }

    #[test]
    fn candidate_becomes_leader_on_majority_votes() {
        // Cluster of 5: quorum is 3 (self-vote + 2 external grants).
        let mut engine = RoleEngine::new_follower(
            NodeId::new(0),
            0,
            1_000,
            5,
            Box::new(MajorityAcknowledgementStrategy::new(5)),
        );
        engine.on_event(RoleEvent::Tick { now_ms: 10_000 }, SessionId::new(1));
        let term = engine.term_state().leadership_term_id;

        let outputs = engine.on_event(
            RoleEvent::ReplyVote {
                now_ms: 10_000,
                term,
                voter_id: NodeId::new(1),
                granted: true,
            },
            SessionId::new(1),
        );
        assert!(outputs.is_empty(), "one more vote needed for quorum of 3");

        let outputs = engine.on_event(
            RoleEvent::ReplyVote {
                now_ms: 10_000,
                term,
                voter_id: NodeId::new(2),
                granted: true,
            },
            SessionId::new(1),
        );
        assert!(matches!(outputs[0], RoleOutput::BroadcastConsensusHeartbeat { .. }));
        assert!(engine.is_leader());
    }

    #[test]
    fn leader_steps_down_on_higher_term_heartbeat() {
        let mut engine = RoleEngine::new_follower(
            NodeId::new(0),
            0,
            1_000,
            3,
            Box::new(EntireClusterAcknowledgementStrategy::new(3)),
        );
        engine.on_event(RoleEvent::Tick { now_ms: 10_000 }, SessionId::new(1));
        engine.on_event(
            RoleEvent::ReplyVote {
                now_ms: 10_000,
                term: engine.term_state().leadership_term_id,
                voter_id: NodeId::new(1),
                granted: true,
            },
            SessionId::new(1),
        );
        assert!(engine.is_leader());

        engine.on_event(
            RoleEvent::ConsensusHeartbeat {
                now_ms: 11_000,
                term: engine.term_state().leadership_term_id.next(),
                leader_node_id: NodeId::new(2),
                session_id: SessionId::new(9),
                position: LogPosition::new(5),
                commit_position: LogPosition::new(5),
            },
            SessionId::new(1),
        );
        assert!(!engine.is_leader());
    }

    #[test]
    fn commit_position_never_regresses_on_stale_acknowledge() {
        let mut engine = engine(1);
        engine.on_event(RoleEvent::Tick { now_ms: 10_000 }, SessionId::new(1));
        engine.on_event(
            RoleEvent::ReplyVote {
                now_ms: 10_000,
                term: engine.term_state().leadership_term_id,
                voter_id: NodeId::new(0),
                granted: true,
            },
            SessionId::new(1),
        );
        engine.on_event(
            RoleEvent::Acknowledge {
                node_id: NodeId::new(0),
                position: LogPosition::new(100),
            },
            SessionId::new(1),
        );
        assert_eq!(engine.commit_position(), LogPosition::new(100));
        // A lower re-report (e.g. the follower re-following from an
        // earlier point after losing a fragment) must not roll the
        // committed watermark backward.
        engine.on_event(
            RoleEvent::Acknowledge {
                node_id: NodeId::new(0),
                position: LogPosition::new(10),
            },
            SessionId::new(1),
        );
        assert_eq!(engine.commit_position(), LogPosition::new(100));
    }

    /// A follower periodically publishes `Acknowledge` even with no other
    /// traffic, driven purely by `on_tick`.
    #[test]
    fn follower_publishes_acknowledge_on_tick() {
        let mut follower = engine(3);
        follower.on_event(
            RoleEvent::DataOrHeartbeatReceived {
                now_ms: 0,
                position: LogPosition::new(42),
            },
            SessionId::new(1),
        );

        // 999ms: past the 250ms ack interval but strictly before the
        // earliest possible randomised election deadline (1_000ms).
        let outputs = follower.on_event(RoleEvent::Tick { now_ms: 999 }, SessionId::new(1));
        assert!(matches!(
            outputs.as_slice(),
            [RoleOutput::PublishAcknowledge { position, .. }] if *position == LogPosition::new(42)
        ));
    }

    /// Scenario 5 (`spec.md` §8): a three-node cluster's leader must not
    /// commit a fragment until every follower has acknowledged it, and
    /// commits as soon as the last one does.
    #[test]
    fn scenario_replication_quorum_commit() {
        let mut leader = RoleEngine::new_follower(
            NodeId::new(0),
            0,
            1_000,
            3,
            Box::new(EntireClusterAcknowledgementStrategy::new(3)),
        );
        leader.on_event(RoleEvent::Tick { now_ms: 10_000 }, SessionId::new(1));
        let term = leader.term_state().leadership_term_id;
        leader.on_event(
            RoleEvent::ReplyVote {
                now_ms: 10_000,
                term,
                voter_id: NodeId::new(1),
                granted: true,
            },
            SessionId::new(1),
        );
        assert!(leader.is_leader());

        let fragment_position = LogPosition::new(64);
        leader.on_event(
            RoleEvent::DataSent {
                position: fragment_position,
            },
            SessionId::new(1),
        );

        // Only F1 (node 1) has polled and acknowledged so far.
        leader.on_event(
            RoleEvent::Acknowledge {
                node_id: NodeId::new(1),
                position: fragment_position,
            },
            SessionId::new(1),
        );
        assert_eq!(
            leader.commit_position(),
            LogPosition::ZERO,
            "must not commit with only one of two followers acknowledged"
        );

        // F2 (node 2) now polls and acknowledges too; the cluster is complete.
        leader.on_event(
            RoleEvent::Acknowledge {
                node_id: NodeId::new(2),
                position: fragment_position,
            },
            SessionId::new(1),
        );
        assert_eq!(leader.commit_position(), fragment_position);
    }

    /// Scenario 6 (`spec.md` §8): both followers time out on a silent
    /// leader, become candidates, and the election converges to one leader
    /// with the term advanced on every participant.
    #[test]
    fn scenario_leader_timeout_then_election() {
        let mut node1 = RoleEngine::new_follower(
            NodeId::new(1),
            0,
            1_000,
            3,
            Box::new(EntireClusterAcknowledgementStrategy::new(3)),
        );
        let mut node2 = RoleEngine::new_follower(
            NodeId::new(2),
            0,
            1_000,
            3,
            Box::new(EntireClusterAcknowledgementStrategy::new(3)),
        );
        let term_before = node1.term_state().leadership_term_id;
        assert_eq!(node2.term_state().leadership_term_id, term_before);

        let elapsed = 1_000 * i64::from(MAX_TO_MIN_TIMEOUT_RATIO) + 1;
        let outputs1 = node1.on_event(RoleEvent::Tick { now_ms: elapsed }, SessionId::new(11));
        assert!(matches!(outputs1[0], RoleOutput::BroadcastRequestVote { .. }));
        let outputs2 = node2.on_event(RoleEvent::Tick { now_ms: elapsed }, SessionId::new(12));
        assert!(matches!(outputs2[0], RoleOutput::BroadcastRequestVote { .. }));

        // Node 2 grants node 1's vote request; node 1 never sees node 2's,
        // so only node 1 reaches quorum and becomes leader.
        let node1_term = node1.term_state().leadership_term_id;
        let reply = node2.on_event(
            RoleEvent::RequestVote {
                now_ms: elapsed,
                term: node1_term,
                candidate_id: NodeId::new(1),
                last_position: node1.term_state().position,
            },
            SessionId::new(12),
        );
        let RoleOutput::SendReplyVote { granted, .. } = reply[0] else {
            panic!("expected SendReplyVote, got {reply:?}");
        };
        assert!(granted);

        node1.on_event(
            RoleEvent::ReplyVote {
                now_ms: elapsed,
                term: node1_term,
                voter_id: NodeId::new(2),
                granted: true,
            },
            SessionId::new(11),
        );

        assert!(node1.is_leader(), "node 1 reached quorum and should be leader");
        assert!(!node2.is_leader());
        assert!(node1.term_state().leadership_term_id > term_before);
        assert!(node2.term_state().leadership_term_id > term_before);
    }
}
