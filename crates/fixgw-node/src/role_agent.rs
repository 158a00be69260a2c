//! Adapts one [`RoleEngine`] into an [`Agent`]: drains the control and
//! acknowledgement subscriptions into role events, ticks the election/
//! heartbeat clock, and encodes every effect back onto the matching
//! publication.

use fixgw_replication::{Acknowledge, ControlMessage, RoleEngine, RoleEvent, RoleOutput};
use fixgw_transport::{Publication, Subscription};
use fixgw_types::SessionId;

use crate::agent::Agent;

const FRAGMENT_LIMIT: usize = 64;

/// One node's role engine plus the three streams §6 names: control
/// (`RequestVote`/`ReplyVote`/`ConsensusHeartbeat`), acknowledgement
/// (follower → leader), and the data publication it holds the right to
/// write to while leader.
pub struct RoleAgent {
    engine: RoleEngine,
    own_session_id: SessionId,
    control_out: Publication,
    control_in: Subscription,
    ack_out: Publication,
    ack_in: Subscription,
}

impl RoleAgent {
    pub fn new(
        engine: RoleEngine,
        own_session_id: SessionId,
        control_out: Publication,
        control_in: Subscription,
        ack_out: Publication,
        ack_in: Subscription,
    ) -> Self {
        Self {
            engine,
            own_session_id,
            control_out,
            control_in,
            ack_out,
            ack_in,
        }
    }

    pub fn engine(&self) -> &RoleEngine {
        &self.engine
    }

    fn apply_output(&mut self, output: RoleOutput) {
        match output {
            RoleOutput::BroadcastRequestVote {
                term,
                candidate_id,
                last_position,
            } => {
                let message = ControlMessage::RequestVote {
                    term,
                    candidate_id,
                    last_position,
                };
                let _ = self.control_out.offer(&message.encode());
            }
            RoleOutput::SendReplyVote { term, granted, .. } => {
                let message = ControlMessage::ReplyVote {
                    term,
                    voter_id: self.engine.term_state().own_node_id,
                    granted,
                };
                let _ = self.control_out.offer(&message.encode());
            }
            RoleOutput::BroadcastConsensusHeartbeat {
                term,
                position,
                commit_position,
                session_id,
            } => {
                let message = ControlMessage::ConsensusHeartbeat {
                    term,
                    leader_node_id: self.engine.term_state().own_node_id,
                    position,
                    commit_position,
                    session_id,
                };
                let _ = self.control_out.offer(&message.encode());
            }
            RoleOutput::PublishAcknowledge { term, position } => {
                let message = Acknowledge {
                    term,
                    node_id: self.engine.term_state().own_node_id,
                    position,
                };
                let _ = self.ack_out.offer(&message.encode());
            }
            RoleOutput::None => {}
        }
    }

    fn apply_all(&mut self, outputs: Vec<RoleOutput>) {
        for output in outputs {
            self.apply_output(output);
        }
    }
}

impl Agent for RoleAgent {
    fn name(&self) -> &str {
        "role"
    }

    fn poll(&mut self, now_ms: i64) -> usize {
        let mut work = 0;

        let mut control_frames: Vec<Vec<u8>> = Vec::new();
        work += self
            .control_in
            .poll(&mut |_sid, _pos, data: &[u8]| control_frames.push(data.to_vec()), FRAGMENT_LIMIT);
        for raw in control_frames {
            let Some(message) = ControlMessage::decode(&raw) else {
                continue;
            };
            let event = match message {
                ControlMessage::RequestVote {
                    term,
                    candidate_id,
                    last_position,
                } => RoleEvent::RequestVote {
                    now_ms,
                    term,
                    candidate_id,
                    last_position,
                },
                ControlMessage::ReplyVote { term, voter_id, granted } => RoleEvent::ReplyVote {
                    now_ms,
                    term,
                    voter_id,
                    granted,
                },
                ControlMessage::ConsensusHeartbeat {
                    term,
                    leader_node_id,
                    position,
                    commit_position,
                    session_id,
                } => RoleEvent::ConsensusHeartbeat {
                    now_ms,
                    term,
                    leader_node_id,
                    session_id,
                    position,
                    commit_position,
                },
            };
            let outputs = self.engine.on_event(event, self.own_session_id);
            self.apply_all(outputs);
        }

        let mut ack_frames: Vec<Vec<u8>> = Vec::new();
        work += self
            .ack_in
            .poll(&mut |_sid, _pos, data: &[u8]| ack_frames.push(data.to_vec()), FRAGMENT_LIMIT);
        for raw in ack_frames {
            let Some(ack) = Acknowledge::decode(&raw) else { continue };
            let outputs = self.engine.on_event(
                RoleEvent::Acknowledge {
                    node_id: ack.node_id,
                    position: ack.position,
                },
                self.own_session_id,
            );
            self.apply_all(outputs);
        }

        let outputs = self.engine.on_event(RoleEvent::Tick { now_ms }, self.own_session_id);
        if !outputs.is_empty() {
            work += 1;
        }
        self.apply_all(outputs);

        work
    }
}
