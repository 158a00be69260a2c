//! `SessionProxy`: the outbound sink the session state machine drives.
//!
//! The state machine never serializes bytes or touches a socket itself —
//! it calls one of these methods, in the exact order its inbound triggers
//! arrived, and something downstream (a real wire encoder in `fixgw-node`,
//! or a `RecordingProxy` in tests) decides what to do with the call. This
//! is a narrow, behaviour-only capability injected at construction, in the
//! same vein as the strategy-injection pattern used elsewhere in this
//! workspace.

use fixgw_types::{ConnectionId, SeqNum};

use fixgw_fix_codec::SessionRejectReason;

/// Outbound operations the session state machine can request.
pub trait SessionProxy {
    /// Acceptor-side Logon reply, sent once authentication and
    /// `begin_string` validation both succeed.
    fn logon_accepted(&mut self, seq: SeqNum, heartbeat_interval_secs: i32);

    /// Plain Logout, sent when we initiate or acknowledge a graceful
    /// session close.
    fn logout(&mut self, seq: SeqNum);

    /// Logout sent because the peer's `MsgSeqNum` was below what we
    /// expected and the message was not a possible duplicate.
    fn low_sequence_number_logout(&mut self, ref_seq_num: SeqNum, expected: SeqNum, received: SeqNum);

    /// Disconnect (without a Logout) because `begin_string` didn't match,
    /// discovered during the very first Logon.
    fn incorrect_begin_string_logout(&mut self);

    /// Logout sent because the peer's Logon carried a negative heartbeat
    /// interval.
    fn negative_heartbeat_logout(&mut self);

    /// Session-level Reject (MsgType 3).
    fn reject(
        &mut self,
        ref_seq_num: SeqNum,
        ref_tag_id: Option<u32>,
        msg_type: &str,
        reject_reason: SessionRejectReason,
    );

    /// Heartbeat, optionally in reply to a `TestRequest` (`test_req_id`
    /// echoes the requester's `TestReqID`).
    fn heartbeat(&mut self, test_req_id: Option<&str>, seq: SeqNum);

    /// TestRequest, either in reply to an inbound one at the protocol level
    /// or emitted by our own idle-connection timer.
    fn test_request(&mut self, seq: SeqNum, test_req_id: &str);

    /// SequenceReset (gap-fill or hard reset) we originate.
    fn sequence_reset(&mut self, msg_seq_num: SeqNum, new_seq_no: SeqNum, gap_fill_flag: bool);

    /// ResendRequest emitted on detecting an inbound sequence gap.
    /// `end_seq_no == 0` means "through infinity", per FIX convention.
    fn resend_request(&mut self, seq: SeqNum, begin_seq_no: SeqNum, end_seq_no: SeqNum);

    /// A message arrived with no `MsgSeqNum` at all.
    fn received_message_without_sequence_number(&mut self, seq: SeqNum);

    /// Requests the transport tear down this connection.
    fn request_disconnect(&mut self, connection_id: ConnectionId);

    /// Replays (or gap-fills) previously sent messages in response to an
    /// inbound `ResendRequest`.
    fn gap_fill(&mut self, begin_seq_no: SeqNum, end_seq_no: SeqNum);
}

/// Every call a [`SessionProxy`] received, in order. Used by tests to
/// assert on exactly what the state machine emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEvent {
    LogonAccepted {
        seq: SeqNum,
        heartbeat_interval_secs: i32,
    },
    Logout {
        seq: SeqNum,
    },
    LowSequenceNumberLogout {
        ref_seq_num: SeqNum,
        expected: SeqNum,
        received: SeqNum,
    },
    IncorrectBeginStringLogout,
    NegativeHeartbeatLogout,
    Reject {
        ref_seq_num: SeqNum,
        ref_tag_id: Option<u32>,
        msg_type: String,
        reject_reason: SessionRejectReason,
    },
    Heartbeat {
        test_req_id: Option<String>,
        seq: SeqNum,
    },
    TestRequest {
        seq: SeqNum,
        test_req_id: String,
    },
    SequenceReset {
        msg_seq_num: SeqNum,
        new_seq_no: SeqNum,
        gap_fill_flag: bool,
    },
    ResendRequest {
        seq: SeqNum,
        begin_seq_no: SeqNum,
        end_seq_no: SeqNum,
    },
    ReceivedMessageWithoutSequenceNumber {
        seq: SeqNum,
    },
    RequestDisconnect {
        connection_id: ConnectionId,
    },
    GapFill {
        begin_seq_no: SeqNum,
        end_seq_no: SeqNum,
    },
}

/// A [`SessionProxy`] that records every call for later assertion. The
/// workhorse of the session state machine's unit tests.
#[derive(Debug, Default)]
pub struct RecordingProxy {
    pub events: Vec<ProxyEvent>,
}

impl RecordingProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&ProxyEvent> {
        self.events.last()
    }
}

impl SessionProxy for RecordingProxy {
    fn logon_accepted(&mut self, seq: SeqNum, heartbeat_interval_secs: i32) {
        self.events.push(ProxyEvent::LogonAccepted {
            seq,
            heartbeat_interval_secs,
        });
    }

    fn logout(&mut self, seq: SeqNum) {
        self.events.push(ProxyEvent::Logout { seq });
    }

    fn low_sequence_number_logout(&mut self, ref_seq_num: SeqNum, expected: SeqNum, received: SeqNum) {
        self.events.push(ProxyEvent::LowSequenceNumberLogout {
            ref_seq_num,
            expected,
            received,
        });
    }

    fn incorrect_begin_string_logout(&mut self) {
        self.events.push(ProxyEvent::IncorrectBeginStringLogout);
    }

    fn negative_heartbeat_logout(&mut self) {
        self.events.push(ProxyEvent::NegativeHeartbeatLogout);
    }

    fn reject(
        &mut self,
        ref_seq_num: SeqNum,
        ref_tag_id: Option<u32>,
        msg_type: &str,
        reject_reason: SessionRejectReason,
    ) {
        self.events.push(ProxyEvent::Reject {
            ref_seq_num,
            ref_tag_id,
            msg_type: msg_type.to_string(),
            reject_reason,
        });
    }

    fn heartbeat(&mut self, test_req_id: Option<&str>, seq: SeqNum) {
        self.events.push(ProxyEvent::Heartbeat {
            test_req_id: test_req_id.map(str::to_string),
            seq,
        });
    }

    fn test_request(&mut self, seq: SeqNum, test_req_id: &str) {
        self.events.push(ProxyEvent::TestRequest {
            seq,
            test_req_id: test_req_id.to_string(),
        });
    }

    fn sequence_reset(&mut self, msg_seq_num: SeqNum, new_seq_no: SeqNum, gap_fill_flag: bool) {
        self.events.push(ProxyEvent::SequenceReset {
            msg_seq_num,
            new_seq_no,
            gap_fill_flag,
        });
    }

    fn resend_request(&mut self, seq: SeqNum, begin_seq_no: SeqNum, end_seq_no: SeqNum) {
        self.events.push(ProxyEvent::ResendRequest {
            seq,
            begin_seq_no,
            end_seq_no,
        });
    }

    fn received_message_without_sequence_number(&mut self, seq: SeqNum) {
        self.events
            .push(ProxyEvent::ReceivedMessageWithoutSequenceNumber { seq });
    }

    fn request_disconnect(&mut self, connection_id: ConnectionId) {
        self.events
            .push(ProxyEvent::RequestDisconnect { connection_id });
    }

    fn gap_fill(&mut self, begin_seq_no: SeqNum, end_seq_no: SeqNum) {
        self.events.push(ProxyEvent::GapFill {
            begin_seq_no,
            end_seq_no,
        });
    }
}
