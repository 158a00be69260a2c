//! Typed payloads for the fixed set of session-layer messages the session
//! state machine interprets directly.

use crate::header::Header;

/// A decoded session-layer message: the common [`Header`] plus a
/// message-type-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub header: Header,
    pub payload: Payload,
}

/// The message-type-specific fields the session state machine needs.
///
/// `Business` covers every `msg_type` the session layer doesn't itself
/// interpret; it is routed to `Session::on_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Logon {
        heartbeat_interval_secs: i32,
        username: Option<String>,
        password: Option<String>,
    },
    Logout,
    Heartbeat {
        test_req_id: Option<String>,
    },
    TestRequest {
        test_req_id: String,
    },
    Reject {
        ref_seq_num: u64,
        ref_tag_id: Option<u32>,
        ref_msg_type: Option<String>,
        reason_code: Option<u32>,
        text: Option<String>,
    },
    SequenceReset {
        new_seq_no: u64,
        gap_fill_flag: bool,
    },
    ResendRequest {
        begin_seq_no: u64,
        end_seq_no: u64,
    },
    Business,
}
