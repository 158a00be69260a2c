//! Dispatches a decoded wire frame to the right [`Session`] entry point.
//!
//! This is the seam between `fixgw-fix-codec`'s structural decoding and the
//! session state machine's semantic handling: everything here is routing,
//! no protocol decisions.

use fixgw_fix_codec::{decode, tag, DecodeError, Payload, SessionMessage};

use crate::auth::AuthenticationStrategy;
use crate::proxy::SessionProxy;
use crate::session::Session;

/// Stateless router from raw bytes to `Session` method calls.
pub struct SessionParser;

impl SessionParser {
    /// Decodes `raw` and drives `session` with the result.
    ///
    /// A structurally invalid frame with a recoverable `MsgSeqNum` is
    /// routed to `on_invalid_message` (a session-level Reject); one with no
    /// `MsgSeqNum` at all falls back through `on_message`'s own
    /// missing-sequence-number handling so the disconnect path is shared.
    pub fn handle<A: AuthenticationStrategy>(
        session: &mut Session<A>,
        raw: &[u8],
        now_ms: i64,
        proxy: &mut dyn SessionProxy,
    ) {
        match decode(raw) {
            Ok(message) => Self::dispatch(session, message, now_ms, proxy),
            Err(err) => Self::dispatch_decode_error(session, err, proxy),
        }
    }

    fn dispatch_decode_error<A: AuthenticationStrategy>(
        session: &mut Session<A>,
        err: DecodeError,
        proxy: &mut dyn SessionProxy,
    ) {
        match err.msg_seq_num {
            Some(seq) => session.on_invalid_message(
                seq,
                err.invalid_tag_id,
                err.msg_type.as_deref().unwrap_or(""),
                err.reason,
                proxy,
            ),
            None => session.on_message(None, "", None, None, 0, false, proxy),
        }
    }

    fn dispatch<A: AuthenticationStrategy>(
        session: &mut Session<A>,
        message: SessionMessage,
        now_ms: i64,
        proxy: &mut dyn SessionProxy,
    ) {
        let header = message.header;
        let is_poss_dup = header.is_poss_dup();

        session.on_begin_string(&header.begin_string, header.msg_type == tag::msg_type::LOGON, proxy);
        if session.state() == crate::session::SessionState::Disconnected {
            return;
        }

        match message.payload {
            Payload::Logon {
                heartbeat_interval_secs,
                username,
                password,
            } => session.on_logon(
                heartbeat_interval_secs,
                header.msg_seq_num,
                &header.begin_string,
                now_ms,
                header.sending_time,
                header.orig_sending_time,
                &header.sender_comp_id,
                &header.sender_sub_id,
                &header.target_comp_id,
                username.as_deref(),
                password.as_deref(),
                is_poss_dup,
                proxy,
            ),
            Payload::Logout => session.on_logout(
                header.msg_seq_num,
                header.sending_time,
                header.orig_sending_time,
                now_ms,
                is_poss_dup,
                proxy,
            ),
            Payload::Heartbeat { test_req_id } => session.on_heartbeat(
                header.msg_seq_num,
                test_req_id.as_deref(),
                header.sending_time,
                header.orig_sending_time,
                now_ms,
                is_poss_dup,
                proxy,
            ),
            Payload::TestRequest { test_req_id } => session.on_test_request(
                header.msg_seq_num,
                &test_req_id,
                header.sending_time,
                header.orig_sending_time,
                now_ms,
                is_poss_dup,
                proxy,
            ),
            Payload::Reject { .. } => session.on_reject(
                header.msg_seq_num,
                header.sending_time,
                header.orig_sending_time,
                now_ms,
                is_poss_dup,
                proxy,
            ),
            Payload::SequenceReset {
                new_seq_no,
                gap_fill_flag,
            } => session.on_sequence_reset(header.msg_seq_num, new_seq_no, gap_fill_flag, is_poss_dup, now_ms, proxy),
            Payload::ResendRequest {
                begin_seq_no,
                end_seq_no,
            } => session.on_resend_request(begin_seq_no, end_seq_no, proxy),
            Payload::Business => session.on_message(
                header.msg_seq_num,
                &header.msg_type,
                header.sending_time,
                header.orig_sending_time,
                now_ms,
                is_poss_dup,
                proxy,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AcceptAllAuthenticator;
    use crate::proxy::{ProxyEvent, RecordingProxy};
    use crate::session::{SessionConfig, SessionState};
    use fixgw_fix_codec::builder;
    use fixgw_types::{ConnectionId, SessionId};

    fn new_session() -> Session<AcceptAllAuthenticator> {
        Session::new_acceptor(
            SessionId::new(1),
            ConnectionId::new(1),
            SessionConfig {
                begin_string: "FIX.4.4".into(),
                sending_time_window_ms: 120_000,
                default_heartbeat_interval_secs: 30,
            },
            AcceptAllAuthenticator,
        )
    }

    #[test]
    fn routes_logon_frame_to_active_state() {
        let mut session = new_session();
        let mut proxy = RecordingProxy::new();
        let raw = builder::logon("FIX.4.4", "PEER", "", "GATEWAY", 1, 30, None, None);

        SessionParser::handle(&mut session, &raw, 0, &mut proxy);

        assert_eq!(session.state(), SessionState::Active);
        assert!(matches!(proxy.last(), Some(ProxyEvent::LogonAccepted { .. })));
    }

    #[test]
    fn routes_garbage_bytes_to_disconnect() {
        let mut session = new_session();
        let mut proxy = RecordingProxy::new();

        SessionParser::handle(&mut session, b"not a fix message", 0, &mut proxy);

        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn routes_heartbeat_after_logon() {
        let mut session = new_session();
        let mut proxy = RecordingProxy::new();
        let raw = builder::logon("FIX.4.4", "PEER", "", "GATEWAY", 1, 30, None, None);
        SessionParser::handle(&mut session, &raw, 0, &mut proxy);

        let raw = builder::heartbeat("FIX.4.4", "PEER", "", "GATEWAY", 2, None);
        SessionParser::handle(&mut session, &raw, 1_000, &mut proxy);

        assert_eq!(session.last_received_seq_num(), fixgw_types::SeqNum::new(2));
    }
}
