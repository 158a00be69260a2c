//! The per-connection FIX session state machine.

use fixgw_fix_codec::SessionRejectReason;
use fixgw_types::{ConnectionId, SeqNum, SessionId, SessionKey};

use crate::auth::AuthenticationStrategy;
use crate::error::SessionError;
use crate::proxy::SessionProxy;

/// TestReqID used for the idle-connection probe `poll` emits on timeout.
/// A constant rather than a generated id because nothing else ever needs
/// to correlate it — only the matching inbound Heartbeat's `TestReqID`
/// needs to compare equal to it.
pub const TIMEOUT_TEST_REQ_ID: &str = "TIMEOUT-CHECK";

/// Operational state of a FIX session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    SentLogon,
    Active,
    AwaitingResend,
    AwaitingLogout,
    Disconnected,
}

/// Configuration fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub begin_string: String,
    pub sending_time_window_ms: i64,
    pub default_heartbeat_interval_secs: i32,
}

/// One FIX session: state, sequence numbers, timers, and identity.
///
/// Every inbound trigger is a method call driven by the [`crate::parser::SessionParser`];
/// every outbound effect is a call on the injected [`SessionProxy`]. The
/// session itself never touches a socket or a clock source beyond the
/// `now_ms` passed into [`Session::poll`].
pub struct Session<A: AuthenticationStrategy> {
    pub session_id: SessionId,
    pub connection_id: ConnectionId,
    pub session_key: Option<SessionKey>,
    state: SessionState,
    config: SessionConfig,
    is_acceptor: bool,

    last_sent_seq_num: SeqNum,
    last_received_seq_num: SeqNum,
    heartbeat_interval_ms: i64,

    next_required_inbound_deadline: i64,
    next_heartbeat_deadline: i64,
    /// `Some(deadline)` once an idle-timeout `TestRequest` has been sent
    /// and we're waiting on its reply; cleared on matching Heartbeat or
    /// any accepted inbound message.
    awaiting_test_request_deadline: Option<i64>,

    seen_first_logon: bool,
    authenticator: A,
}

impl<A: AuthenticationStrategy> Session<A> {
    pub fn new_acceptor(
        session_id: SessionId,
        connection_id: ConnectionId,
        config: SessionConfig,
        authenticator: A,
    ) -> Self {
        Self {
            session_id,
            connection_id,
            session_key: None,
            state: SessionState::Connected,
            config,
            is_acceptor: true,
            last_sent_seq_num: SeqNum::NONE,
            last_received_seq_num: SeqNum::NONE,
            heartbeat_interval_ms: 0,
            next_required_inbound_deadline: 0,
            next_heartbeat_deadline: 0,
            awaiting_test_request_deadline: None,
            seen_first_logon: false,
            authenticator,
        }
    }

    pub fn new_initiator(
        session_id: SessionId,
        connection_id: ConnectionId,
        session_key: SessionKey,
        config: SessionConfig,
        authenticator: A,
    ) -> Self {
        Self {
            session_id,
            connection_id,
            session_key: Some(session_key),
            state: SessionState::Connected,
            config,
            is_acceptor: false,
            last_sent_seq_num: SeqNum::NONE,
            last_received_seq_num: SeqNum::NONE,
            heartbeat_interval_ms: 0,
            next_required_inbound_deadline: 0,
            next_heartbeat_deadline: 0,
            awaiting_test_request_deadline: None,
            seen_first_logon: false,
            authenticator,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_received_seq_num(&self) -> SeqNum {
        self.last_received_seq_num
    }

    /// The sequence number we'd accept next if a message arrived right
    /// now. Exposed because end-to-end tests assert on it directly
    /// (e.g. `expected_received_seq_num == 1` while `AWAITING_RESEND`).
    pub fn expected_received_seq_num(&self) -> SeqNum {
        self.last_received_seq_num.next()
    }

    fn next_outbound_seq(&mut self) -> SeqNum {
        self.last_sent_seq_num = self.last_sent_seq_num.next();
        self.last_sent_seq_num
    }

    fn disconnect(&mut self, proxy: &mut dyn SessionProxy) {
        self.state = SessionState::Disconnected;
        proxy.request_disconnect(self.connection_id);
    }

    // ------------------------------------------------------------------
    // Shared validation, applied in a fixed order for every inbound message
    // ------------------------------------------------------------------

    /// Rule 2: `begin_string` mismatch.
    fn check_begin_string(&mut self, begin_string: &str, proxy: &mut dyn SessionProxy) -> bool {
        if begin_string == self.config.begin_string {
            return true;
        }
        tracing::warn!(session = %self.session_id, expected = %self.config.begin_string, got = %begin_string, "{}", SessionError::InvalidBeginString);
        if !self.seen_first_logon {
            self.disconnect(proxy);
        } else {
            proxy.incorrect_begin_string_logout();
            self.disconnect(proxy);
        }
        false
    }

    /// Rules 3-5: sending-time window and PossDup/OrigSendingTime checks.
    /// Returns `Some(reject_reason)` if a session-level reject should be
    /// emitted instead of normal processing.
    fn check_timestamps(
        &self,
        now_ms: i64,
        sending_time: Option<i64>,
        orig_sending_time: Option<i64>,
        is_poss_dup: bool,
    ) -> Option<SessionRejectReason> {
        if let Some(sending_time) = sending_time {
            let window = self.config.sending_time_window_ms;
            if sending_time < now_ms - window || sending_time > now_ms + window {
                return Some(SessionRejectReason::SendingTimeAccuracyProblem);
            }
        }
        if is_poss_dup {
            match orig_sending_time {
                None => return Some(SessionRejectReason::RequiredTagMissing),
                Some(orig) => {
                    if let Some(sending_time) = sending_time {
                        if orig > sending_time {
                            return Some(SessionRejectReason::SendingTimeAccuracyProblem);
                        }
                    }
                }
            }
        }
        None
    }

    fn reset_inbound_deadline(&mut self, now_ms: i64) {
        self.next_required_inbound_deadline = now_ms;
        self.awaiting_test_request_deadline = None;
    }

    /// Sequence-number handling. Returns `true` if the message should
    /// continue to type-specific processing.
    fn handle_sequence_number(
        &mut self,
        msg_seq_num: SeqNum,
        is_poss_dup: bool,
        now_ms: i64,
        proxy: &mut dyn SessionProxy,
    ) -> bool {
        let expected = self.expected_received_seq_num();

        if self.state == SessionState::AwaitingResend {
            if msg_seq_num == expected {
                self.last_received_seq_num = msg_seq_num;
                self.reset_inbound_deadline(now_ms);
                self.state = SessionState::Active;
                return true;
            }
            if msg_seq_num < expected {
                if is_poss_dup {
                    return false;
                }
                self.emit_low_sequence_logout(msg_seq_num, expected, proxy);
                return false;
            }
            // Higher than expected while already resending: ignore rather
            // than queue, so a second gap never compounds the first.
            return false;
        }

        if msg_seq_num == expected {
            self.last_received_seq_num = msg_seq_num;
            self.reset_inbound_deadline(now_ms);
            return true;
        }

        if msg_seq_num < expected {
            if is_poss_dup {
                return false;
            }
            self.emit_low_sequence_logout(msg_seq_num, expected, proxy);
            return false;
        }

        // msg_seq_num > expected: gap detected.
        let seq = self.next_outbound_seq();
        proxy.resend_request(seq, expected, SeqNum::NONE);
        self.state = SessionState::AwaitingResend;
        false
    }

    fn emit_low_sequence_logout(&mut self, received: SeqNum, expected: SeqNum, proxy: &mut dyn SessionProxy) {
        tracing::warn!(session = %self.session_id, %expected, %received, "low sequence number");
        proxy.low_sequence_number_logout(received, expected, received);
        self.disconnect(proxy);
    }

    // ------------------------------------------------------------------
    // Inbound entry points
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn on_begin_string(&mut self, begin_string: &str, is_logon: bool, proxy: &mut dyn SessionProxy) {
        let _ = is_logon;
        self.check_begin_string(begin_string, proxy);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn on_logon(
        &mut self,
        heartbeat_interval_secs: i32,
        msg_seq_num: Option<u64>,
        begin_string: &str,
        now_ms: i64,
        sending_time: Option<i64>,
        orig_sending_time: Option<i64>,
        inbound_sender_comp_id: &str,
        inbound_sender_sub_id: &str,
        inbound_target_comp_id: &str,
        username: Option<&str>,
        password: Option<&str>,
        is_poss_dup: bool,
        proxy: &mut dyn SessionProxy,
    ) {
        let Some(msg_seq_num) = msg_seq_num else {
            proxy.received_message_without_sequence_number(self.last_sent_seq_num);
            self.disconnect(proxy);
            return;
        };
        let msg_seq_num = SeqNum::new(msg_seq_num);

        if !self.check_begin_string(begin_string, proxy) {
            return;
        }
        if let Some(reason) = self.check_timestamps(now_ms, sending_time, orig_sending_time, is_poss_dup) {
            proxy.reject(msg_seq_num, None, "A", reason);
            return;
        }
        if heartbeat_interval_secs < 0 {
            proxy.negative_heartbeat_logout();
            self.disconnect(proxy);
            return;
        }

        if self.is_acceptor {
            let key = SessionKey::from_inbound_header(
                inbound_sender_comp_id,
                inbound_sender_sub_id,
                inbound_target_comp_id,
            );
            if !self.authenticator.authenticate(&key, username, password) {
                tracing::info!(session = %self.session_id, "{}", SessionError::AuthenticationFailed);
                self.disconnect(proxy);
                return;
            }
            self.session_key = Some(key);
        }

        self.seen_first_logon = true;
        self.last_received_seq_num = msg_seq_num;
        self.heartbeat_interval_ms = i64::from(heartbeat_interval_secs) * 1000;
        self.next_heartbeat_deadline = now_ms + self.heartbeat_interval_ms;
        self.reset_inbound_deadline(now_ms);

        let seq = self.next_outbound_seq();
        proxy.logon_accepted(seq, heartbeat_interval_secs);
        self.state = SessionState::Active;
    }

    pub fn on_logout(
        &mut self,
        msg_seq_num: Option<u64>,
        sending_time: Option<i64>,
        orig_sending_time: Option<i64>,
        now_ms: i64,
        is_poss_dup: bool,
        proxy: &mut dyn SessionProxy,
    ) {
        let Some(msg_seq_num) = msg_seq_num else {
            proxy.received_message_without_sequence_number(self.last_sent_seq_num);
            self.disconnect(proxy);
            return;
        };
        let msg_seq_num = SeqNum::new(msg_seq_num);
        if let Some(reason) = self.check_timestamps(now_ms, sending_time, orig_sending_time, is_poss_dup) {
            proxy.reject(msg_seq_num, None, "5", reason);
            return;
        }
        if !self.handle_sequence_number(msg_seq_num, is_poss_dup, now_ms, proxy) {
            return;
        }

        match self.state {
            SessionState::AwaitingLogout => {
                self.disconnect(proxy);
            }
            _ => {
                let seq = self.next_outbound_seq();
                proxy.logout(seq);
                self.disconnect(proxy);
            }
        }
    }

    pub fn on_heartbeat(
        &mut self,
        msg_seq_num: Option<u64>,
        test_req_id: Option<&str>,
        sending_time: Option<i64>,
        orig_sending_time: Option<i64>,
        now_ms: i64,
        is_poss_dup: bool,
        proxy: &mut dyn SessionProxy,
    ) {
        let Some(msg_seq_num) = msg_seq_num else {
            proxy.received_message_without_sequence_number(self.last_sent_seq_num);
            self.disconnect(proxy);
            return;
        };
        let msg_seq_num = SeqNum::new(msg_seq_num);
        if let Some(reason) = self.check_timestamps(now_ms, sending_time, orig_sending_time, is_poss_dup) {
            proxy.reject(msg_seq_num, None, "0", reason);
            return;
        }
        if !self.handle_sequence_number(msg_seq_num, is_poss_dup, now_ms, proxy) {
            return;
        }

        if let (Some(reply_id), Some(pending)) = (test_req_id, self.awaiting_test_request_deadline) {
            let _ = pending;
            if reply_id == TIMEOUT_TEST_REQ_ID {
                self.awaiting_test_request_deadline = None;
            }
        }
    }

    pub fn on_test_request(
        &mut self,
        msg_seq_num: Option<u64>,
        test_req_id: &str,
        sending_time: Option<i64>,
        orig_sending_time: Option<i64>,
        now_ms: i64,
        is_poss_dup: bool,
        proxy: &mut dyn SessionProxy,
    ) {
        let Some(msg_seq_num) = msg_seq_num else {
            proxy.received_message_without_sequence_number(self.last_sent_seq_num);
            self.disconnect(proxy);
            return;
        };
        let msg_seq_num = SeqNum::new(msg_seq_num);
        if let Some(reason) = self.check_timestamps(now_ms, sending_time, orig_sending_time, is_poss_dup) {
            proxy.reject(msg_seq_num, None, "1", reason);
            return;
        }
        if !self.handle_sequence_number(msg_seq_num, is_poss_dup, now_ms, proxy) {
            return;
        }
        let seq = self.next_outbound_seq();
        proxy.heartbeat(Some(test_req_id), seq);
    }

    pub fn on_reject(
        &mut self,
        msg_seq_num: Option<u64>,
        sending_time: Option<i64>,
        orig_sending_time: Option<i64>,
        now_ms: i64,
        is_poss_dup: bool,
        proxy: &mut dyn SessionProxy,
    ) {
        let Some(msg_seq_num) = msg_seq_num else {
            proxy.received_message_without_sequence_number(self.last_sent_seq_num);
            self.disconnect(proxy);
            return;
        };
        let msg_seq_num = SeqNum::new(msg_seq_num);
        if let Some(reason) = self.check_timestamps(now_ms, sending_time, orig_sending_time, is_poss_dup) {
            proxy.reject(msg_seq_num, None, "3", reason);
            return;
        }
        self.handle_sequence_number(msg_seq_num, is_poss_dup, now_ms, proxy);
    }

    pub fn on_sequence_reset(
        &mut self,
        msg_seq_num: Option<u64>,
        new_seq_no: u64,
        gap_fill_flag: bool,
        is_poss_dup: bool,
        now_ms: i64,
        proxy: &mut dyn SessionProxy,
    ) {
        let Some(_msg_seq_num) = msg_seq_num else {
            proxy.received_message_without_sequence_number(self.last_sent_seq_num);
            self.disconnect(proxy);
            return;
        };
        let new_seq_no = SeqNum::new(new_seq_no);
        let expected = self.expected_received_seq_num();

        if gap_fill_flag {
            if new_seq_no > expected {
                self.last_received_seq_num = SeqNum::new(new_seq_no.value().saturating_sub(1));
                self.reset_inbound_deadline(now_ms);
                if self.state == SessionState::AwaitingResend {
                    self.state = SessionState::Active;
                }
            } else {
                // new_seq_no <= expected: invalid gap fill, unless this is
                // a replay of a gap fill we've already applied (PossDup),
                // which is a documented no-op.
                if is_poss_dup {
                    return;
                }
                self.emit_low_sequence_logout(new_seq_no, expected, proxy);
            }
            return;
        }

        // Reset mode (gap_fill_flag == false): unconditionally adopt
        // new_seq_no, except a strictly-low PossDup reset is rejected
        // (a strictly-low reset can only be a stale replay, never legitimate).
        if new_seq_no < expected && is_poss_dup {
            let seq = self.next_outbound_seq();
            proxy.reject(
                seq,
                Some(fixgw_fix_codec::tag::NEW_SEQ_NO),
                "4",
                SessionRejectReason::ValueIsIncorrect,
            );
            return;
        }
        self.last_received_seq_num = SeqNum::new(new_seq_no.value().saturating_sub(1));
        self.reset_inbound_deadline(now_ms);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn on_message(
        &mut self,
        msg_seq_num: Option<u64>,
        _msg_type: &str,
        sending_time: Option<i64>,
        orig_sending_time: Option<i64>,
        now_ms: i64,
        is_poss_dup: bool,
        proxy: &mut dyn SessionProxy,
    ) {
        let Some(msg_seq_num) = msg_seq_num else {
            proxy.received_message_without_sequence_number(self.last_sent_seq_num);
            self.disconnect(proxy);
            return;
        };
        let msg_seq_num = SeqNum::new(msg_seq_num);
        if let Some(reason) = self.check_timestamps(now_ms, sending_time, orig_sending_time, is_poss_dup) {
            proxy.reject(msg_seq_num, None, _msg_type, reason);
            return;
        }
        self.handle_sequence_number(msg_seq_num, is_poss_dup, now_ms, proxy);
    }

    pub fn on_invalid_message(
        &mut self,
        msg_seq_num: u64,
        invalid_tag_id: Option<u32>,
        msg_type: &str,
        reject_reason: SessionRejectReason,
        proxy: &mut dyn SessionProxy,
    ) {
        let seq = self.next_outbound_seq();
        proxy.reject(SeqNum::new(msg_seq_num), invalid_tag_id, msg_type, reject_reason);
        let _ = seq;
    }

    /// Replays (or gap-fills) our own sent messages in response to an
    /// inbound ResendRequest. The
    /// actual message bytes live with the caller (e.g. an outbound
    /// message store); this just authorizes and frames the range.
    pub fn on_resend_request(&mut self, begin_seq_no: u64, end_seq_no: u64, proxy: &mut dyn SessionProxy) {
        proxy.gap_fill(SeqNum::new(begin_seq_no), SeqNum::new(end_seq_no));
    }

    // ------------------------------------------------------------------
    // Outbound initiation
    // ------------------------------------------------------------------

    /// Sends our own Logon (initiator side) and transitions to `SentLogon`.
    pub fn send_logon(&mut self, heartbeat_interval_secs: i32, now_ms: i64, proxy: &mut dyn SessionProxy) {
        self.heartbeat_interval_ms = i64::from(heartbeat_interval_secs) * 1000;
        self.next_heartbeat_deadline = now_ms + self.heartbeat_interval_ms;
        self.reset_inbound_deadline(now_ms);
        let seq = self.next_outbound_seq();
        proxy.logon_accepted(seq, heartbeat_interval_secs);
        self.state = SessionState::SentLogon;
    }

    /// Initiates a graceful logout.
    pub fn send_logout(&mut self, proxy: &mut dyn SessionProxy) {
        let seq = self.next_outbound_seq();
        proxy.logout(seq);
        self.state = SessionState::AwaitingLogout;
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Timer-driven work. Returns the number of outbound effects emitted.
    pub fn poll(&mut self, now_ms: i64, proxy: &mut dyn SessionProxy) -> usize {
        if self.state == SessionState::Disconnected || self.heartbeat_interval_ms == 0 {
            return 0;
        }

        let mut work = 0;

        if now_ms >= self.next_heartbeat_deadline {
            let seq = self.next_outbound_seq();
            proxy.heartbeat(None, seq);
            self.next_heartbeat_deadline = now_ms + self.heartbeat_interval_ms;
            work += 1;
        }

        match self.awaiting_test_request_deadline {
            None => {
                if now_ms >= self.next_required_inbound_deadline + self.heartbeat_interval_ms {
                    let seq = self.next_outbound_seq();
                    proxy.test_request(seq, TIMEOUT_TEST_REQ_ID);
                    self.state = SessionState::AwaitingResend;
                    self.awaiting_test_request_deadline = Some(now_ms + self.heartbeat_interval_ms);
                    work += 1;
                }
            }
            Some(deadline) => {
                if now_ms >= deadline {
                    self.disconnect(proxy);
                    work += 1;
                }
            }
        }

        work
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AcceptAllAuthenticator;
    use crate::proxy::{ProxyEvent, RecordingProxy};

    fn new_active_session() -> (Session<AcceptAllAuthenticator>, RecordingProxy) {
        let mut session = Session::new_acceptor(
            SessionId::new(1),
            ConnectionId::new(1),
            SessionConfig {
                begin_string: "FIX.4.4".into(),
                sending_time_window_ms: 120_000,
                default_heartbeat_interval_secs: 30,
            },
            AcceptAllAuthenticator,
        );
        let mut proxy = RecordingProxy::new();
        session.on_logon(
            30,
            Some(1),
            "FIX.4.4",
            0,
            None,
            None,
            "PEER",
            "",
            "GATEWAY",
            None,
            None,
            false,
            &mut proxy,
        );
        assert_eq!(session.state(), SessionState::Active);
        (session, proxy)
    }

    /// Logon followed immediately by a low sequence number.
    #[test]
    fn scenario_logon_then_low_sequence_number() {
        let (mut session, mut proxy) = new_active_session();
        // Pretend we'd already received up through seq 2.
        session.last_received_seq_num = SeqNum::new(2);

        session.on_message(Some(1), "D", None, None, 0, false, &mut proxy);

        assert_eq!(
            proxy.last(),
            Some(&ProxyEvent::LowSequenceNumberLogout {
                ref_seq_num: SeqNum::new(1),
                expected: SeqNum::new(3),
                received: SeqNum::new(1),
            })
        );
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    /// A high sequence number triggers a resend request.
    #[test]
    fn scenario_resend_on_high_sequence() {
        let (mut session, mut proxy) = new_active_session();
        session.last_received_seq_num = SeqNum::NONE;

        session.on_message(Some(3), "D", None, None, 0, false, &mut proxy);

        match proxy.last() {
            Some(ProxyEvent::ResendRequest {
                begin_seq_no,
                end_seq_no,
                ..
            }) => {
                assert_eq!(*begin_seq_no, SeqNum::new(1));
                assert_eq!(*end_seq_no, SeqNum::NONE);
            }
            other => panic!("expected ResendRequest, got {other:?}"),
        }
        assert_eq!(session.state(), SessionState::AwaitingResend);
        assert_eq!(session.expected_received_seq_num(), SeqNum::new(1));
    }

    /// A valid gap fill followed by a TestRequest.
    #[test]
    fn scenario_valid_gap_fill_then_test_request() {
        let (mut session, mut proxy) = new_active_session();
        session.on_sequence_reset(Some(1), 4, true, false, 0, &mut proxy);

        assert!(proxy.events.is_empty(), "no reject should be emitted");
        assert_eq!(session.expected_received_seq_num(), SeqNum::new(4));
        assert_eq!(session.state(), SessionState::Active);

        session.on_test_request(Some(4), "Hello", None, None, 0, false, &mut proxy);
        assert_eq!(
            proxy.last(),
            Some(&ProxyEvent::Heartbeat {
                test_req_id: Some("Hello".to_string()),
                seq: session.last_sent_seq_num,
            })
        );
    }

    /// Idle past the heartbeat interval escalates to disconnect.
    #[test]
    fn scenario_heartbeat_timeout_then_disconnect() {
        let (mut session, mut proxy) = new_active_session();
        session.heartbeat_interval_ms = 2_000;
        session.next_heartbeat_deadline = 2_000;
        session.next_required_inbound_deadline = 0;

        session.poll(4_000, &mut proxy);
        assert!(proxy
            .events
            .iter()
            .any(|e| matches!(e, ProxyEvent::TestRequest { test_req_id, .. } if test_req_id == TIMEOUT_TEST_REQ_ID)));
        assert_eq!(session.state(), SessionState::AwaitingResend);

        proxy.events.clear();
        session.poll(8_000, &mut proxy);
        assert!(proxy
            .events
            .iter()
            .any(|e| matches!(e, ProxyEvent::RequestDisconnect { .. })));
    }

    #[test]
    fn duplicate_gap_fill_sequence_reset_is_a_no_op() {
        let (mut session, mut proxy) = new_active_session();
        session.on_sequence_reset(Some(1), 4, true, false, 0, &mut proxy);
        proxy.events.clear();
        // Same gap fill replayed with PossDup: new_seq_no (4) <= expected
        // (4) now, so it must be ignored rather than rejected.
        session.on_sequence_reset(Some(1), 4, true, true, 0, &mut proxy);
        assert!(proxy.events.is_empty());
        assert_eq!(session.last_received_seq_num(), SeqNum::new(3));
    }

    #[test]
    fn missing_sequence_number_disconnects() {
        let (mut session, mut proxy) = new_active_session();
        session.on_message(None, "D", None, None, 0, false, &mut proxy);
        assert!(matches!(
            proxy.events[0],
            ProxyEvent::ReceivedMessageWithoutSequenceNumber { .. }
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn sending_time_outside_window_is_rejected() {
        let (mut session, mut proxy) = new_active_session();
        session.on_message(Some(1), "D", Some(1_000_000), None, 0, false, &mut proxy);
        assert!(matches!(
            proxy.last(),
            Some(ProxyEvent::Reject {
                reject_reason: SessionRejectReason::SendingTimeAccuracyProblem,
                ..
            })
        ));
    }

    #[test]
    fn negative_heartbeat_interval_logs_out() {
        let mut session = Session::new_acceptor(
            SessionId::new(2),
            ConnectionId::new(2),
            SessionConfig {
                begin_string: "FIX.4.4".into(),
                sending_time_window_ms: 120_000,
                default_heartbeat_interval_secs: 30,
            },
            AcceptAllAuthenticator,
        );
        let mut proxy = RecordingProxy::new();
        session.on_logon(
            -1,
            Some(1),
            "FIX.4.4",
            0,
            None,
            None,
            "PEER",
            "",
            "GATEWAY",
            None,
            None,
            false,
            &mut proxy,
        );
        assert_eq!(proxy.events[0], ProxyEvent::NegativeHeartbeatLogout);
        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
