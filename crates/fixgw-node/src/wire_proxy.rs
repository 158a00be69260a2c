//! `SessionProxy` implementation that serializes outbound effects to FIX
//! wire bytes and hands them to an [`OutboundSink`] — the thin handler
//! callback an embedding application supplies (e.g. to write to a real
//! socket); wiring that callback to an actual network transport is outside
//! this workspace's scope, so `fixgw-node` only defines the seam.

use fixgw_fix_codec::{builder, SessionRejectReason};
use fixgw_types::{ConnectionId, SeqNum, SessionKey};

use fixgw_session::SessionProxy;

/// Receives every FIX wire frame a session emits, tagged with the
/// connection it belongs to, plus connection teardown requests.
pub trait OutboundSink: Send {
    fn send(&mut self, connection_id: ConnectionId, bytes: Vec<u8>);
    fn disconnect(&mut self, connection_id: ConnectionId);
}

/// Encodes every [`SessionProxy`] call using this session's identity and
/// forwards the resulting bytes to an [`OutboundSink`].
pub struct WireProxy<'a> {
    connection_id: ConnectionId,
    begin_string: String,
    session_key: SessionKey,
    sink: &'a mut dyn OutboundSink,
}

impl<'a> WireProxy<'a> {
    pub fn new(
        connection_id: ConnectionId,
        begin_string: impl Into<String>,
        session_key: SessionKey,
        sink: &'a mut dyn OutboundSink,
    ) -> Self {
        Self {
            connection_id,
            begin_string: begin_string.into(),
            session_key,
            sink,
        }
    }

    fn emit(&mut self, bytes: Vec<u8>) {
        self.sink.send(self.connection_id, bytes);
    }

    fn sender_comp_id(&self) -> &str {
        self.session_key.sender_comp_id.as_str()
    }

    fn sender_sub_id(&self) -> &str {
        self.session_key.sender_sub_id.as_str()
    }

    fn target_comp_id(&self) -> &str {
        self.session_key.target_comp_id.as_str()
    }
}

impl SessionProxy for WireProxy<'_> {
    fn logon_accepted(&mut self, seq: SeqNum, heartbeat_interval_secs: i32) {
        let bytes = builder::logon(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            seq.value(),
            heartbeat_interval_secs,
            None,
            None,
        );
        self.emit(bytes);
    }

    fn logout(&mut self, seq: SeqNum) {
        let bytes = builder::logout(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            seq.value(),
            None,
        );
        self.emit(bytes);
    }

    fn low_sequence_number_logout(&mut self, ref_seq_num: SeqNum, expected: SeqNum, received: SeqNum) {
        let text = format!("MsgSeqNum too low, expecting {expected} but received {received}");
        let bytes = builder::logout(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            ref_seq_num.value(),
            Some(&text),
        );
        self.emit(bytes);
        self.sink.disconnect(self.connection_id);
    }

    fn incorrect_begin_string_logout(&mut self) {
        self.sink.disconnect(self.connection_id);
    }

    fn negative_heartbeat_logout(&mut self) {
        let bytes = builder::logout(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            SeqNum::new(0).value(),
            Some("HeartBtInt must not be negative"),
        );
        self.emit(bytes);
        self.sink.disconnect(self.connection_id);
    }

    fn reject(
        &mut self,
        ref_seq_num: SeqNum,
        ref_tag_id: Option<u32>,
        msg_type: &str,
        reject_reason: SessionRejectReason,
    ) {
        let _ = msg_type;
        let bytes = builder::reject(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            ref_seq_num.value(),
            ref_seq_num.value(),
            ref_tag_id,
            Some(reject_reason.code()),
            Some(reject_reason.text()),
        );
        self.emit(bytes);
    }

    fn heartbeat(&mut self, test_req_id: Option<&str>, seq: SeqNum) {
        let bytes = builder::heartbeat(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            seq.value(),
            test_req_id,
        );
        self.emit(bytes);
    }

    fn test_request(&mut self, seq: SeqNum, test_req_id: &str) {
        let bytes = builder::test_request(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            seq.value(),
            test_req_id,
        );
        self.emit(bytes);
    }

    fn sequence_reset(&mut self, msg_seq_num: SeqNum, new_seq_no: SeqNum, gap_fill_flag: bool) {
        let bytes = builder::sequence_reset(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            msg_seq_num.value(),
            new_seq_no.value(),
            gap_fill_flag,
        );
        self.emit(bytes);
    }

    fn resend_request(&mut self, seq: SeqNum, begin_seq_no: SeqNum, end_seq_no: SeqNum) {
        let bytes = builder::resend_request(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            seq.value(),
            begin_seq_no.value(),
            end_seq_no.value(),
        );
        self.emit(bytes);
    }

    fn received_message_without_sequence_number(&mut self, _seq: SeqNum) {
        self.sink.disconnect(self.connection_id);
    }

    fn request_disconnect(&mut self, connection_id: ConnectionId) {
        self.sink.disconnect(connection_id);
    }

    fn gap_fill(&mut self, begin_seq_no: SeqNum, end_seq_no: SeqNum) {
        let bytes = builder::sequence_reset(
            &self.begin_string,
            self.sender_comp_id(),
            self.sender_sub_id(),
            self.target_comp_id(),
            begin_seq_no.value(),
            end_seq_no.value(),
            true,
        );
        self.emit(bytes);
    }
}

/// Captures every `ProxyEvent`-equivalent frame this proxy emitted, used
/// in place of a real socket when the node is composing agents without a
/// live transport (tests, dry runs).
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Vec<(ConnectionId, Vec<u8>)>,
    pub disconnected: Vec<ConnectionId>,
}

impl OutboundSink for RecordingSink {
    fn send(&mut self, connection_id: ConnectionId, bytes: Vec<u8>) {
        self.sent.push((connection_id, bytes));
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        self.disconnected.push(connection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixgw_fix_codec::decode;

    fn key() -> SessionKey {
        SessionKey::from_inbound_header("PEER", "", "GATEWAY")
    }

    #[test]
    fn logon_accepted_encodes_a_well_formed_logon() {
        let mut sink = RecordingSink::default();
        let connection_id = ConnectionId::new(1);
        {
            let mut proxy = WireProxy::new(connection_id, "FIX.4.4", key(), &mut sink);
            proxy.logon_accepted(SeqNum::new(1), 30);
        }
        assert_eq!(sink.sent.len(), 1);
        let decoded = decode(&sink.sent[0].1).unwrap();
        assert_eq!(decoded.header.msg_seq_num, Some(1));
    }

    #[test]
    fn low_sequence_number_logout_also_requests_disconnect() {
        let mut sink = RecordingSink::default();
        let connection_id = ConnectionId::new(1);
        {
            let mut proxy = WireProxy::new(connection_id, "FIX.4.4", key(), &mut sink);
            proxy.low_sequence_number_logout(SeqNum::new(5), SeqNum::new(5), SeqNum::new(3));
        }
        assert_eq!(sink.sent.len(), 1);
        assert_eq!(sink.disconnected, vec![connection_id]);
    }

    #[test]
    fn reject_carries_the_reason_code() {
        let mut sink = RecordingSink::default();
        let connection_id = ConnectionId::new(1);
        {
            let mut proxy = WireProxy::new(connection_id, "FIX.4.4", key(), &mut sink);
            proxy.reject(SeqNum::new(4), Some(52), "D", SessionRejectReason::RequiredTagMissing);
        }
        let decoded = decode(&sink.sent[0].1).unwrap();
        match decoded.payload {
            fixgw_fix_codec::Payload::Reject { reason_code, .. } => {
                assert_eq!(reason_code, Some(SessionRejectReason::RequiredTagMissing.code()));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
