//! Outbound session-layer message construction.
//!
//! Mirrors the decoder's framing rules in reverse: body fields are
//! assembled first so `BodyLength` (tag 9) can be computed, then the
//! checksum (tag 10) is computed over everything that precedes it.

use crate::decoder::SOH;
use crate::tag;

/// Accumulates tag/value pairs for one outbound message and serializes them
/// to FIX wire format with a correct `BodyLength` and `Checksum`.
pub struct FixBuilder {
    begin_string: String,
    msg_type: String,
    fields: Vec<(u32, String)>,
}

impl FixBuilder {
    pub fn new(begin_string: &str, msg_type: &str) -> Self {
        Self {
            begin_string: begin_string.to_string(),
            msg_type: msg_type.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(&mut self, tag: u32, value: impl ToString) -> &mut Self {
        self.fields.push((tag, value.to_string()));
        self
    }

    pub fn field_opt(&mut self, tag: u32, value: Option<impl ToString>) -> &mut Self {
        if let Some(v) = value {
            self.field(tag, v);
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut body = Vec::new();
        append_field(&mut body, tag::MSG_TYPE, &self.msg_type);
        for (t, v) in &self.fields {
            append_field(&mut body, *t, v);
        }

        let mut prefix = Vec::new();
        append_field(&mut prefix, tag::BEGIN_STRING, &self.begin_string);
        append_field(&mut prefix, tag::BODY_LENGTH, &body.len().to_string());

        let mut out = Vec::with_capacity(prefix.len() + body.len() + 7);
        out.extend_from_slice(&prefix);
        out.extend_from_slice(&body);

        let checksum = compute_checksum(&out);
        out.extend_from_slice(format!("10={checksum:03}").as_bytes());
        out.push(SOH);
        out
    }
}

fn append_field(buf: &mut Vec<u8>, tag: u32, value: &str) {
    buf.extend_from_slice(tag.to_string().as_bytes());
    buf.push(b'=');
    buf.extend_from_slice(value.as_bytes());
    buf.push(SOH);
}

fn compute_checksum(bytes: &[u8]) -> u8 {
    let mut sum: u32 = 0;
    for &b in bytes {
        sum = sum.wrapping_add(u32::from(b));
    }
    (sum & 0xFF) as u8
}

fn with_header(
    builder: &mut FixBuilder,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
) {
    builder.field(tag::SENDER_COMP_ID, sender_comp_id);
    if !sender_sub_id.is_empty() {
        builder.field(tag::SENDER_SUB_ID, sender_sub_id);
    }
    builder.field(tag::TARGET_COMP_ID, target_comp_id);
    builder.field(tag::MSG_SEQ_NUM, msg_seq_num);
}

#[allow(clippy::too_many_arguments)]
pub fn logon(
    begin_string: &str,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
    heartbeat_interval_secs: i32,
    username: Option<&str>,
    password: Option<&str>,
) -> Vec<u8> {
    let mut b = FixBuilder::new(begin_string, tag::msg_type::LOGON);
    with_header(&mut b, sender_comp_id, sender_sub_id, target_comp_id, msg_seq_num);
    b.field(tag::ENCRYPT_METHOD, 0);
    b.field(tag::HEARTBT_INT, heartbeat_interval_secs);
    b.field_opt(tag::USERNAME, username);
    b.field_opt(tag::PASSWORD, password);
    b.build()
}

pub fn logout(
    begin_string: &str,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
    text: Option<&str>,
) -> Vec<u8> {
    let mut b = FixBuilder::new(begin_string, tag::msg_type::LOGOUT);
    with_header(&mut b, sender_comp_id, sender_sub_id, target_comp_id, msg_seq_num);
    b.field_opt(tag::TEXT, text);
    b.build()
}

pub fn heartbeat(
    begin_string: &str,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
    test_req_id: Option<&str>,
) -> Vec<u8> {
    let mut b = FixBuilder::new(begin_string, tag::msg_type::HEARTBEAT);
    with_header(&mut b, sender_comp_id, sender_sub_id, target_comp_id, msg_seq_num);
    b.field_opt(tag::TEST_REQ_ID, test_req_id);
    b.build()
}

pub fn test_request(
    begin_string: &str,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
    test_req_id: &str,
) -> Vec<u8> {
    let mut b = FixBuilder::new(begin_string, tag::msg_type::TEST_REQUEST);
    with_header(&mut b, sender_comp_id, sender_sub_id, target_comp_id, msg_seq_num);
    b.field(tag::TEST_REQ_ID, test_req_id);
    b.build()
}

#[allow(clippy::too_many_arguments)]
pub fn reject(
    begin_string: &str,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
    ref_seq_num: u64,
    ref_tag_id: Option<u32>,
    reason_code: Option<u32>,
    text: Option<&str>,
) -> Vec<u8> {
    let mut b = FixBuilder::new(begin_string, tag::msg_type::REJECT);
    with_header(&mut b, sender_comp_id, sender_sub_id, target_comp_id, msg_seq_num);
    b.field(tag::REF_SEQ_NUM, ref_seq_num);
    b.field_opt(tag::REF_TAG_ID, ref_tag_id);
    b.field_opt(tag::SESSION_REJECT_REASON, reason_code);
    b.field_opt(tag::TEXT, text);
    b.build()
}

pub fn sequence_reset(
    begin_string: &str,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
    new_seq_no: u64,
    gap_fill_flag: bool,
) -> Vec<u8> {
    let mut b = FixBuilder::new(begin_string, tag::msg_type::SEQUENCE_RESET);
    with_header(&mut b, sender_comp_id, sender_sub_id, target_comp_id, msg_seq_num);
    b.field(tag::NEW_SEQ_NO, new_seq_no);
    b.field(tag::GAP_FILL_FLAG, if gap_fill_flag { "Y" } else { "N" });
    b.build()
}

#[allow(clippy::too_many_arguments)]
pub fn resend_request(
    begin_string: &str,
    sender_comp_id: &str,
    sender_sub_id: &str,
    target_comp_id: &str,
    msg_seq_num: u64,
    begin_seq_no: u64,
    end_seq_no: u64,
) -> Vec<u8> {
    let mut b = FixBuilder::new(begin_string, tag::msg_type::RESEND_REQUEST);
    with_header(&mut b, sender_comp_id, sender_sub_id, target_comp_id, msg_seq_num);
    b.field(tag::BEGIN_SEQ_NO, begin_seq_no);
    b.field(tag::END_SEQ_NO, end_seq_no);
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    #[test]
    fn builds_well_formed_heartbeat() {
        let raw = heartbeat("FIX.4.4", "GW", "", "PEER", 7, Some("abc"));
        let decoded = decode(&raw).expect("valid frame");
        assert_eq!(decoded.header.msg_seq_num, Some(7));
    }

    #[test]
    fn resend_request_carries_infinity_sentinel() {
        let raw = resend_request("FIX.4.4", "GW", "", "PEER", 1, 5, 0);
        let decoded = decode(&raw).unwrap();
        match decoded.payload {
            crate::message::Payload::ResendRequest {
                begin_seq_no,
                end_seq_no,
            } => {
                assert_eq!(begin_seq_no, 5);
                assert_eq!(end_seq_no, 0);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
