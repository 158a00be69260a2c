//! Tag=value SOH decoder.
//!
//! Parses a raw FIX frame into fields, validates checksum and framing, then
//! dispatches on `MsgType` (tag 35) to produce a typed [`SessionMessage`].
//! A full data-dictionary code generator would normally own this; here it
//! is a real, working decoder so the session parser and session state
//! machine have something concrete to run against.

use std::collections::BTreeMap;

use crate::header::Header;
use crate::message::{Payload, SessionMessage};
use crate::reject::SessionRejectReason;
use crate::tag;

/// The SOH field delimiter (ASCII 0x01).
pub const SOH: u8 = 0x01;

/// A structurally invalid message.
///
/// When [`DecodeError::msg_seq_num`] is `Some`, the session parser reports
/// this via `Session::on_invalid_message`; when it is `None` the parser
/// falls back to `Session::on_message` with the missing-sequence-number
/// sentinel so the state machine can disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub msg_seq_num: Option<u64>,
    pub invalid_tag_id: Option<u32>,
    pub msg_type: Option<String>,
    pub reason: SessionRejectReason,
}

fn compute_checksum(bytes: &[u8]) -> u8 {
    let mut sum: u32 = 0;
    for &b in bytes {
        sum = sum.wrapping_add(u32::from(b));
    }
    (sum & 0xFF) as u8
}

fn split_field(field: &[u8]) -> Option<(u32, &str)> {
    let field = std::str::from_utf8(field).ok()?;
    let eq = field.find('=')?;
    let tag: u32 = field[..eq].parse().ok()?;
    Some((tag, &field[eq + 1..]))
}

/// Splits a raw frame into `(tag, value)` pairs in wire order, validating
/// the BeginString/BodyLength/Checksum framing.
fn tokenize(raw: &[u8]) -> Result<Vec<(u32, String)>, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError {
            msg_seq_num: None,
            invalid_tag_id: None,
            msg_type: None,
            reason: SessionRejectReason::RequiredTagMissing,
        });
    }

    let raw_fields: Vec<&[u8]> = raw
        .split(|&b| b == SOH)
        .filter(|f| !f.is_empty())
        .collect();

    if raw_fields.len() < 3 {
        return Err(DecodeError {
            msg_seq_num: None,
            invalid_tag_id: Some(tag::BEGIN_STRING),
            msg_type: None,
            reason: SessionRejectReason::RequiredTagMissing,
        });
    }

    let mut fields = Vec::with_capacity(raw_fields.len());
    for raw_field in &raw_fields {
        let Some((t, v)) = split_field(raw_field) else {
            return Err(DecodeError {
                msg_seq_num: None,
                invalid_tag_id: None,
                msg_type: None,
                reason: SessionRejectReason::TagSpecifiedWithoutAValue,
            });
        };
        fields.push((t, v.to_string()));
    }

    if fields[0].0 != tag::BEGIN_STRING {
        return Err(DecodeError {
            msg_seq_num: None,
            invalid_tag_id: Some(tag::BEGIN_STRING),
            msg_type: None,
            reason: SessionRejectReason::TagSpecifiedOutOfRequiredOrder,
        });
    }
    if fields[1].0 != tag::BODY_LENGTH {
        return Err(DecodeError {
            msg_seq_num: None,
            invalid_tag_id: Some(tag::BODY_LENGTH),
            msg_type: None,
            reason: SessionRejectReason::TagSpecifiedOutOfRequiredOrder,
        });
    }
    let (last_tag, last_val) = &fields[fields.len() - 1];
    if *last_tag != tag::CHECKSUM {
        return Err(DecodeError {
            msg_seq_num: None,
            invalid_tag_id: Some(tag::CHECKSUM),
            msg_type: None,
            reason: SessionRejectReason::TagSpecifiedOutOfRequiredOrder,
        });
    }
    let expected: u8 = last_val.parse().unwrap_or(0);
    let checksum_field_len = raw_fields[raw_fields.len() - 1].len() + 1;
    let actual = compute_checksum(&raw[..raw.len() - checksum_field_len]);
    if expected != actual {
        return Err(DecodeError {
            msg_seq_num: None,
            invalid_tag_id: Some(tag::CHECKSUM),
            msg_type: None,
            reason: SessionRejectReason::IncorrectDataFormatForValue,
        });
    }

    Ok(fields)
}

fn find_seq_num(fields: &BTreeMap<u32, String>) -> Option<u64> {
    fields.get(&tag::MSG_SEQ_NUM)?.parse().ok()
}

/// Decodes one complete FIX frame (including the leading `8=` and trailing
/// `10=` fields) into a [`SessionMessage`].
pub fn decode(raw: &[u8]) -> Result<SessionMessage, DecodeError> {
    let tokens = tokenize(raw)?;
    let begin_string = tokens[0].1.clone();

    let mut fields: BTreeMap<u32, String> = BTreeMap::new();
    for (t, v) in tokens.into_iter().skip(2) {
        if t == tag::BODY_LENGTH || t == tag::CHECKSUM {
            continue;
        }
        fields.insert(t, v);
    }

    let msg_type = fields.get(&tag::MSG_TYPE).cloned();
    let msg_seq_num = find_seq_num(&fields);

    let Some(msg_type) = msg_type else {
        return Err(DecodeError {
            msg_seq_num,
            invalid_tag_id: Some(tag::MSG_TYPE),
            msg_type: None,
            reason: SessionRejectReason::RequiredTagMissing,
        });
    };

    let header = Header {
        begin_string,
        msg_type: msg_type.clone(),
        sender_comp_id: fields.get(&tag::SENDER_COMP_ID).cloned().unwrap_or_default(),
        sender_sub_id: fields.get(&tag::SENDER_SUB_ID).cloned().unwrap_or_default(),
        target_comp_id: fields.get(&tag::TARGET_COMP_ID).cloned().unwrap_or_default(),
        msg_seq_num,
        sending_time: fields.get(&tag::SENDING_TIME).and_then(|v| v.parse().ok()),
        orig_sending_time: fields
            .get(&tag::ORIG_SENDING_TIME)
            .and_then(|v| v.parse().ok()),
        poss_dup_flag: fields.get(&tag::POSS_DUP_FLAG).map(String::as_str) == Some("Y"),
        poss_resend: fields.get(&tag::POSS_RESEND).map(String::as_str) == Some("Y"),
    };

    let payload = decode_payload(&msg_type, &fields).map_err(|reason| DecodeError {
        msg_seq_num,
        invalid_tag_id: None,
        msg_type: Some(msg_type.clone()),
        reason,
    })?;

    Ok(SessionMessage { header, payload })
}

fn decode_payload(
    msg_type: &str,
    fields: &BTreeMap<u32, String>,
) -> Result<Payload, SessionRejectReason> {
    use crate::tag::msg_type as mt;

    match msg_type {
        mt::LOGON => {
            let heartbeat_interval_secs = fields
                .get(&tag::HEARTBT_INT)
                .ok_or(SessionRejectReason::RequiredTagMissing)?
                .parse()
                .map_err(|_| SessionRejectReason::IncorrectDataFormatForValue)?;
            Ok(Payload::Logon {
                heartbeat_interval_secs,
                username: fields.get(&tag::USERNAME).cloned(),
                password: fields.get(&tag::PASSWORD).cloned(),
            })
        }
        mt::LOGOUT => Ok(Payload::Logout),
        mt::HEARTBEAT => Ok(Payload::Heartbeat {
            test_req_id: fields.get(&tag::TEST_REQ_ID).cloned(),
        }),
        mt::TEST_REQUEST => {
            let test_req_id = fields
                .get(&tag::TEST_REQ_ID)
                .cloned()
                .ok_or(SessionRejectReason::RequiredTagMissing)?;
            Ok(Payload::TestRequest { test_req_id })
        }
        mt::REJECT => {
            let ref_seq_num = fields
                .get(&tag::REF_SEQ_NUM)
                .ok_or(SessionRejectReason::RequiredTagMissing)?
                .parse()
                .map_err(|_| SessionRejectReason::IncorrectDataFormatForValue)?;
            Ok(Payload::Reject {
                ref_seq_num,
                ref_tag_id: fields.get(&tag::REF_TAG_ID).and_then(|v| v.parse().ok()),
                ref_msg_type: fields.get(&tag::REF_MSG_TYPE).cloned(),
                reason_code: fields
                    .get(&tag::SESSION_REJECT_REASON)
                    .and_then(|v| v.parse().ok()),
                text: fields.get(&tag::TEXT).cloned(),
            })
        }
        mt::SEQUENCE_RESET => {
            let new_seq_no = fields
                .get(&tag::NEW_SEQ_NO)
                .ok_or(SessionRejectReason::RequiredTagMissing)?
                .parse()
                .map_err(|_| SessionRejectReason::IncorrectDataFormatForValue)?;
            let gap_fill_flag = fields.get(&tag::GAP_FILL_FLAG).map(String::as_str) == Some("Y");
            Ok(Payload::SequenceReset {
                new_seq_no,
                gap_fill_flag,
            })
        }
        mt::RESEND_REQUEST => {
            let begin_seq_no = fields
                .get(&tag::BEGIN_SEQ_NO)
                .ok_or(SessionRejectReason::RequiredTagMissing)?
                .parse()
                .map_err(|_| SessionRejectReason::IncorrectDataFormatForValue)?;
            let end_seq_no = fields
                .get(&tag::END_SEQ_NO)
                .ok_or(SessionRejectReason::RequiredTagMissing)?
                .parse()
                .map_err(|_| SessionRejectReason::IncorrectDataFormatForValue)?;
            Ok(Payload::ResendRequest {
                begin_seq_no,
                end_seq_no,
            })
        }
        _ => Ok(Payload::Business),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;

    #[test]
    fn round_trips_logon() {
        let raw = builder::logon("FIX.4.4", "GATEWAY", "", "PEER", 1, 30, None, None);
        let decoded = decode(&raw).expect("decode");
        assert_eq!(decoded.header.begin_string, "FIX.4.4");
        assert_eq!(decoded.header.sender_comp_id, "GATEWAY");
        assert_eq!(decoded.header.msg_seq_num, Some(1));
        match decoded.payload {
            Payload::Logon {
                heartbeat_interval_secs,
                ..
            } => assert_eq!(heartbeat_interval_secs, 30),
            other => panic!("expected Logon, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut raw = builder::heartbeat("FIX.4.4", "GATEWAY", "", "PEER", 2, None);
        let last = raw.len() - 1;
        raw[last - 2] = b'9';
        let err = decode(&raw).unwrap_err();
        assert_eq!(err.reason, SessionRejectReason::IncorrectDataFormatForValue);
    }

    #[test]
    fn missing_msg_seq_num_decodes_with_sentinel() {
        // A minimal, checksum-valid Heartbeat with no MsgSeqNum field at all.
        let body = b"35=0\x01";
        let mut out = Vec::new();
        out.extend_from_slice(b"8=FIX.4.4\x01");
        out.extend_from_slice(format!("9={}\x01", body.len()).as_bytes());
        out.extend_from_slice(body);
        let checksum = compute_checksum(&out);
        out.extend_from_slice(format!("10={checksum:03}\x01").as_bytes());

        let decoded = decode(&out).expect("structurally valid frame");
        assert_eq!(decoded.header.msg_seq_num, None);
    }

    #[test]
    fn rejects_empty_input() {
        let err = decode(&[]).unwrap_err();
        assert_eq!(err.reason, SessionRejectReason::RequiredTagMissing);
    }
}
