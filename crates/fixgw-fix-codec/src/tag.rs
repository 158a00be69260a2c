//! FIX tag numbers used by the session layer.
//!
//! Only the tags the decoder and builder actually touch are named here; a
//! full data-dictionary of every FIX 4.x tag is the job of the (external)
//! code-generation collaborator, not this crate.

pub const BEGIN_STRING: u32 = 8;
pub const BODY_LENGTH: u32 = 9;
pub const MSG_TYPE: u32 = 35;
pub const SENDER_COMP_ID: u32 = 49;
pub const TARGET_COMP_ID: u32 = 56;
pub const SENDER_SUB_ID: u32 = 50;
pub const MSG_SEQ_NUM: u32 = 34;
pub const SENDING_TIME: u32 = 52;
pub const ORIG_SENDING_TIME: u32 = 122;
pub const POSS_DUP_FLAG: u32 = 43;
pub const POSS_RESEND: u32 = 97;
pub const CHECKSUM: u32 = 10;

pub const ENCRYPT_METHOD: u32 = 98;
pub const HEARTBT_INT: u32 = 108;
pub const USERNAME: u32 = 553;
pub const PASSWORD: u32 = 554;

pub const TEST_REQ_ID: u32 = 112;

pub const NEW_SEQ_NO: u32 = 36;
pub const GAP_FILL_FLAG: u32 = 123;

pub const REF_SEQ_NUM: u32 = 45;
pub const REF_TAG_ID: u32 = 371;
pub const REF_MSG_TYPE: u32 = 372;
pub const SESSION_REJECT_REASON: u32 = 373;
pub const TEXT: u32 = 58;

pub const BEGIN_SEQ_NO: u32 = 7;
pub const END_SEQ_NO: u32 = 16;

/// MsgType (35) values for the fixed set of session-layer messages.
pub mod msg_type {
    pub const HEARTBEAT: &str = "0";
    pub const TEST_REQUEST: &str = "1";
    pub const RESEND_REQUEST: &str = "2";
    pub const REJECT: &str = "3";
    pub const SEQUENCE_RESET: &str = "4";
    pub const LOGOUT: &str = "5";
    pub const LOGON: &str = "A";
}
