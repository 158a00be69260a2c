//! Session-layer error kinds. None of these are fatal to
//! the process — they are always scoped to the one session that raised
//! them and are surfaced here only for logging/instrumentation; the
//! corresponding policy (logout, reject, silent disconnect, ...) is
//! already carried out by the state machine before the error is logged.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("BeginString mismatch")]
    InvalidBeginString,

    #[error("MsgSeqNum {received} below expected {expected}")]
    LowSequenceNumber { expected: u64, received: u64 },

    #[error("message has no MsgSeqNum")]
    MissingSequenceNumber,

    #[error("SendingTime outside the accuracy window")]
    SendingTimeOutOfWindow,

    #[error("required tag missing: {0}")]
    RequiredTagMissing(u32),

    #[error("SequenceReset NewSeqNo is invalid")]
    InvalidSequenceReset,

    #[error("negative heartbeat interval")]
    NegativeHeartbeat,

    #[error("authentication failed")]
    AuthenticationFailed,
}
