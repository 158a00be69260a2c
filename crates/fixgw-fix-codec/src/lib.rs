//! FIX 4.x session-layer decoder, encoder, and header accessors.
//!
//! This crate parses the fixed set of session-layer messages (Logon,
//! Logout, Heartbeat, TestRequest, Reject, SequenceReset, ResendRequest)
//! plus any business message, exposing typed accessors and structural
//! validation results. The session state machine in `fixgw-session` is
//! the only caller.

pub mod builder;
pub mod decoder;
pub mod header;
pub mod message;
pub mod reject;
pub mod tag;

pub use decoder::{decode, DecodeError, SOH};
pub use header::Header;
pub use message::{Payload, SessionMessage};
pub use reject::SessionRejectReason;
