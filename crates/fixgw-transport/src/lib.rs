//! Framing / Transport Adapter.
//!
//! The real transport is an Aeron-like broadcast log: publications expose
//! `try_claim`/`offer` and return monotonic log positions; subscriptions
//! poll fragments in commit order. That transport is an external
//! collaborator — this crate provides a reference implementation of its
//! *contract* so the session engine and replication core in this workspace
//! have something to run and be tested against.
//!
//! # Simplification
//!
//! The real transport is a lock-free, single-writer/multi-reader ring
//! buffer. This reference implementation uses a mutex-guarded append-only
//! buffer instead (`LogState`) — correct and simple to reason about, but
//! not lock-free. Every method it exposes (`try_claim`, `offer`, fragment
//! polling, monotonic positions, per-publication session identity) matches
//! the contract the rest of the workspace is written against, so swapping
//! in a true lock-free transport later requires no changes above this
//! crate.

mod log;
mod stream_ids;

pub use log::{BufferClaim, FragmentHandler, Publication, Subscription, TransportLog};
pub use stream_ids::{
    DEFAULT_ACKNOWLEDGEMENT_STREAM_ID, DEFAULT_CONTROL_STREAM_ID, DEFAULT_DATA_STREAM_ID,
};

use thiserror::Error;

/// Errors raised by the transport adapter. Distinct from the FIX session
/// and replication error kinds, which are all about protocol-layer state,
/// not the channel carrying the bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// `try_claim`/`offer` failed because the log has no capacity left for
    /// this frame; the caller should back off and retry.
    #[error("publication back-pressured: requested {requested} bytes")]
    BackPressured { requested: usize },

    /// The claimed length was zero or exceeded the maximum frame size.
    #[error("invalid claim length: {0}")]
    InvalidLength(usize),
}

pub type Result<T> = std::result::Result<T, TransportError>;
