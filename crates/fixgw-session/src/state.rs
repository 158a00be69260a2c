//! Re-export of [`crate::session::SessionState`] under its own module so
//! callers that only care about state, not the full state machine, can
//! depend on a narrower path.

pub use crate::session::SessionState;
