//! Writer- and reader-side facades over the transport (§4.4).
//!
//! [`ClusterPublication`] only ever lets the current leader append; data
//! published through it becomes visible to the rest of the cluster via the
//! replication role engine's acknowledgement and commit machinery.
//! [`ClusterSubscription`] only ever exposes fragments the role engine has
//! already committed, in commit order, and resyncs itself from the archive
//! reader across a leader change.

pub mod error;
pub mod publication;
pub mod subscription;

pub use error::{ClusterError, Result};
pub use publication::ClusterPublication;
pub use subscription::ClusterSubscription;
