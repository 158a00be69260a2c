//! Term-based replication core: role engine, acknowledgement strategies,
//! and the archiver/archive-reader contract the role engine writes
//! through and resyncs from.

pub mod archive;
pub mod error;
pub mod message;
pub mod role;
pub mod strategy;
pub mod term;

pub use archive::{ArchiveReader, Archiver, InMemoryArchive, InMemoryArchiver};
pub use error::{ReplicationError, Result};
pub use message::{Acknowledge, ControlMessage};
pub use role::{RoleEngine, RoleEvent, RoleOutput};
pub use strategy::{
    quorum_size, AcknowledgementStrategy, EntireClusterAcknowledgementStrategy, MajorityAcknowledgementStrategy,
};
pub use term::TermState;
