use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplicationError {
    #[error("no quorum available: {have} of {need} positions reported")]
    NoQuorum { have: usize, need: usize },

    #[error("commit position {requested} is not contiguously present locally (have up to {have})")]
    NonContiguousCommit { requested: u64, have: u64 },

    #[error("position {0} not found in archive")]
    PositionNotFound(u64),
}

pub type Result<T> = std::result::Result<T, ReplicationError>;
