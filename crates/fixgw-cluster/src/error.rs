use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    /// `try_claim` was attempted against a node that does not currently
    /// hold leadership. The caller should back off and retry against
    /// whichever node the last `ConsensusHeartbeat` named as leader.
    #[error("not the current leader")]
    NotLeader,
}

pub type Result<T> = std::result::Result<T, ClusterError>;
