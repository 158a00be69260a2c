//! Well-known transport stream identifiers.

/// Leader → followers, carries replicated log fragments.
pub const DEFAULT_DATA_STREAM_ID: u32 = 10;

/// Broadcast control stream: `RequestVote`, `ReplyVote`, `ConsensusHeartbeat`.
pub const DEFAULT_CONTROL_STREAM_ID: u32 = 11;

/// Follower → leader, carries `Acknowledge` position reports.
pub const DEFAULT_ACKNOWLEDGEMENT_STREAM_ID: u32 = 12;
