//! Pure functions mapping reported follower positions to a commit position.

use fixgw_types::{LogPosition, NodeId};

/// `positions -> committed_position`. Implementations must be pure: same
/// input set, same output, every time.
pub trait AcknowledgementStrategy: Send + Sync {
    fn committed_position(&self, positions: &[(NodeId, LogPosition)]) -> Option<LogPosition>;
}

/// Requires every node in the cluster to have acknowledged; returns the
/// minimum reported position. The conservative default: nothing commits
/// until the slowest follower has it too.
///
/// `cluster_size` is needed because a leader's known-positions set only
/// grows as acknowledgements arrive; without it, a partial set (e.g. one
/// of two followers) would be mistaken for the whole cluster and commit
/// early.
#[derive(Debug, Clone, Copy)]
pub struct EntireClusterAcknowledgementStrategy {
    cluster_size: usize,
}

impl EntireClusterAcknowledgementStrategy {
    pub fn new(cluster_size: usize) -> Self {
        Self { cluster_size }
    }
}

impl AcknowledgementStrategy for EntireClusterAcknowledgementStrategy {
    fn committed_position(&self, positions: &[(NodeId, LogPosition)]) -> Option<LogPosition> {
        if positions.len() < self.cluster_size {
            return None;
        }
        positions.iter().map(|(_, p)| *p).min()
    }
}

/// Commits once a majority of the cluster has acknowledged a position,
/// using the median of all reported positions (the leader's own position
/// counts as one of the reports).
#[derive(Debug, Clone, Copy)]
pub struct MajorityAcknowledgementStrategy {
    cluster_size: usize,
}

impl MajorityAcknowledgementStrategy {
    pub fn new(cluster_size: usize) -> Self {
        Self { cluster_size }
    }

    pub fn quorum_size(&self) -> usize {
        quorum_size(self.cluster_size)
    }
}

impl AcknowledgementStrategy for MajorityAcknowledgementStrategy {
    fn committed_position(&self, positions: &[(NodeId, LogPosition)]) -> Option<LogPosition> {
        if positions.len() < self.quorum_size() {
            return None;
        }
        let mut values: Vec<LogPosition> = positions.iter().map(|(_, p)| *p).collect();
        values.sort_unstable();
        Some(values[values.len() / 2])
    }
}

/// `cluster_size / 2 + 1`, the smallest count that outnumbers every
/// disjoint minority.
pub fn quorum_size(cluster_size: usize) -> usize {
    cluster_size / 2 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(values: &[u64]) -> Vec<(NodeId, LogPosition)> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (NodeId::new(i as u8), LogPosition::new(v)))
            .collect()
    }

    #[test]
    fn entire_cluster_takes_the_minimum() {
        let strategy = EntireClusterAcknowledgementStrategy::new(3);
        let committed = strategy.committed_position(&positions(&[10, 30, 5])).unwrap();
        assert_eq!(committed, LogPosition::new(5));
    }

    #[test]
    fn entire_cluster_withholds_commit_until_every_node_reported() {
        let strategy = EntireClusterAcknowledgementStrategy::new(3);
        assert!(strategy.committed_position(&positions(&[10, 30])).is_none());
        assert!(strategy.committed_position(&positions(&[10, 30, 5])).is_some());
    }

    #[test]
    fn majority_takes_the_median_once_quorum_reached() {
        let strategy = MajorityAcknowledgementStrategy::new(5);
        assert_eq!(strategy.quorum_size(), 3);
        assert!(strategy.committed_position(&positions(&[10, 20])).is_none());
        let committed = strategy
            .committed_position(&positions(&[10, 20, 30]))
            .unwrap();
        assert_eq!(committed, LogPosition::new(20));
    }

    #[test]
    fn quorum_size_handles_odd_cluster_sizes() {
        assert_eq!(quorum_size(3), 2);
        assert_eq!(quorum_size(5), 3);
        assert_eq!(quorum_size(7), 4);
    }

    proptest::proptest! {
        #[test]
        fn majority_committed_position_never_exceeds_max_reported(
            a in 0u64..10_000, b in 0u64..10_000, c in 0u64..10_000
        ) {
            let strategy = MajorityAcknowledgementStrategy::new(3);
            let committed = strategy.committed_position(&positions(&[a, b, c])).unwrap();
            proptest::prop_assert!(committed.value() <= a.max(b).max(c));
            proptest::prop_assert!(committed.value() >= a.min(b).min(c));
        }
    }
}
