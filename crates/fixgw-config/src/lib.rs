//! Configuration loading for a gateway node (§6 of `spec.md`).
//!
//! Layered the way the teacher workspace's configuration crate does:
//! built-in defaults → `gateway.toml` (project, git-tracked) →
//! `gateway.local.toml` (gitignored overrides) → `GATEWAY_*` environment
//! variables, highest precedence last.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fixgw_replication::{AcknowledgementStrategy, EntireClusterAcknowledgementStrategy, MajorityAcknowledgementStrategy};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Top-level gateway configuration: the §6 knobs plus node/cluster topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub fix: FixConfig,
    pub replication: ReplicationConfig,
    pub node: NodeConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            fix: FixConfig::default(),
            replication: ReplicationConfig::default(),
            node: NodeConfig::default(),
        }
    }
}

/// FIX session-layer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// The wire-format FIX version string every session on this node
    /// requires an exact match against.
    pub begin_string: String,
    /// Fallback heartbeat interval (seconds) offered on outbound Logon;
    /// acceptor sessions take whatever the peer's Logon requests.
    pub default_heartbeat_interval_secs: i32,
    /// `SendingTime` accuracy window, milliseconds either side of now.
    pub sending_time_window_ms: i64,
    /// Scratch buffer size (bytes) reserved per session for outbound
    /// message encoding.
    pub encoder_buffer_size: usize,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            begin_string: "FIX.4.4".to_string(),
            default_heartbeat_interval_secs: 30,
            sending_time_window_ms: 120_000,
            encoder_buffer_size: 4096,
        }
    }
}

/// Replication-core knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Base election/heartbeat timeout, milliseconds. Follower timeouts are
    /// drawn uniformly from `[timeout_ms, MAX_TO_MIN_TIMEOUT * timeout_ms)`.
    pub timeout_ms: i64,
    /// Cluster size. Must be odd and at least 3.
    pub cluster_size: usize,
    pub acknowledgement_strategy: AcknowledgementStrategyKind,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1_000,
            cluster_size: 3,
            acknowledgement_strategy: AcknowledgementStrategyKind::EntireCluster,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcknowledgementStrategyKind {
    EntireCluster,
    Majority,
}

/// Node-local topology: identity and where its data lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_id: u8,
    pub data_dir: PathBuf,
    /// `host:port` pairs for the other nodes in the cluster, used to
    /// establish the control, acknowledgement, and data stream
    /// connections to each peer.
    pub peers: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: 0,
            data_dir: PathBuf::from(".fixgw/data"),
            peers: Vec::new(),
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Validates the §6 invariants: `cluster_size` odd and ≥ 3.
    ///
    /// Catching this at load time means a misconfigured node refuses to
    /// start rather than running an election protocol with no well-defined
    /// majority.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.replication.cluster_size;
        if size < 3 || size % 2 == 0 {
            return Err(ConfigError::Validation(format!(
                "cluster_size must be odd and >= 3, got {size}"
            )));
        }
        Ok(())
    }

    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        if self.node.data_dir.is_relative() {
            self.node.data_dir = base_dir.as_ref().join(&self.node.data_dir);
        }
    }

    /// Builds the [`AcknowledgementStrategy`] named by
    /// `replication.acknowledgement_strategy`, sized for this cluster.
    pub fn build_acknowledgement_strategy(&self) -> Box<dyn AcknowledgementStrategy> {
        match self.replication.acknowledgement_strategy {
            AcknowledgementStrategyKind::EntireCluster => {
                Box::new(EntireClusterAcknowledgementStrategy::new(self.replication.cluster_size))
            }
            AcknowledgementStrategyKind::Majority => {
                Box::new(MajorityAcknowledgementStrategy::new(self.replication.cluster_size))
            }
        }
    }
}
