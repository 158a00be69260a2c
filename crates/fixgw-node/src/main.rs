//! Gateway node: CLI entry point, configuration loading, agent
//! composition, and process wiring (§1.5, §5). Wires the session engine
//! and replication core onto the in-process reference transport and
//! drives them with the agent runner until a shutdown signal arrives.

mod agent;
mod role_agent;
mod session_agent;
mod shutdown;
mod tracing_sink;
mod wire_proxy;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fixgw_cluster::ClusterPublication;
use fixgw_config::GatewayConfig;
use fixgw_replication::{InMemoryArchive, InMemoryArchiver, RoleEngine};
use fixgw_session::{AcceptAllAuthenticator, Session, SessionConfig};
use fixgw_transport::{Publication, TransportLog};
use fixgw_types::{ConnectionId, SessionId};

use crate::agent::{Agent, AgentRunner};
use crate::role_agent::RoleAgent;
use crate::session_agent::SessionAgent;
use crate::shutdown::ShutdownFlag;
use crate::tracing_sink::TracingSink;

#[derive(Parser)]
#[command(name = "gateway")]
#[command(author, version, about = "FIX session gateway with Raft-style replication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway node: loads configuration, builds the session
    /// and replication agents, and runs until `SIGINT`/`SIGTERM`.
    Run {
        /// Directory to load `gateway.toml` / `gateway.local.toml` from.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration and exit.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn load_config(project_dir: Option<PathBuf>) -> Result<GatewayConfig> {
    let config = match project_dir {
        Some(dir) => GatewayConfig::load_from_dir(dir),
        None => GatewayConfig::load(),
    }
    .context("failed to load gateway configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(config),
        Commands::Config { config } => {
            let config = load_config(config)?;
            println!("{}", toml::to_string_pretty(&config_as_serializable(&config))?);
            Ok(())
        }
    }
}

/// `GatewayConfig` is already `Serialize`; this just gives the `Config`
/// subcommand a stable point to hang future redaction logic on.
fn config_as_serializable(config: &GatewayConfig) -> &GatewayConfig {
    config
}

fn run(project_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(project_dir)?;
    tracing::info!(node_id = config.node.node_id, cluster_size = config.replication.cluster_size, "starting gateway node");

    let shutdown = ShutdownFlag::new();
    shutdown
        .install_signal_handlers()
        .context("failed to install signal handlers")?;

    let own_node_id = fixgw_types::NodeId::new(config.node.node_id);
    let own_session_id = SessionId::new(u64::from(config.node.node_id) + 1);

    let strategy = config.build_acknowledgement_strategy();
    let engine = RoleEngine::new_follower(
        own_node_id,
        now_ms(),
        config.replication.timeout_ms,
        config.replication.cluster_size,
        strategy,
    );

    let control = Publication::new(TransportLog::new(own_session_id));
    let ack = Publication::new(TransportLog::new(own_session_id));
    // The replicated data stream: once this node wins leadership, its
    // session agents' outbound FIX traffic is written here (through
    // `ClusterPublication`, which only accepts claims while leader) so
    // followers' archivers pick it up. A standalone wire log carries the
    // raw bytes a real network transport would deliver from the peer.
    let data = Publication::new(TransportLog::new(own_session_id));
    let wire = Publication::new(TransportLog::new(own_session_id));

    let role_agent = RoleAgent::new(
        engine,
        own_session_id,
        control.clone(),
        control.subscription(),
        ack.clone(),
        ack.subscription(),
    );

    // Wired but not yet driven from the session agent in this reference
    // node: routing a session's outbound bytes through leadership-gated
    // claims is the natural next step once a real transport is plugged
    // in above `fixgw-transport`.
    let _cluster_publication = ClusterPublication::new(data.clone(), own_session_id);

    let archive = InMemoryArchive::new();
    let archiver = InMemoryArchiver::new(data.subscription(), archive.reader(), 64);

    let session = Session::new_acceptor(
        own_session_id,
        ConnectionId::new(1),
        SessionConfig {
            begin_string: config.fix.begin_string.clone(),
            sending_time_window_ms: config.fix.sending_time_window_ms,
            default_heartbeat_interval_secs: config.fix.default_heartbeat_interval_secs,
        },
        AcceptAllAuthenticator,
    );
    let inbound = wire.subscription();
    let session_agent = SessionAgent::new(
        session,
        inbound,
        config.fix.begin_string.clone(),
        Box::new(TracingSink),
    );

    let archiver_agent = ArchiverAgent { archiver, name: "archiver" };

    let mut runner = AgentRunner::new(Duration::from_millis(5));
    runner.add_group(vec![Box::new(role_agent) as Box<dyn Agent>]);
    runner.add_group(vec![Box::new(session_agent) as Box<dyn Agent>]);
    runner.add_group(vec![Box::new(archiver_agent) as Box<dyn Agent>]);

    runner.run(shutdown);
    tracing::info!("gateway node stopped");
    Ok(())
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Adapts the archiver collaborator into the same cooperative `poll`
/// shape as every other agent, so it rides the runner's round-robin
/// alongside the role and session agents instead of needing its own
/// bespoke scheduling.
struct ArchiverAgent {
    archiver: InMemoryArchiver,
    name: &'static str,
}

impl Agent for ArchiverAgent {
    fn name(&self) -> &str {
        self.name
    }

    fn poll(&mut self, _now_ms: i64) -> usize {
        fixgw_replication::Archiver::poll(&mut self.archiver)
    }
}
