//! The default [`OutboundSink`] for a running node: logs every outbound
//! frame instead of writing to a socket, since wiring a real network
//! transport is outside this workspace's scope (§1 of `spec.md`).

use fixgw_types::ConnectionId;

use crate::wire_proxy::OutboundSink;

pub struct TracingSink;

impl OutboundSink for TracingSink {
    fn send(&mut self, connection_id: ConnectionId, bytes: Vec<u8>) {
        tracing::debug!(
            connection = %connection_id,
            bytes = bytes.len(),
            "outbound FIX frame"
        );
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        tracing::info!(connection = %connection_id, "session requested disconnect");
    }
}
