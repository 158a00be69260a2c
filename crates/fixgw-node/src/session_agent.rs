//! Adapts one [`Session`] into an [`Agent`]: pulls inbound wire frames off
//! a transport subscription, drives the state machine, and lets outbound
//! effects flow out through a [`WireProxy`] onto an [`OutboundSink`].

use fixgw_session::{AuthenticationStrategy, Session, SessionParser};
use fixgw_transport::Subscription;
use fixgw_types::{AsciiId, SessionKey};

use crate::agent::Agent;
use crate::wire_proxy::{OutboundSink, WireProxy};

/// Bounded fragments pulled off the inbound subscription per `poll` (§5:
/// "Long work is chunked via `FRAGMENT_LIMIT`").
const FRAGMENT_LIMIT: usize = 64;

pub struct SessionAgent<A: AuthenticationStrategy> {
    session: Session<A>,
    inbound: Subscription,
    begin_string: String,
    fallback_key: SessionKey,
    sink: Box<dyn OutboundSink>,
}

impl<A: AuthenticationStrategy> SessionAgent<A> {
    pub fn new(
        session: Session<A>,
        inbound: Subscription,
        begin_string: impl Into<String>,
        sink: Box<dyn OutboundSink>,
    ) -> Self {
        let empty = AsciiId::from("");
        Self {
            session,
            inbound,
            begin_string: begin_string.into(),
            fallback_key: SessionKey::new(empty, empty, empty),
            sink,
        }
    }

    fn current_key(&self) -> SessionKey {
        self.session.session_key.unwrap_or(self.fallback_key)
    }
}

impl<A: AuthenticationStrategy + Send> Agent for SessionAgent<A> {
    fn name(&self) -> &str {
        "session"
    }

    fn poll(&mut self, now_ms: i64) -> usize {
        let mut frames: Vec<Vec<u8>> = Vec::new();
        let mut work = self
            .inbound
            .poll(&mut |_session_id, _position, data: &[u8]| frames.push(data.to_vec()), FRAGMENT_LIMIT);

        for raw in frames {
            let key = self.current_key();
            let connection_id = self.session.connection_id;
            let mut proxy = WireProxy::new(connection_id, self.begin_string.clone(), key, self.sink.as_mut());
            SessionParser::handle(&mut self.session, &raw, now_ms, &mut proxy);
        }

        let key = self.current_key();
        let connection_id = self.session.connection_id;
        let mut proxy = WireProxy::new(connection_id, self.begin_string.clone(), key, self.sink.as_mut());
        work += self.session.poll(now_ms, &mut proxy);
        work
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixgw_fix_codec::builder;
    use fixgw_session::{AcceptAllAuthenticator, SessionConfig};
    use fixgw_transport::{Publication, TransportLog};
    use fixgw_types::{ConnectionId, SessionId};

    use crate::wire_proxy::RecordingSink;

    #[test]
    fn inbound_logon_produces_an_outbound_logon_accepted() {
        let publication = Publication::new(TransportLog::new(SessionId::new(1)));
        let inbound = publication.subscription();

        let session = Session::new_acceptor(
            SessionId::new(1),
            ConnectionId::new(1),
            SessionConfig {
                begin_string: "FIX.4.4".into(),
                sending_time_window_ms: 120_000,
                default_heartbeat_interval_secs: 30,
            },
            AcceptAllAuthenticator,
        );

        let mut agent = SessionAgent::new(session, inbound, "FIX.4.4", Box::new(RecordingSink::default()));

        let raw = builder::logon("FIX.4.4", "PEER", "", "GATEWAY", 1, 30, None, None);
        publication.offer(&raw).unwrap();

        let work = agent.poll(0);
        assert!(work >= 1);
    }
}
