//! Pluggable acceptor-side authentication.

use fixgw_types::SessionKey;

/// Validates credentials carried on an inbound Logon. Injected at
/// `Session` construction so the state machine itself never knows whether
/// credentials come from a config file, an LDAP lookup, or a test double.
pub trait AuthenticationStrategy: Send {
    fn authenticate(
        &self,
        session_key: &SessionKey,
        username: Option<&str>,
        password: Option<&str>,
    ) -> bool;
}

/// Accepts every Logon unconditionally. Used by initiator sessions (which
/// never receive a Logon to authenticate) and by tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllAuthenticator;

impl AuthenticationStrategy for AcceptAllAuthenticator {
    fn authenticate(&self, _session_key: &SessionKey, _username: Option<&str>, _password: Option<&str>) -> bool {
        true
    }
}

/// Checks the inbound username/password against one fixed pair.
#[derive(Debug, Clone)]
pub struct StaticCredentialsAuthenticator {
    pub username: String,
    pub password: String,
}

impl AuthenticationStrategy for StaticCredentialsAuthenticator {
    fn authenticate(&self, _session_key: &SessionKey, username: Option<&str>, password: Option<&str>) -> bool {
        username == Some(self.username.as_str()) && password == Some(self.password.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credentials_reject_mismatch() {
        let auth = StaticCredentialsAuthenticator {
            username: "bob".into(),
            password: "secret".into(),
        };
        let key = SessionKey::new("A".into(), "".into(), "B".into());
        assert!(!auth.authenticate(&key, Some("bob"), Some("wrong")));
        assert!(auth.authenticate(&key, Some("bob"), Some("secret")));
    }
}
