//! Remote session collaborators.
//!
//! A remote session is either a bare point-to-point connection to a server
//! (host and port only) or an orchestrated session whose session manager can
//! issue short-lived auth tokens and which advertises a canonical connection
//! URL. Optional capabilities are expressed as methods returning `Option`,
//! with defaults for sessions that lack them.

use std::collections::BTreeMap;
use std::convert::Infallible;

use base64::prelude::*;

use crate::error::{SessionError, WidgetError};
use crate::target::Displayable;

/// Transport header carrying the routing prefix of an intermediary proxy.
pub const ENVOY_PREFIX_HEADER: &[u8] = b"envoy-prefix";

/// Role requested when issuing a token for the iframe.
pub const QUERY_PROCESSOR_ROLE: &str = "RemoteQueryProcessor";

/// A serialized authorization token issued by a session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMessage {
    bytes: Vec<u8>,
}

impl TokenMessage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Standard base64 of the serialized token, as handed to the front-end.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }
}

/// Client able to issue tokens for a given role.
pub trait AuthClient {
    fn get_token(&self, role: &str) -> Result<TokenMessage, SessionError>;
}

/// Manager of an orchestrated session.
pub trait SessionManager {
    fn auth_client(&self) -> &dyn AuthClient;
}

/// A session with a remote server.
pub trait RemoteSession {
    /// Object handle this session can bind under a name.
    type Handle;

    fn host(&self) -> &str;

    fn port(&self) -> u16;

    /// Value of a transport-level header, if the session carries one.
    fn extra_header(&self, _name: &[u8]) -> Option<Vec<u8>> {
        None
    }

    /// Session manager, present only for orchestrated sessions.
    fn session_manager(&self) -> Option<&dyn SessionManager> {
        None
    }

    /// Static connection URL advertised by the session's coordinator.
    fn static_url(&self) -> Result<String, SessionError> {
        Err(SessionError::new(
            "session does not advertise a static connection URL",
        ))
    }

    /// Bind `handle` under `name` in the remote session's scope.
    fn bind_table(&self, name: &str, handle: &Self::Handle) -> Result<(), SessionError>;
}

/// A bare point-to-point session described by its address.
///
/// Such a session has no object handles of its own, so it can only display
/// objects that are already bound remotely by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectSession {
    host: String,
    port: u16,
    headers: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl DirectSession {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            headers: BTreeMap::new(),
        }
    }

    /// Attach a transport header.
    pub fn with_header(mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl RemoteSession for DirectSession {
    type Handle = Infallible;

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn extra_header(&self, name: &[u8]) -> Option<Vec<u8>> {
        self.headers.get(name).cloned()
    }

    fn bind_table(&self, _name: &str, handle: &Infallible) -> Result<(), SessionError> {
        match *handle {}
    }
}

impl Displayable for Infallible {
    type Session = DirectSession;

    fn type_identity(&self) -> String {
        match *self {}
    }

    fn session(&self) -> Result<Option<DirectSession>, WidgetError> {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_base64() {
        let token = TokenMessage::new(vec![0x01, 0x02]);
        assert_eq!(token.to_base64(), "AQI=");
        assert_eq!(token.as_bytes(), &[0x01, 0x02]);
    }

    #[test]
    fn test_direct_session_headers() {
        let session = DirectSession::new("h", 1234).with_header(ENVOY_PREFIX_HEADER, "abc");
        assert_eq!(session.host(), "h");
        assert_eq!(session.port(), 1234);
        assert_eq!(
            session.extra_header(ENVOY_PREFIX_HEADER),
            Some(b"abc".to_vec())
        );
        assert_eq!(session.extra_header(b"other"), None);
        assert!(session.session_manager().is_none());
        assert!(session.static_url().is_err());
    }
}
