//! Endpoint resolution.
//!
//! Decides which server the iframe talks to and with what credentials:
//!
//! 1. A bare name refers to an object bound in the caller-supplied session.
//! 2. A remote table handle is served by the session that owns it.
//! 3. Anything else lives in this process and is served by the local server.
//!
//! Orchestrated sessions (those with a session manager) always use the
//! centrally advertised static URL and a freshly issued auth token.

use log::{debug, info};

use crate::error::WidgetError;
use crate::iframe::QueryParams;
use crate::kind::{is_remote_table, DisplayKind};
use crate::registry::Placement;
use crate::session::{RemoteSession, ENVOY_PREFIX_HEADER, QUERY_PROCESSOR_ROLE};
use crate::target::{DisplayTarget, Displayable};

/// Query parameter carrying the proxy routing prefix.
pub const ENVOY_PREFIX_PARAM: &str = "envoyPrefix";

/// Query parameter telling the iframe to take auth from its parent frame.
pub const AUTH_PROVIDER_PARAM: &str = "authProvider";

/// Accessor for the server running in this process.
pub trait LocalServer {
    /// Port the server listens on. Fails if no server is running.
    fn port(&self) -> Result<u16, WidgetError>;
}

/// A local server known to listen on a fixed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticServer(pub u16);

impl LocalServer for StaticServer {
    fn port(&self) -> Result<u16, WidgetError> {
        Ok(self.0)
    }
}

/// Server endpoint the iframe loads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub base_url: String,
    /// Base64 token, empty when no authentication is needed.
    pub auth_token: String,
    pub extra_params: QueryParams,
}

impl EndpointDescriptor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: String::new(),
            extra_params: QueryParams::new(),
        }
    }
}

/// Outcome of resolving a display target.
pub struct Resolution<S> {
    pub endpoint: EndpointDescriptor,
    pub kind: DisplayKind,
    /// Raw port of the serving process, used for proxy rewriting.
    pub port: u16,
    pub placement: Placement<S>,
}

/// Resolve the endpoint for `target`.
///
/// `session` is only consulted for bare names; remote handles carry their own.
pub fn resolve<O: Displayable>(
    target: DisplayTarget<'_, O>,
    session: Option<&O::Session>,
    local: &dyn LocalServer,
) -> Result<Resolution<O::Session>, WidgetError> {
    let kind = target.kind();

    match target {
        DisplayTarget::Named(name) => {
            let session = session.ok_or_else(|| {
                WidgetError::Configuration(format!(
                    "a session must be supplied to display remote object `{}` by name",
                    name
                ))
            })?;
            let endpoint = inspect_session(session)?;
            Ok(Resolution {
                endpoint,
                kind,
                port: session.port(),
                placement: Placement::Bound,
            })
        }
        DisplayTarget::Object(obj) if is_remote_table(&obj.type_identity()) => {
            let session = obj.session()?.ok_or_else(|| {
                WidgetError::Configuration(format!(
                    "`{}` object has no attached session",
                    obj.type_identity()
                ))
            })?;
            let endpoint = inspect_session(&session)?;
            Ok(Resolution {
                endpoint,
                kind,
                port: session.port(),
                placement: Placement::Remote(session),
            })
        }
        DisplayTarget::Object(_) => {
            if session.is_some() {
                debug!("[endpoint] Ignoring session for in-process object");
            }
            let port = local.port()?;
            Ok(Resolution {
                endpoint: EndpointDescriptor::new(format!("http://localhost:{}/", port)),
                kind,
                port,
                placement: Placement::Local,
            })
        }
    }
}

/// Derive the endpoint of a remote session.
pub fn inspect_session<S: RemoteSession + ?Sized>(
    session: &S,
) -> Result<EndpointDescriptor, WidgetError> {
    let mut endpoint =
        EndpointDescriptor::new(format!("http://{}:{}/", session.host(), session.port()));

    if let Some(prefix) = session.extra_header(ENVOY_PREFIX_HEADER) {
        let prefix = String::from_utf8(prefix)
            .ok()
            .filter(|p| p.is_ascii())
            .ok_or_else(|| {
                WidgetError::Configuration("routing prefix header is not ASCII".to_string())
            })?;
        endpoint.extra_params.insert(ENVOY_PREFIX_PARAM, prefix);
    }

    if let Some(manager) = session.session_manager() {
        endpoint.extra_params.insert(AUTH_PROVIDER_PARAM, "parent");
        let token = manager
            .auth_client()
            .get_token(QUERY_PROCESSOR_ROLE)
            .map_err(WidgetError::AuthToken)?;
        endpoint.auth_token = token.to_base64();
        endpoint.base_url = session
            .static_url()
            .map_err(WidgetError::ConnectionDetails)?;
        info!(
            "[endpoint] Orchestrated session at {}:{}, using {}",
            session.host(),
            session.port(),
            endpoint.base_url
        );
    }

    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DirectSession;
    use std::convert::Infallible;

    #[test]
    fn test_direct_session_endpoint() {
        let endpoint = inspect_session(&DirectSession::new("h", 1234)).unwrap();
        assert_eq!(endpoint.base_url, "http://h:1234/");
        assert_eq!(endpoint.auth_token, "");
        assert!(endpoint.extra_params.is_empty());
    }

    #[test]
    fn test_envoy_prefix_becomes_param() {
        let session = DirectSession::new("h", 1234).with_header("envoy-prefix", "/w/1");
        let endpoint = inspect_session(&session).unwrap();
        assert_eq!(endpoint.extra_params.get("envoyPrefix"), Some("/w/1"));
        assert_eq!(endpoint.extra_params.get("authProvider"), None);
    }

    #[test]
    fn test_non_ascii_prefix_is_rejected() {
        let session = DirectSession::new("h", 1).with_header("envoy-prefix", vec![0xc3, 0xa9]);
        let err = inspect_session(&session).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_named_target_requires_session() {
        let result = resolve::<Infallible>(DisplayTarget::Named("t"), None, &StaticServer(1));
        match result {
            Err(err) => assert!(err.is_configuration()),
            Ok(_) => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_named_target_uses_session_port() {
        let session = DirectSession::new("remote", 10000);
        let resolution = resolve::<Infallible>(
            DisplayTarget::Named("t"),
            Some(&session),
            &StaticServer(9876),
        )
        .unwrap();
        assert_eq!(resolution.endpoint.base_url, "http://remote:10000/");
        assert_eq!(resolution.port, 10000);
        assert_eq!(resolution.kind, DisplayKind::Table);
        assert!(matches!(resolution.placement, Placement::Bound));
    }
}
