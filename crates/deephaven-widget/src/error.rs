//! Error types for widget construction.

/// Failure reported by an external collaborator (remote session, session
/// manager, host registry, front-end view).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SessionError {
    message: String,
}

impl SessionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error type for widget construction.
///
/// Every variant is fatal: construction aborts before any attribute is
/// published and before the shutdown hook is registered.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to bind `{name}` in remote session: {source}")]
    RemoteBind {
        name: String,
        #[source]
        source: SessionError,
    },

    #[error("Failed to obtain auth token: {0}")]
    AuthToken(#[source] SessionError),

    #[error("Failed to query session connection details: {0}")]
    ConnectionDetails(#[source] SessionError),

    #[error("Local server unavailable: {0}")]
    LocalServer(#[source] SessionError),

    #[error("Failed to register `{name}` in the object registry: {source}")]
    Registry {
        name: String,
        #[source]
        source: SessionError,
    },

    #[error("Failed to publish widget attributes: {0}")]
    Publish(#[source] SessionError),
}

impl WidgetError {
    /// True for caller mistakes (as opposed to collaborator failures).
    pub fn is_configuration(&self) -> bool {
        matches!(self, WidgetError::Configuration(_))
    }
}
