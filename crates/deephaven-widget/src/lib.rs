//! deephaven-widget - Embed Deephaven tables and charts in interactive consoles.
//!
//! A widget wraps an object that lives either in this process (served by the
//! embedded local server) or in a remote session, and produces the URL of an
//! iframe page that renders it. The object is made reachable under a generated
//! identifier so the server can fetch it when the iframe asks.
//!
//! The front-end bridge, the iframe itself, and the servers are provided by the
//! host. This crate talks to them through the traits in [`session`],
//! [`endpoint`], [`registry`], [`overrides`], [`view`] and [`shutdown`].

pub mod endpoint;
pub mod error;
pub mod iframe;
pub mod kind;
pub mod object_id;
pub mod overrides;
pub mod registry;
pub mod session;
pub mod settings;
pub mod shutdown;
pub mod target;
pub mod view;
pub mod widget;

pub use endpoint::{EndpointDescriptor, LocalServer, StaticServer};
pub use error::{SessionError, WidgetError};
pub use kind::{classify, DisplayKind};
pub use object_id::ObjectId;
pub use registry::{ObjectRegistry, ObjectStore};
pub use session::{AuthClient, DirectSession, RemoteSession, SessionManager, TokenMessage};
pub use settings::Settings;
pub use shutdown::{ShutdownHooks, ShutdownListener};
pub use target::{DisplayTarget, Displayable};
pub use view::{AttributeSink, ViewState};
pub use widget::{DeephavenWidget, Lifecycle, WidgetAttributes, WidgetHost, WidgetOptions};
