//! Objects that can be displayed.

use crate::error::WidgetError;
use crate::kind::{classify, DisplayKind};
use crate::session::RemoteSession;

/// A value the widget can display.
///
/// Implementations only report their type identity and, for remote handles,
/// the session that owns them. The widget never copies or mutates the value.
pub trait Displayable {
    type Session: RemoteSession<Handle = Self>;

    /// Module-qualified class name, e.g. `deephaven.table.Table`.
    fn type_identity(&self) -> String;

    /// Session owning this object, if it is a remote handle.
    ///
    /// A session that is attached but unreadable is a
    /// `WidgetError::Configuration`, not `None`.
    fn session(&self) -> Result<Option<Self::Session>, WidgetError>;
}

/// What the caller asked to display.
#[derive(Debug)]
pub enum DisplayTarget<'a, O> {
    /// A live object reference.
    Object(&'a O),
    /// The name of an object already bound in a remote session.
    Named(&'a str),
}

impl<O> Clone for DisplayTarget<'_, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for DisplayTarget<'_, O> {}

impl<O: Displayable> DisplayTarget<'_, O> {
    /// Type identity, empty for bare names.
    pub fn type_identity(&self) -> String {
        match self {
            DisplayTarget::Object(obj) => obj.type_identity(),
            DisplayTarget::Named(_) => String::new(),
        }
    }

    /// Display kind of the target.
    ///
    /// Bare names are only ever produced by table binding, so they route to
    /// the table page without inspecting anything.
    pub fn kind(&self) -> DisplayKind {
        match self {
            DisplayTarget::Object(obj) => classify(&obj.type_identity()),
            DisplayTarget::Named(_) => DisplayKind::Table,
        }
    }
}
