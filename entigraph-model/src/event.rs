//! Change notifications for binding consumers.

use std::fmt;
use std::rc::Rc;

pub const IS_EDITING: &str = "IsEditing";
pub const IS_ACTIVE: &str = "IsActive";
pub const HAS_ERRORS: &str = "HasErrors";
pub const HAS_GRAPH_ERRORS: &str = "HasGraphErrors";

/// Something observable about an entity changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityEvent {
    /// A property, or a derived flag such as [`IS_EDITING`], changed.
    PropertyChanged(String),
    /// The validation errors for a property changed.
    ErrorsChanged(String),
}

pub type Listener = Rc<dyn Fn(&EntityEvent)>;

#[derive(Default, Clone)]
pub(crate) struct Notifier {
    listeners: Vec<Listener>,
}

impl Notifier {
    pub(crate) fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&self, event: EntityEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Notifier({} listeners)", self.listeners.len())
    }
}
