//! Change tracking and editable-object transactions.
//!
//! The ledger keeps the value a property had before its first change in the
//! current edit. `cancel_edit` writes those originals back, `end_edit`
//! forgets them. Both cascade to nested entities when auto-edit is on.

use crate::entity::Entity;
use crate::event::IS_EDITING;
use crate::temporal::{VALID_FROM_PATH, VALID_TO_PATH};
use crate::traverse::{Cascade, Visited};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Original values by property name. The first recorded value wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeLedger {
    originals: BTreeMap<String, Value>,
}

impl ChangeLedger {
    /// Records `original` unless `name` is already present.
    pub fn record(&mut self, name: &str, original: Value) -> bool {
        if self.originals.contains_key(name) {
            return false;
        }
        self.originals.insert(name.to_string(), original);
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.originals.contains_key(name)
    }

    #[must_use]
    pub fn original(&self, name: &str) -> Option<&Value> {
        self.originals.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.originals.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.originals.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn clear(&mut self) {
        self.originals.clear();
    }

    fn take(&mut self) -> BTreeMap<String, Value> {
        std::mem::take(&mut self.originals)
    }
}

impl Entity {
    // ── Writes ──────────────────────────────────────────────────

    /// Sets a property, recording the change and revalidating it.
    ///
    /// Returns `true` when the value actually changed. Unknown and read-only
    /// properties, and values of the wrong type, are ignored.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> bool {
        self.write_property(name, value.into())
    }

    /// Writes a property without touching the ledger, read-only ones
    /// included. For the persistence side populating an entity.
    pub fn load_property(&mut self, name: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let Some(property) = self.kind.property(name) else {
            return false;
        };
        if !value.fits(&property.kind) {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    /// Suppresses change tracking and repository lookups until
    /// [`end_loading`](Self::end_loading).
    pub fn begin_loading(&mut self) {
        self.is_loading = true;
    }

    pub fn end_loading(&mut self) {
        self.is_loading = false;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn write_property(&mut self, name: &str, value: Value) -> bool {
        let Some(property) = self.kind.property(name) else {
            debug!(entity_type = %self.entity_type(), property = %name, "Unknown property, write ignored");
            return false;
        };
        if property.read_only {
            debug!(entity_type = %self.entity_type(), property = %name, "Read-only property, write ignored");
            return false;
        }
        if !value.fits(&property.kind) {
            debug!(entity_type = %self.entity_type(), property = %name, "Value does not fit property type, write ignored");
            return false;
        }

        let current = self.values.get(name).cloned().unwrap_or_default();
        let unchanged = current == value;
        if unchanged && !self.has_property_errors(name) {
            return false;
        }

        self.values.insert(name.to_string(), value.clone());
        if self.is_loading {
            return false;
        }

        self.is_property_valid(name, &value, false);
        if unchanged {
            return false;
        }

        self.record_change(name, current);
        self.notify_property_changed(name);
        true
    }

    /// Enters `original` in the ledger on the first change of `name`. The
    /// first entry of an edit begins it when auto-edit is on.
    pub(crate) fn record_change(&mut self, name: &str, original: Value) {
        if self.ledger.contains(name) {
            return;
        }
        if self.ledger.is_empty() && self.is_auto_edit {
            self.begin_edit();
        }
        trace!(entity_type = %self.entity_type(), property = %name, "Change recorded");
        self.ledger.record(name, original);
    }

    /// Forgets the recorded original of `name`, keeping the current value.
    pub fn remove_changed_property(&mut self, name: &str) -> bool {
        self.ledger.remove(name).is_some()
    }

    // ── Queries ─────────────────────────────────────────────────

    #[must_use]
    pub fn is_property_changed(&self, name: &str) -> bool {
        self.ledger.contains(name)
    }

    #[must_use]
    pub fn changed_property_names(&self) -> Vec<&str> {
        self.ledger.names().collect()
    }

    #[must_use]
    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    /// The entity's own ledger is not empty.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.ledger.is_empty()
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    #[must_use]
    pub fn is_auto_edit(&self) -> bool {
        self.is_auto_edit
    }

    pub fn set_auto_edit(&mut self, auto_edit: bool) {
        self.is_auto_edit = auto_edit;
    }

    /// Whether the entity is marked for deletion in this edit.
    ///
    /// Temporal entities are deleted when their interval is inactive and the
    /// close is still pending in the ledger; a committed close is not a
    /// deletion.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        if self.temporal.is_some() {
            return self.is_inactive() && self.ledger.contains(VALID_TO_PATH);
        }
        self.is_deleted
    }

    /// Something in the graph needs saving: own changes, a new entity not
    /// deleted, a persisted entity deleted, or any nested change.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        let mut visited = Visited::new(self);
        self.has_changes_in(&mut visited)
    }

    fn has_changes_in(&self, visited: &mut Visited) -> bool {
        let is_new = self.is_new();
        let is_deleted = self.is_deleted();
        if self.is_modified() || (is_new && !is_deleted) || (is_deleted && !is_new) {
            return true;
        }
        self.any_nested(visited, |nested, visited| nested.has_changes_in(visited))
    }

    // ── Editable object ─────────────────────────────────────────

    pub fn begin_edit(&mut self) {
        let mut visited = Visited::new(self);
        self.begin_edit_in(&mut visited);
    }

    pub(crate) fn begin_edit_in(&mut self, visited: &mut Visited) {
        debug!(entity_type = %self.entity_type(), "Begin edit");
        self.is_editing = true;
        self.notify_property_changed(IS_EDITING);
        if self.is_auto_edit {
            self.for_each_nested(Cascade::Edit, visited, |nested, visited| {
                nested.begin_edit_in(visited)
            });
        }
    }

    /// Commits: forgets recorded originals and leaves edit mode. A closed
    /// interval stops being a pending delete.
    pub fn end_edit(&mut self) {
        let mut visited = Visited::new(self);
        self.end_edit_in(&mut visited);
    }

    pub(crate) fn end_edit_in(&mut self, visited: &mut Visited) {
        debug!(entity_type = %self.entity_type(), changes = self.ledger.len(), "End edit");
        self.ledger.clear();
        if let Some(temporal) = self.temporal.as_mut() {
            temporal.set_deleting(false);
        }
        self.is_editing = false;
        self.notify_property_changed(IS_EDITING);
        if self.is_auto_edit {
            self.for_each_nested(Cascade::Edit, visited, |nested, visited| {
                nested.end_edit_in(visited)
            });
        }
        if let Some(validation) = self.validation.as_mut() {
            validation.clear();
        }
    }

    /// Rolls back: restores recorded originals, undoes a pending delete,
    /// drops new members of composite collections, then commits.
    pub fn cancel_edit(&mut self) {
        let mut visited = Visited::new(self);
        self.cancel_edit_in(&mut visited);
    }

    pub(crate) fn cancel_edit_in(&mut self, visited: &mut Visited) {
        debug!(entity_type = %self.entity_type(), changes = self.ledger.len(), "Cancel edit");
        self.rollback();
        self.is_deleted = false;
        if let Some(temporal) = self.temporal.as_mut() {
            temporal.set_deleting(false);
        }

        if self.is_auto_edit {
            self.for_each_nested(Cascade::Edit, visited, |nested, visited| {
                nested.cancel_edit_in(visited)
            });
        }

        self.drop_new_composite_members();
        self.end_edit_in(visited);
    }

    /// Writes every recorded original back. An entry that cannot be
    /// restored is skipped; the others still are.
    fn rollback(&mut self) {
        for (name, original) in self.ledger.take() {
            if !self.restore(&name, original) {
                warn!(entity_type = %self.entity_type(), property = %name, "Rollback skipped, property cannot be restored");
            }
        }
    }

    fn restore(&mut self, name: &str, original: Value) -> bool {
        if name == VALID_FROM_PATH || name == VALID_TO_PATH {
            return self.restore_interval(name, &original);
        }
        match self.kind.property(name) {
            Some(property) if !property.read_only => {
                self.values.insert(name.to_string(), original);
                true
            }
            _ => false,
        }
    }

    fn drop_new_composite_members(&mut self) {
        let kind = Arc::clone(&self.kind);
        for name in kind.metadata().composite_aggregations() {
            if let Some(Value::Collection(items)) = self.values.get_mut(name) {
                items.retain(|item| item.try_borrow().map(|e| !e.is_new()).unwrap_or(true));
            }
        }
    }

    // ── Deletion ────────────────────────────────────────────────

    /// Marks the entity, and the owned part of its graph, deleted. Temporal
    /// entities close their interval instead.
    pub fn delete(&mut self) {
        let mut visited = Visited::new(self);
        self.delete_in(&mut visited);
    }

    pub(crate) fn delete_in(&mut self, visited: &mut Visited) {
        debug!(entity_type = %self.entity_type(), "Delete");
        if self.temporal.is_some() {
            self.close_interval();
        } else {
            self.is_deleted = true;
        }
        self.for_each_nested(Cascade::Delete, visited, |nested, visited| nested.delete_in(visited));
    }

    /// Reverses [`delete`](Self::delete). For temporal entities this is a
    /// full [`cancel_edit`](Self::cancel_edit) followed by reopening the
    /// interval.
    pub fn undo_delete(&mut self) {
        let mut visited = Visited::new(self);
        self.undo_delete_in(&mut visited);
    }

    pub(crate) fn undo_delete_in(&mut self, visited: &mut Visited) {
        debug!(entity_type = %self.entity_type(), "Undo delete");
        if self.temporal.is_some() {
            self.cancel_edit();
            self.reopen_interval();
        } else {
            self.is_deleted = false;
        }
        self.for_each_nested(Cascade::Delete, visited, |nested, visited| {
            nested.undo_delete_in(visited)
        });
    }
}
