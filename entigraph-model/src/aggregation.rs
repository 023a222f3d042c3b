//! Hiding and showing shared aggregations.
//!
//! Shared sub-graphs are owned elsewhere; before an entity graph is persisted
//! or transmitted they are detached so they are not written twice, then put
//! back. Neither direction touches the change ledger.

use crate::entity::Entity;
use crate::traverse::{Cascade, Visited};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

impl Entity {
    /// Detaches every shared, non-independent aggregation in the graph.
    ///
    /// A property already captured by an earlier hide keeps its first
    /// captured value.
    pub fn hide_shared_aggregations(&mut self) {
        let mut visited = Visited::new(self);
        self.hide_in(&mut visited);
    }

    fn hide_in(&mut self, visited: &mut Visited) {
        let kind = Arc::clone(&self.kind);
        let shared = kind.metadata().shared_aggregations();
        if !shared.is_empty() {
            let store = self.hidden.get_or_insert_with(BTreeMap::new);
            for name in shared {
                if store.contains_key(name) {
                    continue;
                }
                let live = self.values.insert(name.clone(), Value::Null).unwrap_or_default();
                store.insert(name.clone(), live);
            }
            debug!(entity_type = %kind.name(), hidden = store.len(), "Shared aggregations hidden");
        }

        self.for_each_nested(Cascade::Edit, visited, |nested, visited| nested.hide_in(visited));
    }

    /// Reattaches what the last hide detached, graph-wide, and discards the
    /// store. Properties that were given a value in the meantime keep it.
    pub fn show_shared_aggregations(&mut self) {
        let mut visited = Visited::new(self);
        self.show_in(&mut visited);
    }

    fn show_in(&mut self, visited: &mut Visited) {
        let kind = Arc::clone(&self.kind);
        if let Some(store) = self.hidden.as_mut() {
            for name in kind.metadata().shared_aggregations() {
                let absent = self.values.get(name).is_none_or(Value::is_null);
                if !absent {
                    continue;
                }
                if let Some(stored) = store.remove(name) {
                    self.values.insert(name.clone(), stored);
                }
            }
            debug!(entity_type = %kind.name(), "Shared aggregations shown");
        }

        self.for_each_nested(Cascade::Edit, visited, |nested, visited| nested.show_in(visited));
        self.hidden = None;
    }

    /// Whether a hide detached shared aggregations on this entity.
    #[must_use]
    pub fn has_hidden_aggregations(&self) -> bool {
        self.hidden.is_some()
    }

    #[must_use]
    pub fn has_composite_aggregations(&self) -> bool {
        !self.kind.metadata().composite_aggregations().is_empty()
    }

    /// Names of composite (owned) aggregation properties.
    #[must_use]
    pub fn composite_aggregations(&self) -> &[String] {
        self.kind.metadata().composite_aggregations()
    }
}
