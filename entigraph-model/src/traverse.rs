//! One-hop traversal through nesting-list properties.
//!
//! Every recursive graph operation goes through here. A [`Visited`] set is
//! threaded through the recursion so back-references and diamonds are
//! handled once, and a handle that is already borrowed further up the stack
//! is skipped rather than re-entered.

use crate::entity::Entity;
use crate::value::{EntityRef, Value};
use std::collections::HashSet;
use tracing::{trace, warn};

/// What a cascade is for. Delete-family cascades stay out of shared
/// aggregations: those are owned elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cascade {
    Edit,
    Delete,
}

/// Entities already reached by the current operation, by address.
#[derive(Debug, Default)]
pub(crate) struct Visited(HashSet<usize>);

impl Visited {
    pub(crate) fn new(root: &Entity) -> Self {
        let mut visited = Self::default();
        visited.0.insert(root as *const Entity as usize);
        visited
    }

    /// Marks `item` visited; `false` if it already was.
    pub(crate) fn enter(&mut self, item: &EntityRef) -> bool {
        self.0.insert(item.addr())
    }
}

impl Entity {
    /// Handles reachable in one hop through properties whose declared type
    /// is on the nesting list.
    pub(crate) fn nested_entities(&self, cascade: Cascade) -> Vec<EntityRef> {
        let metadata = self.kind.metadata();
        let mut nested = Vec::new();

        for property in self.kind.properties() {
            if !property.kind.is_nested() || !metadata.is_nesting(&property.kind) {
                continue;
            }
            if cascade == Cascade::Delete && metadata.is_shared_type(&property.kind) {
                continue;
            }
            match self.values.get(&property.name) {
                Some(Value::Entity(item)) => nested.push(item.clone()),
                Some(Value::Collection(items)) => nested.extend(items.iter().cloned()),
                _ => {}
            }
        }

        nested
    }

    /// Applies `action` to each nested entity not yet visited.
    pub(crate) fn for_each_nested<F>(&self, cascade: Cascade, visited: &mut Visited, mut action: F)
    where
        F: FnMut(&mut Entity, &mut Visited),
    {
        for item in self.nested_entities(cascade) {
            if !visited.enter(&item) {
                trace!(entity_type = %self.entity_type(), "Nested entity already visited");
                continue;
            }
            match item.try_borrow_mut() {
                Ok(mut nested) => action(&mut nested, visited),
                Err(_) => warn!(
                    entity_type = %self.entity_type(),
                    "Nested entity is borrowed elsewhere, skipped"
                ),
            }
        }
    }

    /// Whether `predicate` holds for any nested entity not yet visited.
    pub(crate) fn any_nested<F>(&self, visited: &mut Visited, mut predicate: F) -> bool
    where
        F: FnMut(&Entity, &mut Visited) -> bool,
    {
        for item in self.nested_entities(Cascade::Edit) {
            if !visited.enter(&item) {
                continue;
            }
            let Ok(nested) = item.try_borrow() else {
                warn!(
                    entity_type = %self.entity_type(),
                    "Nested entity is mutably borrowed, skipped"
                );
                continue;
            };
            if predicate(&nested, visited) {
                return true;
            }
        }
        false
    }
}
