//! Validation errors collected on entities.
//!
//! `invalidate` runs the type's validator and routes each finding to the
//! entity it targets, which may be a nested entity rather than the one being
//! validated. Errors are kept per entity and queried graph-wide.

use crate::entity::Entity;
use crate::event::{HAS_ERRORS, HAS_GRAPH_ERRORS};
use crate::traverse::Visited;
use crate::validator::ValidationError;
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Errors currently recorded on one entity, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ValidationState {
    errors: Vec<ValidationError>,
}

impl ValidationState {
    pub(crate) fn clear(&mut self) {
        self.errors.clear();
    }
}

impl Entity {
    /// Clears the errors, reruns the validator and stores what it reports.
    /// A no-op for types without the validation capability.
    pub fn invalidate(&mut self) {
        if self.validation.is_none() {
            return;
        }
        self.clear_validation_errors();

        let kind = Arc::clone(&self.kind);
        let results = kind
            .validator()
            .map(|validator| validator.validate(&*self))
            .unwrap_or_default();
        debug!(entity_type = %self.entity_type(), findings = results.len(), "Invalidated");

        for result in results {
            let Some(key) = result.key else {
                continue;
            };
            match result.target {
                Some(target) if target.addr() != self as *const Entity as usize => {
                    match target.try_borrow_mut() {
                        Ok(mut nested) => {
                            let error = ValidationError::new(&key, &result.message, &nested.to_string());
                            nested.add_validation_errors([error]);
                        }
                        Err(_) => warn!(
                            entity_type = %self.entity_type(),
                            property = %key,
                            "Validation target is borrowed, finding dropped"
                        ),
                    }
                }
                _ => {
                    let error = ValidationError::new(&key, &result.message, &self.to_string());
                    self.add_validation_errors([error]);
                }
            }
        }

        self.notify_property_changed(HAS_ERRORS);
        self.notify_property_changed(HAS_GRAPH_ERRORS);
    }

    /// Without `force_validation`, reports whether `name` is free of recorded
    /// errors and drops a stale one if so.
    ///
    /// With `force_validation`, revalidates the whole entity and returns
    /// whether it now has any error at all, whatever `name` is.
    pub fn is_property_valid(&mut self, name: &str, _value: &Value, force_validation: bool) -> bool {
        if force_validation {
            self.invalidate();
            return self.has_validation_errors();
        }
        if self.validation.is_none() {
            return true;
        }

        let recorded: Vec<ValidationError> = self.errors(name).into_iter().cloned().collect();
        if recorded.is_empty() {
            self.clear_validation_error(name);
            return true;
        }
        for error in recorded {
            self.set_validation_error(error);
        }
        false
    }

    /// Adds `error` unless an error with the same key and target exists.
    pub fn set_validation_error(&mut self, error: ValidationError) {
        let Some(state) = self.validation.as_mut() else {
            return;
        };
        if state.errors.iter().any(|existing| existing.same_as(&error)) {
            return;
        }
        let key = error.key.clone();
        state.errors.push(error);
        self.on_errors_changed(&key);
    }

    /// Adds each error not already present.
    pub fn add_validation_errors(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        for error in errors {
            self.set_validation_error(error);
        }
    }

    /// Removes every error recorded for `name`.
    pub fn clear_validation_error(&mut self, name: &str) {
        let Some(state) = self.validation.as_mut() else {
            return;
        };
        let before = state.errors.len();
        state.errors.retain(|error| !error.is_for(name));
        if state.errors.len() != before {
            self.on_errors_changed(name);
        }
    }

    pub fn clear_validation_errors(&mut self) {
        let keys: Vec<String> = self
            .validation_errors()
            .iter()
            .map(|error| error.key.clone())
            .collect();
        for key in keys {
            self.clear_validation_error(&key);
        }
    }

    fn on_errors_changed(&self, name: &str) {
        self.notify_errors_changed(name);
        self.notify_property_changed(HAS_ERRORS);
        self.notify_property_changed(HAS_GRAPH_ERRORS);
    }

    // ── Queries ─────────────────────────────────────────────────

    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationError] {
        self.validation
            .as_ref()
            .map(|state| state.errors.as_slice())
            .unwrap_or_default()
    }

    /// Errors recorded for `name`, matched ignoring case.
    #[must_use]
    pub fn errors(&self, name: &str) -> Vec<&ValidationError> {
        self.validation_errors()
            .iter()
            .filter(|error| error.is_for(name))
            .collect()
    }

    pub(crate) fn has_property_errors(&self, name: &str) -> bool {
        self.validation_errors().iter().any(|error| error.is_for(name))
    }

    #[must_use]
    pub fn has_validation_errors(&self) -> bool {
        !self.validation_errors().is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_validation_errors()
    }

    /// This entity or any nested one has errors.
    #[must_use]
    pub fn has_graph_validation_errors(&self) -> bool {
        let mut visited = Visited::new(self);
        self.has_graph_errors_in(&mut visited)
    }

    fn has_graph_errors_in(&self, visited: &mut Visited) -> bool {
        self.has_validation_errors()
            || self.any_nested(visited, |nested, visited| nested.has_graph_errors_in(visited))
    }

    /// Revalidates, then reports whether the graph is free of errors.
    pub fn is_valid(&mut self) -> bool {
        self.invalidate();
        !self.has_graph_validation_errors()
    }
}
