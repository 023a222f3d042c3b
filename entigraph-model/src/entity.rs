use crate::context::EntityContext;
use crate::error::ModelResult;
use crate::event::{EntityEvent, Listener, Notifier};
use crate::metadata::EntityType;
use crate::repository::is_new_identity;
use crate::schema::{ID_PROPERTY, PropertySchema};
use crate::tracking::ChangeLedger;
use crate::traverse::Visited;
use crate::validation::ValidationState;
use crate::value::{EntityRef, Value};
use entigraph_types::{AuditInfo, TemporalInfo};
use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A trackable domain object.
///
/// Every entity carries a change ledger and editable-object state. Audit,
/// validation and temporal behavior are present when the entity's type
/// declares the matching [`Capabilities`](crate::Capabilities).
pub struct Entity {
    pub(crate) kind: Arc<EntityType>,
    pub(crate) context: Arc<EntityContext>,
    pub(crate) values: BTreeMap<String, Value>,
    pub(crate) ledger: ChangeLedger,
    pub(crate) is_editing: bool,
    pub(crate) is_auto_edit: bool,
    pub(crate) is_deleted: bool,
    pub(crate) is_loading: bool,
    pub(crate) is_read_only: bool,
    pub(crate) audit: Option<AuditInfo>,
    pub(crate) validation: Option<ValidationState>,
    pub(crate) temporal: Option<TemporalInfo>,
    /// Shared aggregations captured by the last hide, by property name.
    pub(crate) hidden: Option<BTreeMap<String, Value>>,
    notifier: Notifier,
}

impl Entity {
    /// Creates a new, empty instance of `kind`.
    pub fn new(kind: Arc<EntityType>, context: Arc<EntityContext>) -> Self {
        let values = kind
            .properties()
            .iter()
            .map(|p| (p.name.clone(), Value::default_for(&p.kind)))
            .collect();
        let capabilities = kind.capabilities();

        Self {
            values,
            ledger: ChangeLedger::default(),
            is_editing: false,
            is_auto_edit: true,
            is_deleted: false,
            is_loading: false,
            is_read_only: false,
            audit: capabilities.audited.then(AuditInfo::default),
            validation: capabilities.validated.then(ValidationState::default),
            temporal: capabilities
                .temporal
                .then(|| TemporalInfo::new(context.offset())),
            hidden: None,
            notifier: Notifier::default(),
            kind,
            context,
        }
    }

    /// Wraps the entity in a shared handle.
    pub fn into_ref(self) -> EntityRef {
        EntityRef::new(self)
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        self.kind.name()
    }

    #[must_use]
    pub fn kind(&self) -> &Arc<EntityType> {
        &self.kind
    }

    #[must_use]
    pub fn context(&self) -> &Arc<EntityContext> {
        &self.context
    }

    #[must_use]
    pub fn is_a(&self, entity_type: &str) -> bool {
        self.kind.is_a(entity_type)
    }

    // ── Property access ─────────────────────────────────────────

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_decimal(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_decimal)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn get_entity(&self, name: &str) -> Option<EntityRef> {
        self.get(name).and_then(Value::as_entity).cloned()
    }

    pub fn get_collection(&self, name: &str) -> Option<&[EntityRef]> {
        self.get(name).and_then(Value::as_collection)
    }

    /// Appends `item` to a collection property. Collection membership is not
    /// recorded in the ledger; a new member makes the graph report changes
    /// through its own `is_new` state.
    pub fn add_to_collection(&mut self, name: &str, item: EntityRef) -> bool {
        let Some(property) = self.kind.property(name) else {
            return false;
        };
        if !Value::Collection(vec![item.clone()]).fits(&property.kind) {
            return false;
        }
        match self.values.get_mut(name) {
            Some(Value::Collection(items)) => items.push(item),
            Some(slot) => *slot = Value::Collection(vec![item]),
            None => return false,
        }
        true
    }

    /// Removes `item` (by identity) from a collection property.
    pub fn remove_from_collection(&mut self, name: &str, item: &EntityRef) -> bool {
        match self.values.get_mut(name) {
            Some(Value::Collection(items)) => {
                let before = items.len();
                items.retain(|existing| !existing.ptr_eq(item));
                items.len() != before
            }
            _ => false,
        }
    }

    /// The ledger's original value if the property changed, else the
    /// current value.
    pub fn original_value(&self, name: &str) -> Option<Value> {
        self.ledger
            .original(name)
            .or_else(|| self.values.get(name))
            .cloned()
    }

    /// Declared, and not excluded from mapping.
    #[must_use]
    pub fn is_persistable_property(&self, name: &str) -> bool {
        self.kind
            .property(name)
            .is_some_and(|property| !property.ignore_on_map)
    }

    #[must_use]
    pub fn key_value(&self) -> Option<&Value> {
        let key = self.kind.metadata().key()?;
        self.values.get(&key.name)
    }

    /// Whether the entity has never been persisted.
    ///
    /// Without a declared key the `Id` property decides; a non-identity key
    /// is never new. When a repository is registered for the type (and the
    /// entity is not being loaded) the repository's rule applies.
    #[must_use]
    pub fn is_new(&self) -> bool {
        let Some(key) = self.kind.metadata().key() else {
            return self
                .values
                .get(ID_PROPERTY)
                .and_then(Value::as_key_int)
                .is_some_and(|id| id < 1);
        };
        if !key.is_identity {
            return false;
        }

        let value = self.values.get(&key.name).cloned().unwrap_or_default();
        if !self.is_loading {
            let repository = self
                .context
                .repositories()
                .and_then(|finder| finder.find_repository(self.entity_type()));
            if let Some(repository) = repository {
                return repository.is_new_key(&value);
            }
        }
        is_new_identity(&value)
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.is_read_only = read_only;
    }

    // ── Notifications ───────────────────────────────────────────

    pub fn subscribe(&mut self, listener: Listener) {
        self.notifier.subscribe(listener);
    }

    pub(crate) fn notify_property_changed(&self, name: &str) {
        self.notifier.emit(EntityEvent::PropertyChanged(name.to_string()));
    }

    pub(crate) fn notify_errors_changed(&self, name: &str) {
        self.notifier.emit(EntityEvent::ErrorsChanged(name.to_string()));
    }

    // ── Cloning ─────────────────────────────────────────────────

    /// A new entity with the same state. Nested handles are shared, not
    /// copied, and listeners are not carried over.
    #[must_use]
    pub fn deep_clone(&self) -> Entity {
        Entity {
            kind: Arc::clone(&self.kind),
            context: Arc::clone(&self.context),
            values: self.values.clone(),
            ledger: self.ledger.clone(),
            is_editing: self.is_editing,
            is_auto_edit: self.is_auto_edit,
            is_deleted: self.is_deleted,
            is_loading: self.is_loading,
            is_read_only: self.is_read_only,
            audit: self.audit.clone(),
            validation: self.validation.clone(),
            temporal: self.temporal.clone(),
            hidden: self.hidden.clone(),
            notifier: Notifier::default(),
        }
    }

    /// A fresh entity of the same type holding this one's mappable values,
    /// committed.
    #[must_use]
    pub fn shallow_clone(&self) -> Entity {
        let mut clone = Entity::new(Arc::clone(&self.kind), Arc::clone(&self.context));
        self.shallow_merge(&mut clone);
        clone
    }

    /// Copies this entity's mappable values onto `target` and commits it.
    ///
    /// Mappable: serialized, scalar, settable and not ignored. Properties the
    /// target does not declare are skipped.
    pub fn shallow_merge<'a>(&self, target: &'a mut Entity) -> &'a mut Entity {
        for property in self.kind.properties().iter().filter(|p| is_mappable(p)) {
            if let Some(value) = self.values.get(&property.name) {
                target.set_property(&property.name, value.clone());
            }
        }
        target.end_edit();
        target
    }

    // ── Serialization boundary ──────────────────────────────────

    /// The persistable view of the graph: serialized, non-ignored properties
    /// only. Nested entities are inlined; a hidden shared aggregation is
    /// `null`, and an entity already emitted higher up is `null` too.
    pub fn to_json(&self) -> ModelResult<Json> {
        let mut visited = Visited::new(self);
        self.to_json_in(&mut visited)
    }

    fn to_json_in(&self, visited: &mut Visited) -> ModelResult<Json> {
        let mut map = Map::new();
        for property in self.kind.properties() {
            if !property.serialized || property.ignore_on_map {
                continue;
            }
            let value = self.values.get(&property.name).cloned().unwrap_or_default();
            map.insert(property.name.clone(), value_to_json(&value, visited)?);
        }
        map.insert("IsDeleted".into(), Json::Bool(self.is_deleted()));
        if let Some(audit) = &self.audit {
            map.insert("AuditInfo".into(), serde_json::to_value(audit)?);
        }
        if let Some(temporal) = &self.temporal {
            map.insert("TemporalInfo".into(), serde_json::to_value(temporal)?);
        }
        Ok(Json::Object(map))
    }
}

fn is_mappable(property: &PropertySchema) -> bool {
    property.serialized && property.is_scalar() && !property.read_only && !property.ignore_on_map
}

fn value_to_json(value: &Value, visited: &mut Visited) -> ModelResult<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Decimal(d) => Number::from_f64(*d).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::DateTime(at) => Json::String(at.to_rfc3339()),
        Value::Bytes(bytes) => Json::from(bytes.clone()),
        Value::Entity(item) => entity_to_json(item, visited)?,
        Value::Collection(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(entity_to_json(item, visited)?);
            }
            Json::Array(out)
        }
    })
}

fn entity_to_json(item: &EntityRef, visited: &mut Visited) -> ModelResult<Json> {
    if !visited.enter(item) {
        return Ok(Json::Null);
    }
    match item.try_borrow() {
        Ok(entity) => entity.to_json_in(visited),
        Err(_) => Ok(Json::Null),
    }
}

impl fmt::Display for Entity {
    /// The default-text property when declared, else the key, else the type.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.kind.metadata();
        if let Some(name) = metadata.default_text() {
            if let Some(text) = self.get_text(name) {
                return f.write_str(text);
            }
        }
        match metadata.key() {
            Some(key) => write!(
                f,
                "Type {} with keyinfo {}: {}",
                self.entity_type(),
                key.name,
                self.values.get(&key.name).cloned().unwrap_or_default()
            ),
            None => f.write_str(self.entity_type()),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("entity_type", &self.entity_type())
            .field("values", &self.values)
            .field("ledger", &self.ledger)
            .field("is_editing", &self.is_editing)
            .field("is_deleted", &self.is_deleted)
            .field("audit", &self.audit)
            .field("validation", &self.validation)
            .field("temporal", &self.temporal)
            .finish()
    }
}
