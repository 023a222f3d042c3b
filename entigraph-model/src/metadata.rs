//! Structural metadata resolved from declared schemas.
//!
//! A schema is resolved once, when it is registered. The resulting
//! [`EntityType`] is cached by type name in the [`SchemaRegistry`] and never
//! invalidated: lookups after the first registration are cheap clones of an
//! `Arc`.

use crate::error::{ModelError, ModelResult};
use crate::schema::{Capabilities, EntitySchema, PropertyKind, PropertySchema};
use crate::validator::EntityValidator;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// The key property of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub name: String,
    pub is_identity: bool,
}

/// What graph operations need to know about a type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    key: Option<KeyDescriptor>,
    nesting_types: Vec<PropertyKind>,
    shared_aggregations: Vec<String>,
    shared_types: Vec<PropertyKind>,
    composite_aggregations: Vec<String>,
    default_text: Option<String>,
}

impl EntityMetadata {
    /// Resolves metadata from a flattened, derived-first property list.
    ///
    /// When several properties carry a key marker the first one wins, which
    /// with derived-first ordering means a derived key hides an inherited one.
    pub fn resolve(properties: &[PropertySchema]) -> Self {
        let mut metadata = Self::default();

        for property in properties {
            if let Some(marker) = property.key.filter(|_| metadata.key.is_none()) {
                metadata.key = Some(KeyDescriptor {
                    name: property.name.clone(),
                    is_identity: marker.is_identity,
                });
            }
            if property.default_text && metadata.default_text.is_none() {
                metadata.default_text = Some(property.name.clone());
            }
            if property.handle_on_nesting && !metadata.nesting_types.contains(&property.kind) {
                metadata.nesting_types.push(property.kind.clone());
            }
            if let Some(aggregation) = &property.aggregation {
                if aggregation.is_hideable() {
                    metadata.shared_aggregations.push(property.name.clone());
                    if !metadata.shared_types.contains(&property.kind) {
                        metadata.shared_types.push(property.kind.clone());
                    }
                }
                if aggregation.is_composite() {
                    metadata.composite_aggregations.push(property.name.clone());
                }
            }
        }

        metadata
    }

    #[must_use]
    pub fn key(&self) -> Option<&KeyDescriptor> {
        self.key.as_ref()
    }

    /// Declared property types recursive operations descend through.
    #[must_use]
    pub fn nesting_types(&self) -> &[PropertyKind] {
        &self.nesting_types
    }

    /// Matches by declared type, so every property of a nesting type is
    /// traversed, not only the one carrying the marker.
    #[must_use]
    pub fn is_nesting(&self, kind: &PropertyKind) -> bool {
        self.nesting_types.contains(kind)
    }

    /// Names of shared, non-independent aggregations.
    #[must_use]
    pub fn shared_aggregations(&self) -> &[String] {
        &self.shared_aggregations
    }

    #[must_use]
    pub fn is_shared_type(&self, kind: &PropertyKind) -> bool {
        self.shared_types.contains(kind)
    }

    /// Names of composite (owned) aggregations.
    #[must_use]
    pub fn composite_aggregations(&self) -> &[String] {
        &self.composite_aggregations
    }

    #[must_use]
    pub fn default_text(&self) -> Option<&str> {
        self.default_text.as_deref()
    }
}

/// A registered entity type: flattened properties, resolved metadata and
/// the validator its instances run.
pub struct EntityType {
    name: String,
    base: Option<String>,
    lineage: Vec<String>,
    properties: Vec<PropertySchema>,
    index: HashMap<String, usize>,
    capabilities: Capabilities,
    metadata: EntityMetadata,
    validator: Option<Arc<dyn EntityValidator>>,
}

impl EntityType {
    fn new(
        schema: EntitySchema,
        inherited: Option<&EntityType>,
        validator: Option<Arc<dyn EntityValidator>>,
    ) -> Self {
        let mut properties = schema.properties;
        let mut capabilities = schema.capabilities;
        let mut lineage = vec![schema.entity_type.clone()];
        if let Some(base) = inherited {
            lineage.extend(base.lineage.iter().cloned());
            let own: HashSet<String> = properties.iter().map(|p| p.name.clone()).collect();
            properties.extend(
                base.properties
                    .iter()
                    .filter(|p| !own.contains(&p.name))
                    .cloned(),
            );
            capabilities = capabilities.union(base.capabilities);
        }

        let index = properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        let metadata = EntityMetadata::resolve(&properties);

        Self {
            name: schema.entity_type,
            base: schema.base,
            lineage,
            properties,
            index,
            capabilities,
            metadata,
            validator,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// This type or one of its ancestors is named `entity_type`.
    #[must_use]
    pub fn is_a(&self, entity_type: &str) -> bool {
        self.lineage.iter().any(|name| name == entity_type)
    }

    /// Own properties first, then inherited ones that were not overridden.
    #[must_use]
    pub fn properties(&self) -> &[PropertySchema] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[must_use]
    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn validator(&self) -> Option<&Arc<dyn EntityValidator>> {
        self.validator.as_ref()
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("properties", &self.properties)
            .field("capabilities", &self.capabilities)
            .field("metadata", &self.metadata)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Checks the markers declared at one schema level.
fn check_schema(schema: &EntitySchema) -> ModelResult<()> {
    let entity_type = &schema.entity_type;
    let mut seen = HashSet::new();
    let mut key: Option<&str> = None;

    for property in &schema.properties {
        if !seen.insert(property.name.as_str()) {
            return Err(ModelError::DuplicateProperty {
                entity_type: entity_type.clone(),
                property: property.name.clone(),
            });
        }

        if property.key.is_some() {
            if let Some(first) = key {
                return Err(ModelError::AmbiguousKey {
                    entity_type: entity_type.clone(),
                    first: first.into(),
                    second: property.name.clone(),
                });
            }
            key = Some(&property.name);
        }

        let invalid = |reason: &str| ModelError::InvalidMarker {
            entity_type: entity_type.clone(),
            property: property.name.clone(),
            reason: reason.into(),
        };

        if property.handle_on_nesting && !property.kind.is_nested() {
            return Err(invalid("nesting marker on a scalar property"));
        }
        if let Some(aggregation) = &property.aggregation {
            if !property.kind.is_nested() {
                return Err(invalid("aggregation marker on a scalar property"));
            }
            if aggregation.is_composite() && aggregation.is_independent() {
                return Err(invalid("a composite aggregation cannot be independent"));
            }
        }
        if property.key.is_some() && property.kind.is_nested() {
            return Err(invalid("key marker on a nested property"));
        }
    }

    Ok(())
}

/// Process-lifetime cache of resolved entity types, keyed by type name.
#[derive(Default)]
pub struct SchemaRegistry {
    types: RwLock<HashMap<String, Arc<EntityType>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves and caches `schema`. Registering a name that is already
    /// cached returns the cached type unchanged.
    pub fn register(&self, schema: EntitySchema) -> ModelResult<Arc<EntityType>> {
        self.insert(schema, None)
    }

    /// Like [`register`](Self::register), attaching the validator that
    /// instances of the type run on `invalidate`.
    pub fn register_with_validator(
        &self,
        schema: EntitySchema,
        validator: Arc<dyn EntityValidator>,
    ) -> ModelResult<Arc<EntityType>> {
        self.insert(schema, Some(validator))
    }

    /// Returns the cached type named `entity_type`.
    pub fn get(&self, entity_type: &str) -> Option<Arc<EntityType>> {
        let types = self.types.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        types.get(entity_type).cloned()
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.get(entity_type).is_some()
    }

    pub fn len(&self) -> usize {
        self.types.read().map(|types| types.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(
        &self,
        schema: EntitySchema,
        validator: Option<Arc<dyn EntityValidator>>,
    ) -> ModelResult<Arc<EntityType>> {
        if let Some(cached) = self.get(&schema.entity_type) {
            if validator.is_some() {
                warn!(entity_type = %schema.entity_type, "Type already registered, validator ignored");
            }
            debug!(entity_type = %schema.entity_type, "Schema cache hit");
            return Ok(cached);
        }

        check_schema(&schema)?;

        let inherited = match &schema.base {
            Some(base) => Some(self.get(base).ok_or_else(|| ModelError::UnknownBaseType {
                entity_type: schema.entity_type.clone(),
                base: base.clone(),
            })?),
            None => None,
        };

        let resolved = Arc::new(EntityType::new(schema, inherited.as_deref(), validator));

        let mut types = self.types.write().map_err(|_| ModelError::RegistryPoisoned)?;
        let entry = types
            .entry(resolved.name().to_string())
            .or_insert_with(|| Arc::clone(&resolved));

        info!(
            entity_type = %entry.name(),
            properties = entry.properties().len(),
            key = ?entry.metadata().key().map(|k| k.name.as_str()),
            "Entity type registered"
        );

        Ok(Arc::clone(entry))
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry").field("types", &self.len()).finish()
    }
}
