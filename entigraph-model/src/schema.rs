use serde::{Deserialize, Serialize};

/// Name of the root schema returned by [`EntitySchema::base`].
pub const BASE_ENTITY: &str = "BaseEntity";

/// Name of the identity key declared by [`EntitySchema::base`].
pub const ID_PROPERTY: &str = "Id";

/// Declares an entity type: its properties, the markers on them, and the
/// capabilities instances of the type carry.
///
/// Schemas are plain data. They are resolved into an [`EntityType`] by
/// [`SchemaRegistry::register`], which is where markers are checked.
///
/// [`EntityType`]: crate::EntityType
/// [`SchemaRegistry::register`]: crate::SchemaRegistry::register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    /// Registered type this one derives from. Its properties are inherited
    /// unless a property of the same name is declared here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub properties: Vec<PropertySchema>,
    #[serde(default)]
    pub capabilities: Capabilities,
}

impl EntitySchema {
    /// An empty schema with no base and no capabilities.
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            base: None,
            properties: Vec::new(),
            capabilities: Capabilities::default(),
        }
    }

    /// The root schema every domain type usually extends: an integer
    /// identity key named `Id`.
    pub fn base() -> Self {
        Self::new(BASE_ENTITY).property(PropertySchema::int(ID_PROPERTY).key(true).serialized())
    }

    /// Inherit from a registered type.
    pub fn extends(mut self, base: &str) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Append a property declaration.
    pub fn property(mut self, property: PropertySchema) -> Self {
        self.properties.push(property);
        self
    }

    /// Instances carry [`AuditInfo`](entigraph_types::AuditInfo).
    pub fn audited(mut self) -> Self {
        self.capabilities.audited = true;
        self
    }

    /// Instances collect validation errors. Validated types are audited too.
    pub fn validated(mut self) -> Self {
        self.capabilities.audited = true;
        self.capabilities.validated = true;
        self
    }

    /// Instances carry a validity interval and delete by closing it.
    /// Temporal types are validated and audited too.
    pub fn temporal(mut self) -> Self {
        self.capabilities.audited = true;
        self.capabilities.validated = true;
        self.capabilities.temporal = true;
        self
    }
}

/// Optional behavior attached to every instance of a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub audited: bool,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub temporal: bool,
}

impl Capabilities {
    /// Union of two capability sets; derived types keep what their base has.
    #[must_use]
    pub fn union(self, other: Capabilities) -> Self {
        Self {
            audited: self.audited || other.audited,
            validated: self.validated || other.validated,
            temporal: self.temporal || other.temporal,
        }
    }
}

/// A single property declaration and its markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyMarker>,
    /// Recursive graph operations descend through properties of this
    /// declared type.
    #[serde(default)]
    pub handle_on_nesting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    /// Excluded from clone/merge and never persistable.
    #[serde(default)]
    pub ignore_on_map: bool,
    /// Opted in to persistence and transmission.
    #[serde(default)]
    pub serialized: bool,
    /// No public setter: only hydration may write it.
    #[serde(default)]
    pub read_only: bool,
    /// Used as the entity's display text.
    #[serde(default)]
    pub default_text: bool,
}

impl PropertySchema {
    fn simple(name: &str, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: None,
            handle_on_nesting: false,
            aggregation: None,
            ignore_on_map: false,
            serialized: false,
            read_only: false,
            default_text: false,
        }
    }

    pub fn bool(name: &str) -> Self {
        Self::simple(name, PropertyKind::Scalar(ScalarType::Bool))
    }

    pub fn int(name: &str) -> Self {
        Self::simple(name, PropertyKind::Scalar(ScalarType::Int))
    }

    pub fn decimal(name: &str) -> Self {
        Self::simple(name, PropertyKind::Scalar(ScalarType::Decimal))
    }

    pub fn text(name: &str) -> Self {
        Self::simple(name, PropertyKind::Scalar(ScalarType::Text))
    }

    pub fn datetime(name: &str) -> Self {
        Self::simple(name, PropertyKind::Scalar(ScalarType::DateTime))
    }

    pub fn bytes(name: &str) -> Self {
        Self::simple(name, PropertyKind::Scalar(ScalarType::Bytes))
    }

    /// A single nested entity of type `entity_type`.
    pub fn entity(name: &str, entity_type: &str) -> Self {
        Self::simple(name, PropertyKind::Entity(entity_type.into()))
    }

    /// A list of nested entities of type `entity_type`.
    pub fn collection(name: &str, entity_type: &str) -> Self {
        Self::simple(name, PropertyKind::Collection(entity_type.into()))
    }

    pub fn key(mut self, is_identity: bool) -> Self {
        self.key = Some(KeyMarker { is_identity });
        self
    }

    pub fn nested(mut self) -> Self {
        self.handle_on_nesting = true;
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignore_on_map = true;
        self
    }

    pub fn serialized(mut self) -> Self {
        self.serialized = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn default_text(mut self) -> Self {
        self.default_text = true;
        self
    }

    /// Plain value, not a nested entity or collection.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, PropertyKind::Scalar(_))
    }
}

/// The declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum PropertyKind {
    Scalar(ScalarType),
    Entity(String),
    Collection(String),
}

impl PropertyKind {
    /// Entity type name for nested and collection properties.
    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Entity(name) | Self::Collection(name) => Some(name),
        }
    }

    #[must_use]
    pub fn is_nested(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Int,
    Decimal,
    Text,
    DateTime,
    Bytes,
}

/// Marks the key property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMarker {
    /// The key is a store-assigned identity; unset or < 1 means "new".
    pub is_identity: bool,
}

/// Describes how a nested entity or collection relates to its owner.
///
/// Exactly one of: shared (externally owned, hidden on demand),
/// shared-independent (externally owned, never hidden), or composite
/// (owned; rolled back and deleted with the owner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    is_shared: bool,
    #[serde(default)]
    is_independent: bool,
    #[serde(default)]
    does_participate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store_key: Option<String>,
}

impl Aggregation {
    fn with(is_shared: bool, is_independent: bool) -> Self {
        Self {
            is_shared,
            is_independent,
            does_participate: false,
            store_key: None,
        }
    }

    pub fn shared() -> Self {
        Self::with(true, false)
    }

    pub fn independent() -> Self {
        Self::with(true, true)
    }

    pub fn composite() -> Self {
        Self::with(false, false)
    }

    /// The related entities also live in an external store, optionally
    /// under `store_key`.
    pub fn participating(mut self, store_key: Option<&str>) -> Self {
        self.does_participate = true;
        self.store_key = store_key.map(Into::into);
        self
    }

    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.is_shared
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        !self.is_shared
    }

    #[must_use]
    pub fn is_independent(&self) -> bool {
        self.is_independent
    }

    #[must_use]
    pub fn does_participate(&self) -> bool {
        self.does_participate
    }

    #[must_use]
    pub fn store_key(&self) -> Option<&str> {
        self.store_key.as_deref()
    }

    /// Shared and not independent: eligible for hide/show.
    #[must_use]
    pub fn is_hideable(&self) -> bool {
        self.is_shared && !self.is_independent
    }
}
