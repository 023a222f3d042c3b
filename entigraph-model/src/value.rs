//! Property values and shared entity handles.

use crate::entity::Entity;
use crate::schema::{PropertyKind, ScalarType};
use chrono::{DateTime, FixedOffset, Utc};
use std::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A shared handle to a nested entity.
///
/// Graphs are single-threaded; a handle may be referenced from several
/// owners, and equality is identity.
#[derive(Clone)]
pub struct EntityRef(Rc<RefCell<Entity>>);

impl EntityRef {
    pub fn new(entity: Entity) -> Self {
        Self(Rc::new(RefCell::new(entity)))
    }

    /// Panics if the entity is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Entity> {
        self.0.borrow()
    }

    /// Panics if the entity is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Entity> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, Entity>, BorrowError> {
        self.0.try_borrow()
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, Entity>, BorrowMutError> {
        self.0.try_borrow_mut()
    }

    /// Both handles point at the same entity.
    #[must_use]
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the entity, stable for the handle's lifetime.
    pub(crate) fn addr(&self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(entity) => write!(f, "EntityRef({}@{:#x})", entity.entity_type(), self.addr()),
            Err(_) => write!(f, "EntityRef(<borrowed>@{:#x})", self.addr()),
        }
    }
}

/// A property value.
///
/// Scalars compare by value; entities and collections compare by handle
/// identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Text(String),
    DateTime(DateTime<FixedOffset>),
    Bytes(Vec<u8>),
    Entity(EntityRef),
    Collection(Vec<EntityRef>),
}

impl Value {
    /// The value a freshly constructed entity holds for `kind`.
    #[must_use]
    pub fn default_for(kind: &PropertyKind) -> Self {
        match kind {
            PropertyKind::Scalar(ScalarType::Bool) => Self::Bool(false),
            PropertyKind::Scalar(ScalarType::Int) => Self::Int(0),
            PropertyKind::Scalar(ScalarType::Decimal) => Self::Decimal(0.0),
            PropertyKind::Scalar(_) | PropertyKind::Entity(_) => Self::Null,
            PropertyKind::Collection(_) => Self::Collection(Vec::new()),
        }
    }

    /// Whether this value may be stored in a property of `kind`.
    /// `Null` fits every kind.
    #[must_use]
    pub fn fits(&self, kind: &PropertyKind) -> bool {
        match (self, kind) {
            (Self::Null, _) => true,
            (Self::Bool(_), PropertyKind::Scalar(ScalarType::Bool))
            | (Self::Int(_), PropertyKind::Scalar(ScalarType::Int))
            | (Self::Decimal(_), PropertyKind::Scalar(ScalarType::Decimal))
            | (Self::Text(_), PropertyKind::Scalar(ScalarType::Text))
            | (Self::DateTime(_), PropertyKind::Scalar(ScalarType::DateTime))
            | (Self::Bytes(_), PropertyKind::Scalar(ScalarType::Bytes)) => true,
            (Self::Entity(item), PropertyKind::Entity(name)) => entity_is(item, name),
            (Self::Collection(items), PropertyKind::Collection(name)) => {
                items.iter().all(|item| entity_is(item, name))
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::DateTime(at) => Some(*at),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Self::Entity(item) => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_collection(&self) -> Option<&[EntityRef]> {
        match self {
            Self::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Integer reading of a key value: integers as-is, text if it parses.
    #[must_use]
    pub fn as_key_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn entity_is(item: &EntityRef, entity_type: &str) -> bool {
    // A handle that is borrowed right now is accepted; its type was checked
    // when it was first stored.
    item.try_borrow()
        .map(|entity| entity.is_a(entity_type))
        .unwrap_or(true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(at) => write!(f, "{at}"),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Entity(item) => write!(f, "{item:?}"),
            Self::Collection(items) => write!(f, "[{} entities]", items.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(at: DateTime<FixedOffset>) -> Self {
        Self::DateTime(at)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Self::DateTime(at.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<EntityRef> for Value {
    fn from(item: EntityRef) -> Self {
        Self::Entity(item)
    }
}

impl From<Vec<EntityRef>> for Value {
    fn from(items: Vec<EntityRef>) -> Self {
        Self::Collection(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
