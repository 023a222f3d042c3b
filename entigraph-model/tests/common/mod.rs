//! Shared test helpers for entity model tests.
//!
//! The fixture registers a small document domain:
//! - `Dossier` (validated) owns composite `Lines`, references a shared `Owner`
//!   and an independent `Reviewer` party, and a non-nested `Label` tag
//! - `Line` (validated) points back at its dossier and at a shared `Supplier`
//! - `Contract` and `Clause` are temporal
//! - `Currency` has a non-identity key, `Note` has no key at all

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use entigraph_model::{
    Aggregation, Entity, EntityContext, EntityEvent, EntitySchema, FixedClock, PropertySchema,
    RepositoryFinder, SchemaRegistry, ValidationResult,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// 2024-05-01 12:00 UTC, where every fixture clock starts.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub struct Fixture {
    pub registry: SchemaRegistry,
    pub clock: Arc<FixedClock>,
    pub context: Arc<EntityContext>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(|context| context)
    }

    pub fn with_repositories(finder: Arc<dyn RepositoryFinder>) -> Self {
        Self::build(move |context| context.with_repositories(finder))
    }

    fn build(configure: impl FnOnce(EntityContext) -> EntityContext) -> Self {
        let clock = Arc::new(FixedClock::new(noon()));
        let context = Arc::new(configure(EntityContext::new(clock.clone())));
        let registry = SchemaRegistry::new();
        register_domain(&registry);
        Self {
            registry,
            clock,
            context,
        }
    }

    /// A new instance of `entity_type`.
    pub fn create(&self, entity_type: &str) -> Entity {
        let kind = self.registry.get(entity_type).expect("type registered");
        Entity::new(kind, Arc::clone(&self.context))
    }

    /// An instance as hydrated from the store, with `Id` set to `id`.
    pub fn persisted(&self, entity_type: &str, id: i64) -> Entity {
        let mut entity = self.create(entity_type);
        entity.begin_loading();
        entity.load_property("Id", id);
        entity.end_loading();
        entity
    }
}

pub fn register_domain(registry: &SchemaRegistry) {
    registry.register(EntitySchema::base()).unwrap();

    registry
        .register(
            EntitySchema::new("Party")
                .extends("BaseEntity")
                .validated()
                .property(PropertySchema::text("Name").serialized().default_text()),
        )
        .unwrap();

    registry
        .register(
            EntitySchema::new("Tag")
                .extends("BaseEntity")
                .audited()
                .property(PropertySchema::text("Label").serialized()),
        )
        .unwrap();

    registry
        .register(
            EntitySchema::new("Line")
                .extends("BaseEntity")
                .validated()
                .property(PropertySchema::text("Description").serialized().default_text())
                .property(PropertySchema::decimal("Amount").serialized())
                .property(PropertySchema::entity("Dossier", "Dossier").nested())
                .property(
                    PropertySchema::entity("Supplier", "Party")
                        .aggregation(Aggregation::shared())
                        .serialized(),
                ),
        )
        .unwrap();

    registry
        .register_with_validator(
            EntitySchema::new("Dossier")
                .extends("BaseEntity")
                .validated()
                .property(PropertySchema::text("Title").serialized().default_text())
                .property(PropertySchema::text("Notes"))
                .property(PropertySchema::text("Secret").serialized().ignored())
                .property(PropertySchema::int("Revision").serialized().read_only())
                .property(PropertySchema::bool("Urgent").serialized())
                .property(
                    PropertySchema::entity("Owner", "Party")
                        .nested()
                        .aggregation(Aggregation::shared())
                        .serialized(),
                )
                .property(
                    PropertySchema::entity("Reviewer", "Party")
                        .aggregation(Aggregation::independent())
                        .serialized(),
                )
                .property(PropertySchema::entity("Label", "Tag").serialized())
                .property(
                    PropertySchema::collection("Lines", "Line")
                        .nested()
                        .aggregation(Aggregation::composite())
                        .serialized(),
                ),
            Arc::new(dossier_rules),
        )
        .unwrap();

    registry
        .register(
            EntitySchema::new("Clause")
                .extends("BaseEntity")
                .temporal()
                .property(PropertySchema::text("Wording").serialized()),
        )
        .unwrap();

    registry
        .register(
            EntitySchema::new("Contract")
                .extends("BaseEntity")
                .temporal()
                .property(PropertySchema::text("Reference").serialized().default_text())
                .property(
                    PropertySchema::collection("Clauses", "Clause")
                        .nested()
                        .aggregation(Aggregation::composite())
                        .serialized(),
                ),
        )
        .unwrap();

    registry
        .register(
            EntitySchema::new("Currency")
                .extends("BaseEntity")
                .property(PropertySchema::text("Code").key(false).serialized()),
        )
        .unwrap();

    registry
        .register(EntitySchema::new("Note").property(PropertySchema::text("Body").serialized()))
        .unwrap();
}

/// Title is required; negative line amounts are reported on the line.
fn dossier_rules(entity: &Entity) -> Vec<ValidationResult> {
    let mut findings = Vec::new();
    if entity.get_text("Title").is_none_or(str::is_empty) {
        findings.push(ValidationResult::new("Title", "Title is required"));
    }
    for line in entity.get_collection("Lines").unwrap_or_default() {
        if line.borrow().get_decimal("Amount").is_some_and(|amount| amount < 0.0) {
            findings.push(
                ValidationResult::new("Amount", "Amount must not be negative").on(line.clone()),
            );
        }
    }
    findings
}

/// Routes engine logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collects every event `entity` emits from now on.
pub fn record_events(entity: &mut Entity) -> Rc<RefCell<Vec<EntityEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    entity.subscribe(Rc::new(move |event: &EntityEvent| sink.borrow_mut().push(event.clone())));
    events
}

pub fn changed(name: &str) -> EntityEvent {
    EntityEvent::PropertyChanged(name.to_string())
}
