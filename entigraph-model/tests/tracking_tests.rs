mod common;

use common::{Fixture, changed, init_tracing, record_events};
use entigraph_model::{EntityRef, Value, event::IS_EDITING};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ── set_property ─────────────────────────────────────────────────

#[test]
fn set_property_records_previous_value() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.load_property("Title", "Draft");

    assert!(dossier.set_property("Title", "Final"));
    assert_eq!(dossier.get_text("Title"), Some("Final"));
    assert!(dossier.is_property_changed("Title"));
    assert_eq!(dossier.original_value("Title"), Some(Value::from("Draft")));
    assert_eq!(dossier.changed_property_names(), vec!["Title"]);
}

#[test]
fn setting_equal_value_is_not_a_change() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.load_property("Title", "Draft");

    assert!(!dossier.set_property("Title", "Draft"));
    assert!(!dossier.is_modified());
    assert!(!dossier.is_editing());
}

#[test]
fn unknown_property_is_ignored() {
    let fx = Fixture::new();
    let mut dossier = fx.create("Dossier");
    assert!(!dossier.set_property("Nope", 1));
    assert_eq!(dossier.get("Nope"), None);
}

#[test]
fn read_only_property_is_ignored() {
    let fx = Fixture::new();
    let mut dossier = fx.create("Dossier");
    assert!(!dossier.set_property("Revision", 3));
    assert_eq!(dossier.get_int("Revision"), Some(0));
}

#[test]
fn value_of_wrong_type_is_ignored() {
    let fx = Fixture::new();
    let mut dossier = fx.create("Dossier");
    assert!(!dossier.set_property("Urgent", "yes"));
    assert_eq!(dossier.get_bool("Urgent"), Some(false));
}

#[test]
fn entity_of_wrong_type_is_ignored() {
    let fx = Fixture::new();
    let mut dossier = fx.create("Dossier");
    let line = fx.create("Line").into_ref();
    assert!(!dossier.set_property("Owner", line));
    assert!(dossier.get_entity("Owner").is_none());
}

#[test]
fn first_write_wins_in_ledger() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.load_property("Title", "A");

    dossier.set_property("Title", "B");
    dossier.set_property("Title", "C");
    assert_eq!(dossier.ledger().original("Title"), Some(&Value::from("A")));
    assert_eq!(dossier.ledger().len(), 1);
}

#[test]
fn set_property_fires_property_changed() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    let events = record_events(&mut dossier);

    dossier.set_property("Title", "Hello");
    let events = events.borrow();
    assert!(events.contains(&changed("Title")));
    assert!(events.contains(&changed(IS_EDITING)));
}

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn load_property_is_untracked_and_may_write_read_only() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    assert!(dossier.load_property("Revision", 12));
    assert_eq!(dossier.get_int("Revision"), Some(12));
    assert!(!dossier.is_modified());
}

#[test]
fn writes_while_loading_are_not_recorded() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.begin_loading();
    assert!(dossier.is_loading());
    assert!(!dossier.set_property("Title", "Loaded"));
    dossier.end_loading();

    assert_eq!(dossier.get_text("Title"), Some("Loaded"));
    assert!(!dossier.is_modified());
}

// ── Edit transactions ────────────────────────────────────────────

#[test]
fn first_change_begins_edit_with_auto_edit() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    assert!(dossier.is_auto_edit());
    dossier.set_property("Title", "x");
    assert!(dossier.is_editing());
}

#[test]
fn first_change_does_not_begin_edit_without_auto_edit() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.set_auto_edit(false);
    dossier.set_property("Title", "x");
    assert!(!dossier.is_editing());
    assert!(dossier.is_modified());
}

#[test]
fn cancel_edit_restores_values_and_clears_changes() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.load_property("Title", "Original");
    dossier.set_property("Title", "Changed");
    dossier.set_property("Urgent", true);
    assert!(dossier.has_changes());

    dossier.cancel_edit();
    assert_eq!(dossier.get_text("Title"), Some("Original"));
    assert_eq!(dossier.get_bool("Urgent"), Some(false));
    assert!(!dossier.is_modified());
    assert!(!dossier.is_editing());
    assert!(!dossier.has_changes());
}

#[test]
fn end_edit_keeps_values_and_forgets_originals() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.set_property("Title", "Kept");
    dossier.end_edit();

    assert_eq!(dossier.get_text("Title"), Some("Kept"));
    assert!(!dossier.is_modified());
    assert!(!dossier.is_editing());
    assert!(!dossier.has_changes());
}

#[test]
fn end_edit_is_idempotent() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.set_property("Title", "Kept");
    dossier.end_edit();
    let after_first = format!("{dossier:?}");
    dossier.end_edit();
    assert_eq!(format!("{dossier:?}"), after_first);
}

#[test]
fn cancel_after_end_edit_keeps_committed_values() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.set_property("Title", "Committed");
    dossier.end_edit();
    dossier.cancel_edit();
    assert_eq!(dossier.get_text("Title"), Some("Committed"));
}

#[test]
fn remove_changed_property_keeps_current_value() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.set_property("Title", "New");
    assert!(dossier.remove_changed_property("Title"));
    assert!(!dossier.remove_changed_property("Title"));
    dossier.cancel_edit();
    assert_eq!(dossier.get_text("Title"), Some("New"));
}

// ── Cascades ─────────────────────────────────────────────────────

#[test]
fn cancel_edit_cascades_to_nested_lines() {
    let fx = Fixture::new();
    let line = fx.persisted("Line", 1).into_ref();
    line.borrow_mut().load_property("Amount", 10.0);
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.add_to_collection("Lines", line.clone());

    line.borrow_mut().set_property("Amount", 99.0);
    assert!(dossier.has_changes());

    dossier.cancel_edit();
    assert_eq!(line.borrow().get_decimal("Amount"), Some(10.0));
    assert!(!line.borrow().is_modified());
    assert!(!dossier.has_changes());
}

#[test]
fn begin_edit_cascades_to_nested_lines() {
    let fx = Fixture::new();
    let line = fx.persisted("Line", 1).into_ref();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.add_to_collection("Lines", line.clone());

    dossier.begin_edit();
    assert!(line.borrow().is_editing());
    dossier.end_edit();
    assert!(!line.borrow().is_editing());
}

#[test]
fn cancel_edit_drops_new_composite_members() {
    let fx = Fixture::new();
    let kept = fx.persisted("Line", 1).into_ref();
    let added = fx.create("Line").into_ref();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.add_to_collection("Lines", kept.clone());
    dossier.add_to_collection("Lines", added.clone());

    dossier.cancel_edit();
    let lines = dossier.get_collection("Lines").unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ptr_eq(&kept));
}

#[test]
fn has_changes_sees_new_nested_member() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    assert!(!dossier.has_changes());
    dossier.add_to_collection("Lines", fx.create("Line").into_ref());
    assert!(dossier.has_changes());
}

#[test]
fn has_changes_ignores_properties_off_the_nesting_list() {
    let fx = Fixture::new();
    let tag = fx.persisted("Tag", 3).into_ref();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.load_property("Label", tag.clone());

    tag.borrow_mut().set_property("Label", "urgent");
    assert!(tag.borrow().has_changes());
    assert!(!dossier.has_changes());
}

#[test]
fn nesting_is_matched_by_declared_type() {
    let fx = Fixture::new();
    let reviewer = fx.persisted("Party", 4).into_ref();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.load_property("Reviewer", reviewer.clone());

    reviewer.borrow_mut().set_property("Name", "Grace");
    assert!(dossier.has_changes());
}

#[test]
fn cyclic_graph_terminates() {
    init_tracing();
    let fx = Fixture::new();
    let dossier = fx.persisted("Dossier", 7).into_ref();
    let line = fx.persisted("Line", 1).into_ref();
    line.borrow_mut().load_property("Dossier", dossier.clone());
    dossier.borrow_mut().add_to_collection("Lines", line.clone());

    assert!(!dossier.borrow().has_changes());
    line.borrow_mut().set_property("Description", "loop");
    assert!(dossier.borrow().has_changes());

    dossier.borrow_mut().cancel_edit();
    assert_eq!(line.borrow().get_text("Description"), None);
    assert!(!dossier.borrow().has_changes());
    assert!(!line.borrow().has_changes());
}

#[test]
fn has_changes_for_new_and_deleted_entities() {
    let fx = Fixture::new();

    let fresh = fx.create("Dossier");
    assert!(fresh.is_new());
    assert!(fresh.has_changes());

    let mut discarded = fx.create("Dossier");
    discarded.delete();
    assert!(!discarded.has_changes());

    let mut removed = fx.persisted("Dossier", 7);
    removed.delete();
    assert!(removed.has_changes());
}

// ── Deletion ─────────────────────────────────────────────────────

#[test]
fn delete_cascades_to_composites_but_not_shared() {
    let fx = Fixture::new();
    let owner = fx.persisted("Party", 2).into_ref();
    let line = fx.persisted("Line", 1).into_ref();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.load_property("Owner", owner.clone());
    dossier.add_to_collection("Lines", line.clone());

    dossier.delete();
    assert!(dossier.is_deleted());
    assert!(line.borrow().is_deleted());
    assert!(!owner.borrow().is_deleted());
}

#[test]
fn undo_delete_restores_graph() {
    let fx = Fixture::new();
    let line = fx.persisted("Line", 1).into_ref();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.add_to_collection("Lines", line.clone());

    dossier.delete();
    dossier.undo_delete();
    assert!(!dossier.is_deleted());
    assert!(!line.borrow().is_deleted());
    assert!(!dossier.has_changes());
}

#[test]
fn cancel_edit_clears_deleted_flag() {
    let fx = Fixture::new();
    let mut dossier = fx.persisted("Dossier", 7);
    dossier.delete();
    dossier.cancel_edit();
    assert!(!dossier.is_deleted());
}

// ── Properties ───────────────────────────────────────────────────

fn title_strategy() -> impl Strategy<Value = String> {
    "[a-z]{0,8}"
}

proptest! {
    #[test]
    fn cancel_restores_value_before_any_write(
        original in title_strategy(),
        writes in prop::collection::vec(title_strategy(), 1..8),
    ) {
        let fx = Fixture::new();
        let mut dossier = fx.persisted("Dossier", 7);
        dossier.load_property("Title", original.as_str());

        for title in &writes {
            dossier.set_property("Title", title.as_str());
        }
        dossier.cancel_edit();

        prop_assert_eq!(dossier.get_text("Title"), Some(original.as_str()));
        prop_assert!(!dossier.has_changes());
    }

    #[test]
    fn ledger_keeps_first_original(
        original in title_strategy(),
        writes in prop::collection::vec(title_strategy(), 1..8),
    ) {
        let fx = Fixture::new();
        let mut dossier = fx.persisted("Dossier", 7);
        dossier.load_property("Title", original.as_str());

        for title in &writes {
            dossier.set_property("Title", title.as_str());
        }

        let changed = writes.iter().any(|title| *title != original);
        prop_assert_eq!(dossier.is_property_changed("Title"), changed);
        if changed {
            prop_assert_eq!(dossier.ledger().original("Title"), Some(&Value::from(original.as_str())));
        }
    }
}

#[test]
fn entity_refs_compare_by_identity() {
    let fx = Fixture::new();
    let a: EntityRef = fx.create("Line").into_ref();
    let b: EntityRef = fx.create("Line").into_ref();
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}
