//! Settings reconciler tests
//!
//! Broadcast, setters, store notifications, instance tracking and the
//! match-brackets command notification.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use common::{broadcast_writes, FakeEditor, Harness, PlainWidget};
use editor_sync::commands::CommandId;
use editor_sync::config::EditorConfig;
use editor_sync::editor::{EditorOption, EditorWidget, InstanceId};
use editor_sync::settings::SettingsStore;

fn record_command_changes(harness: &Harness) -> (Rc<RefCell<Vec<CommandId>>>, editor_sync::Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = harness
        .reconciler
        .command_changed()
        .connect(move |id| sink.borrow_mut().push(*id));
    (seen, subscription)
}

// ========================================================================
// Initialization
// ========================================================================

#[test]
fn test_initialize_applies_loaded_values_to_every_instance() {
    let harness = Harness::new([
        ("keyMap", json!("vim")),
        ("theme", json!("material")),
        ("matchBrackets", json!(true)),
    ]);
    let first = FakeEditor::new(1);
    let second = FakeEditor::new(2);
    harness.add(&first);
    harness.add(&second);

    harness.initialize();

    for editor in [&first, &second] {
        assert_eq!(
            editor.shared_options(),
            (
                Some("vim".to_string()),
                Some("material".to_string()),
                Some(true)
            )
        );
    }
}

#[test]
fn test_initialize_with_empty_store_uses_defaults() {
    let harness = Harness::new([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    editor.clear_writes();

    harness.initialize();

    assert_eq!(editor.writes(), broadcast_writes("default", "default", false));
    assert_eq!(harness.reconciler.config(), EditorConfig::default());
}

#[test]
fn test_null_and_missing_values_fall_back_to_defaults() {
    let harness = Harness::initialized([
        ("theme", Value::Null),
        ("keyMap", json!("sublime")),
        ("matchBrackets", json!(true)),
    ]);

    let config = harness.reconciler.config();
    assert_eq!(config.theme, "default");
    assert_eq!(config.key_map, "sublime");
    assert!(config.match_brackets);
}

#[test]
fn test_wrong_types_fall_back_to_defaults() {
    let harness = Harness::initialized([
        ("theme", json!(42)),
        ("keyMap", json!("")),
        ("matchBrackets", json!("yes")),
    ]);
    assert_eq!(harness.reconciler.config(), EditorConfig::default());
}

#[test]
fn test_no_broadcast_before_initialize() {
    let harness = Harness::new([("theme", json!("seti"))]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    editor.clear_writes();

    harness.store.load(editor_sync::PLUGIN_ID).unwrap();
    harness.store.set_external("theme", json!("mbo"));
    harness.store.pump();

    assert!(editor.writes().is_empty());
    assert!(!harness.reconciler.is_initialized());
}

#[test]
fn test_setter_before_initialize_persists_without_broadcast() {
    let harness = Harness::new([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    editor.clear_writes();
    harness.store.load(editor_sync::PLUGIN_ID).unwrap();

    harness.reconciler.set_theme("zenburn").wait().unwrap();

    assert!(editor.writes().is_empty());
    assert_eq!(harness.reconciler.config().theme, "zenburn");
    assert_eq!(harness.store.get("theme"), Some(json!("zenburn")));
}

// ========================================================================
// Setters
// ========================================================================

#[test]
fn test_set_key_map_updates_every_instance_before_return() {
    let harness = Harness::initialized([]);
    let first = FakeEditor::new(1);
    let second = FakeEditor::new(2);
    harness.add(&first);
    harness.add(&second);

    let _pending = harness.reconciler.set_key_map("emacs");

    assert!(harness.reconciler.is_key_map("emacs"));
    for editor in [&first, &second] {
        assert_eq!(editor.shared_options().0, Some("emacs".to_string()));
    }
}

#[test]
fn test_set_theme_persists_value() {
    let harness = Harness::initialized([]);
    harness.reconciler.set_theme("hopscotch").wait().unwrap();
    assert_eq!(harness.store.get("theme"), Some(json!("hopscotch")));
    assert_eq!(harness.store.write_count(), 1);
}

#[test]
fn test_empty_names_become_defaults() {
    let harness = Harness::initialized([("keyMap", json!("vim")), ("theme", json!("seti"))]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);

    harness.reconciler.set_key_map("").wait().unwrap();
    harness.reconciler.set_theme("").wait().unwrap();

    assert!(harness.reconciler.is_key_map("default"));
    assert!(harness.reconciler.is_theme("default"));
    assert_eq!(harness.store.get("keyMap"), Some(json!("default")));
    assert_eq!(
        editor.shared_options(),
        (
            Some("default".to_string()),
            Some("default".to_string()),
            Some(false)
        )
    );
}

#[test]
fn test_set_match_brackets_broadcasts_all_three_options() {
    let harness = Harness::initialized([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    editor.clear_writes();

    harness.reconciler.set_match_brackets(true).wait().unwrap();

    assert_eq!(editor.writes(), broadcast_writes("default", "default", true));
    assert_eq!(harness.store.get("matchBrackets"), Some(json!(true)));
}

#[test]
fn test_failed_write_keeps_in_memory_value() {
    let harness = Harness::initialized([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    harness.store.fail_writes(true);

    let result = harness.reconciler.set_theme("mbo").wait();

    assert!(result.is_err());
    assert!(harness.reconciler.is_theme("mbo"));
    assert_eq!(editor.shared_options().1, Some("mbo".to_string()));
    assert_eq!(harness.store.get("theme"), None);
}

// ========================================================================
// Store notifications
// ========================================================================

#[test]
fn test_external_change_is_broadcast_on_pump() {
    let harness = Harness::initialized([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);

    harness.store.set_external("theme", json!("the-matrix"));
    assert_eq!(editor.shared_options().1, Some("default".to_string()));

    harness.store.pump();
    assert_eq!(editor.shared_options().1, Some("the-matrix".to_string()));
    assert!(harness.reconciler.is_theme("the-matrix"));
}

#[test]
fn test_on_settings_changed_is_idempotent() {
    let harness = Harness::initialized([("keyMap", json!("vim"))]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);

    harness.reconciler.on_settings_changed();
    let once = (harness.reconciler.config(), editor.shared_options());
    harness.reconciler.on_settings_changed();
    let twice = (harness.reconciler.config(), editor.shared_options());

    assert_eq!(once, twice);
}

#[test]
fn test_own_write_round_trips_through_store_notification() {
    let harness = Harness::initialized([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);

    harness.reconciler.set_key_map("sublime").wait().unwrap();
    editor.clear_writes();
    assert_eq!(harness.store.pump(), 1);

    assert_eq!(editor.writes(), broadcast_writes("sublime", "default", false));
}

#[test]
fn test_dispose_stops_following_store() {
    let harness = Harness::initialized([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    harness.reconciler.dispose();
    editor.clear_writes();

    harness.store.set_external("theme", json!("seti"));
    harness.store.pump();

    assert!(editor.writes().is_empty());
    assert!(harness.reconciler.is_theme("default"));
}

// ========================================================================
// Instance tracking
// ========================================================================

#[test]
fn test_new_instance_gets_exactly_three_options() {
    let harness = Harness::initialized([
        ("theme", json!("material")),
        ("keyMap", json!("vim")),
        ("matchBrackets", json!(true)),
    ]);
    let editor = FakeEditor::new(7);
    harness.add(&editor);

    assert_eq!(editor.writes(), broadcast_writes("vim", "material", true));
}

#[test]
fn test_adding_instance_leaves_others_alone() {
    let harness = Harness::initialized([]);
    let first = FakeEditor::new(1);
    harness.add(&first);
    first.clear_writes();

    harness.add(&FakeEditor::new(2));

    assert!(first.writes().is_empty());
    assert_eq!(harness.store.write_count(), 0);
}

#[test]
fn test_widgets_without_options_are_skipped() {
    let harness = Harness::initialized([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    assert!(harness
        .tracker
        .add(PlainWidget::new(2) as Rc<dyn EditorWidget>));

    harness.reconciler.set_theme("seti").wait().unwrap();

    assert_eq!(harness.tracker.len(), 2);
    assert_eq!(editor.shared_options().1, Some("seti".to_string()));
}

#[test]
fn test_removed_instance_no_longer_updated() {
    let harness = Harness::initialized([]);
    let editor = FakeEditor::new(1);
    harness.add(&editor);
    harness.tracker.remove(InstanceId(1));
    editor.clear_writes();

    harness.reconciler.set_theme("seti").wait().unwrap();

    assert!(editor.writes().is_empty());
    assert!(!harness.reconciler.has_instances());
}

// ========================================================================
// Match-brackets notification
// ========================================================================

#[test]
fn test_first_instance_announces_match_brackets() {
    let harness = Harness::initialized([]);
    let (seen, _subscription) = record_command_changes(&harness);

    harness.add(&FakeEditor::new(1));
    assert_eq!(*seen.borrow(), vec![CommandId::MatchBrackets]);

    harness.add(&FakeEditor::new(2));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_two_to_one_announces_match_brackets() {
    let harness = Harness::initialized([]);
    harness.add(&FakeEditor::new(1));
    harness.add(&FakeEditor::new(2));
    let (seen, _subscription) = record_command_changes(&harness);

    harness.tracker.remove(InstanceId(2));

    assert_eq!(*seen.borrow(), vec![CommandId::MatchBrackets]);
}

#[test]
fn test_dropping_to_zero_is_silent() {
    let harness = Harness::initialized([]);
    harness.add(&FakeEditor::new(1));
    let (seen, _subscription) = record_command_changes(&harness);

    harness.tracker.remove(InstanceId(1));

    assert!(seen.borrow().is_empty());
}

#[test]
fn test_count_change_called_directly() {
    let harness = Harness::initialized([]);
    let (seen, _subscription) = record_command_changes(&harness);

    harness.reconciler.on_instance_count_changed(2);
    harness.reconciler.on_instance_count_changed(0);
    assert!(seen.borrow().is_empty());

    harness.reconciler.on_instance_count_changed(1);
    assert_eq!(*seen.borrow(), vec![CommandId::MatchBrackets]);
}

#[test]
fn test_apply_to_single_instance() {
    let harness = Harness::initialized([("theme", json!("xq-light"))]);
    let editor = FakeEditor::new(3);

    harness.reconciler.on_instance_added(editor.as_ref());

    assert!(editor.writes().contains(&EditorOption::Theme("xq-light".to_string())));
    assert_eq!(editor.writes().len(), 3);
}
