/*!
 * Click action tests
 */

use crate::common::{messages, of_type, start, start_with, config};
use rum_pipeline::{ElementSnapshot, RelativeTime, StaticSession};
use std::time::Duration;

fn save_button() -> ElementSnapshot {
    ElementSnapshot::new("button").with_attribute("data-dd-action-name", "Save cart")
}

#[test]
fn test_click_followed_by_mutation_becomes_action() {
    let harness = start();
    let pipeline = &harness.pipeline;

    let action_id = pipeline.click(&save_button()).expect("action should start");
    assert!(pipeline.has_pending_action());

    pipeline.advance_to(RelativeTime(80.0));
    pipeline.dom_mutated();
    pipeline.advance_to(RelativeTime(200.0));
    assert!(!pipeline.has_pending_action());

    pipeline.flush();
    let actions = of_type(&messages(&harness.sender), "action");
    assert_eq!(actions.len(), 1);

    let action = &actions[0];
    assert_eq!(action["action"]["id"], action_id.0.as_str());
    assert_eq!(action["action"]["type"], "click");
    assert_eq!(action["action"]["target"]["name"], "Save cart");
    assert_eq!(action["action"]["loading_time"], 80_000_000);
    assert_eq!(action["action"]["error"]["count"], 0);
    assert_eq!(action["action"]["long_task"]["count"], 0);
    assert_eq!(action["action"]["resource"]["count"], 0);
    assert_eq!(action["view"]["id"], pipeline.current_view_id().0.as_str());
}

#[test]
fn test_click_without_activity_is_discarded() {
    let harness = start();
    let pipeline = &harness.pipeline;

    assert!(pipeline.click(&save_button()).is_some());
    pipeline.advance_by(Duration::from_millis(500));
    assert!(!pipeline.has_pending_action());

    pipeline.flush();
    assert!(of_type(&messages(&harness.sender), "action").is_empty());
}

#[test]
fn test_click_ignored_while_action_pending() {
    let harness = start();
    let pipeline = &harness.pipeline;

    assert!(pipeline.click(&save_button()).is_some());
    assert!(pipeline.click(&save_button()).is_none());
}

#[test]
fn test_click_on_unnamed_element_is_ignored() {
    let harness = start();
    assert!(harness.pipeline.click(&ElementSnapshot::new("div")).is_none());
    assert!(!harness.pipeline.has_pending_action());
}

#[test]
fn test_interactions_disabled() {
    let harness = start_with(config().with_track_interactions(false), StaticSession::tracked());
    assert!(harness.pipeline.click(&save_button()).is_none());
}

#[test]
fn test_events_during_action_are_counted_and_attached() {
    let harness = start();
    let pipeline = &harness.pipeline;

    let action_id = pipeline.click(&save_button()).unwrap();
    pipeline.advance_to(RelativeTime(20.0));
    pipeline.add_error("boom", rum_pipeline::ErrorSource::Custom, None);
    pipeline.dom_mutated();
    pipeline.advance_to(RelativeTime(200.0));
    pipeline.flush();

    let all = messages(&harness.sender);
    let errors = of_type(&all, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["action"]["id"], action_id.0.as_str());

    let actions = of_type(&all, "action");
    assert_eq!(actions[0]["action"]["error"]["count"], 1);
    assert_eq!(actions[0]["action"]["loading_time"], 20_000_000);
}

#[test]
fn test_custom_action_has_no_auto_fields() {
    let harness = start();
    harness.pipeline.add_action("checkout", None);
    harness.pipeline.flush();

    let actions = of_type(&messages(&harness.sender), "action");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["action"]["type"], "custom");
    assert_eq!(actions[0]["action"]["target"]["name"], "checkout");
    assert!(actions[0]["action"].get("loading_time").is_none());
    assert!(actions[0]["action"].get("id").is_none());
}
