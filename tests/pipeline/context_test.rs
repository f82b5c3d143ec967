/*!
 * Global and customer context tests
 */

use crate::common::{config, messages, of_type, start, start_with};
use rum_pipeline::{ErrorSource, StaticSession};
use serde_json::{json, Map};

#[test]
fn test_global_context_is_captured_at_call_time() {
    let harness = start();
    let pipeline = &harness.pipeline;

    pipeline.add_global_context_property("plan", json!("free"));
    pipeline.add_error("first", ErrorSource::Custom, None);
    pipeline.add_global_context_property("plan", json!("pro"));
    pipeline.add_error("second", ErrorSource::Custom, None);
    pipeline.flush();

    let errors = of_type(&messages(&harness.sender), "error");
    assert_eq!(errors[0]["context"]["plan"], "free");
    assert_eq!(errors[1]["context"]["plan"], "pro");
}

#[test]
fn test_customer_context_overrides_global() {
    let harness = start();
    let pipeline = &harness.pipeline;

    let mut global = Map::new();
    global.insert("plan".to_string(), json!("pro"));
    global.insert("team".to_string(), json!({"name": "growth", "size": 4}));
    pipeline.set_global_context(global);

    let mut customer = Map::new();
    customer.insert("team".to_string(), json!({"size": 5}));
    pipeline.add_action("checkout", Some(customer));
    pipeline.flush();

    let actions = of_type(&messages(&harness.sender), "action");
    assert_eq!(
        actions[0]["context"],
        json!({"plan": "pro", "team": {"name": "growth", "size": 5}})
    );
}

#[test]
fn test_removed_property_is_not_sent() {
    let harness = start();
    let pipeline = &harness.pipeline;

    pipeline.add_global_context_property("plan", json!("pro"));
    pipeline.remove_global_context_property("plan");
    assert!(pipeline.global_context().is_empty());
    pipeline.add_error("boom", ErrorSource::Custom, None);
    pipeline.flush();

    let errors = of_type(&messages(&harness.sender), "error");
    assert!(errors[0].get("context").is_none());
}

#[test]
fn test_legacy_format_merges_context_at_top_level() {
    let harness = start_with(config().with_v2_format(false), StaticSession::tracked());
    harness.pipeline.add_global_context_property("plan", json!("pro"));
    harness.pipeline.add_error("boom", ErrorSource::Custom, None);
    harness.pipeline.flush();

    let all = messages(&harness.sender);
    let error = all.iter().find(|message| message["evt"]["category"] == "error").unwrap();
    assert_eq!(error["plan"], "pro");
    assert!(error.get("context").is_none());
}

#[test]
fn test_service_is_forwarded() {
    let harness = start_with(config().with_service("storefront"), StaticSession::tracked());
    harness.pipeline.flush();

    let views = of_type(&messages(&harness.sender), "view");
    assert_eq!(views[0]["service"], "storefront");
    assert_eq!(views[0]["session"]["type"], "user");
}
