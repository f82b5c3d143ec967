/*!
 * View lifecycle tests
 */

use crate::common::{messages, of_type, start, PAGE_URL, TIME_ORIGIN};
use rum_pipeline::{ErrorSource, RelativeTime};

#[test]
fn test_initial_view_is_sent_on_flush() {
    let harness = start();
    harness.pipeline.flush();

    let views = of_type(&messages(&harness.sender), "view");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["view"]["url"], PAGE_URL);
    assert_eq!(views[0]["view"]["loading_type"], "initial_load");
    assert_eq!(views[0]["view"]["is_active"], true);
    assert_eq!(views[0]["_dd"]["document_version"], 1);
    assert_eq!(views[0]["date"].as_f64(), Some(TIME_ORIGIN));
}

#[test]
fn test_view_updates_are_upserted_within_a_batch() {
    let harness = start();
    let pipeline = &harness.pipeline;

    pipeline.advance_to(RelativeTime(10.0));
    pipeline.add_error("boom", ErrorSource::Custom, None);
    pipeline.advance_to(RelativeTime(3_100.0));
    pipeline.flush();

    let sent = harness.sender.sent();
    assert_eq!(sent.len(), 1);

    let all = messages(&harness.sender);
    let views = of_type(&all, "view");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["_dd"]["document_version"], 2);
    assert_eq!(views[0]["view"]["error"]["count"], 1);
    // the replaced view keeps its original position
    assert_eq!(all[0]["type"], "view");
    assert_eq!(all[1]["type"], "error");
}

#[test]
fn test_before_unload_ends_view_and_flushes() {
    let harness = start();
    let pipeline = &harness.pipeline;

    pipeline.advance_to(RelativeTime(1_000.0));
    pipeline.before_unload();

    let views = of_type(&messages(&harness.sender), "view");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["view"]["is_active"], false);
    assert_eq!(views[0]["view"]["time_spent"], 1_000_000_000i64);
    assert_eq!(views[0]["_dd"]["document_version"], 2);
}

#[test]
fn test_route_change_starts_new_view() {
    let harness = start();
    let pipeline = &harness.pipeline;
    let initial = pipeline.current_view_id();

    pipeline.advance_to(RelativeTime(500.0));
    pipeline.location_changed("https://app.example/cart").unwrap();
    assert_ne!(pipeline.current_view_id(), initial);
    pipeline.flush();

    let views = of_type(&messages(&harness.sender), "view");
    assert_eq!(views.len(), 2);
    assert_eq!(views[0]["view"]["id"], initial.0.as_str());
    assert_eq!(views[0]["view"]["is_active"], false);
    assert_eq!(views[1]["view"]["loading_type"], "route_change");
    assert_eq!(views[1]["view"]["url"], "https://app.example/cart");
    assert_eq!(views[1]["view"]["referrer"], PAGE_URL);
}

#[test]
fn test_search_change_keeps_view() {
    let harness = start();
    let pipeline = &harness.pipeline;
    let initial = pipeline.current_view_id();

    pipeline.location_changed("https://app.example/home?tab=2").unwrap();
    assert_eq!(pipeline.current_view_id(), initial);
    pipeline.flush();

    let views = of_type(&messages(&harness.sender), "view");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["view"]["url"], "https://app.example/home?tab=2");
}

#[test]
fn test_unparsable_location_is_an_error() {
    let harness = start();
    assert!(harness.pipeline.location_changed("not a url").is_err());
}

#[test]
fn test_session_renewal_starts_view_in_new_session() {
    let harness = start();
    let pipeline = &harness.pipeline;
    let initial = pipeline.current_view_id();
    pipeline.flush();
    let first_session = of_type(&messages(&harness.sender), "view")[0]["session"]["id"].clone();

    pipeline.advance_to(RelativeTime(500.0));
    let renewed = harness.session.renew();
    pipeline.renew_session();
    assert_ne!(pipeline.current_view_id(), initial);
    pipeline.flush();

    let views = of_type(&messages(&harness.sender), "view");
    let last = views.last().unwrap();
    assert_eq!(last["session"]["id"], renewed.as_str());
    assert_ne!(last["session"]["id"], first_session);
    assert_eq!(last["view"]["loading_type"], "route_change");
    assert_eq!(last["view"]["url"], PAGE_URL);
    // the ended view's last update is not re-attributed to the new session
    let initial_updates = views.iter().filter(|view| view["view"]["id"] == initial.0.as_str()).count();
    assert_eq!(initial_updates, 1);
}
