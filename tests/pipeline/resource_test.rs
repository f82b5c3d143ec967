/*!
 * Resource collection tests
 */

use crate::common::{messages, of_type, start, start_with, config, TIME_ORIGIN};
use rum_pipeline::lifecycle::{RequestCompleteEvent, RequestType, ResourceTiming};
use rum_pipeline::{PerformanceEntry, RelativeTime, StaticSession};

const API_URL: &str = "https://api.example/items";

fn fetch_timing() -> ResourceTiming {
    ResourceTiming {
        name: API_URL.to_string(),
        initiator_type: "fetch".to_string(),
        start_time: RelativeTime(110.0),
        duration: 30.0,
        fetch_start: RelativeTime(110.0),
        domain_lookup_start: RelativeTime(110.0),
        domain_lookup_end: RelativeTime(112.0),
        connect_start: RelativeTime(112.0),
        connect_end: RelativeTime(114.0),
        request_start: RelativeTime(115.0),
        response_start: RelativeTime(130.0),
        response_end: RelativeTime(140.0),
        decoded_body_size: Some(512),
        ..ResourceTiming::default()
    }
}

fn completed_fetch() -> RequestCompleteEvent {
    RequestCompleteEvent {
        request_index: 1,
        request_type: RequestType::Fetch,
        method: "GET".to_string(),
        url: API_URL.to_string(),
        status: 200,
        start_time: RelativeTime(100.0),
        duration: 100.0,
    }
}

#[test]
fn test_request_is_correlated_with_its_timing_entry() {
    let harness = start();
    let pipeline = &harness.pipeline;

    pipeline.advance_to(RelativeTime(100.0));
    pipeline.request_started(1);
    pipeline.advance_to(RelativeTime(150.0));
    pipeline.performance_entry(PerformanceEntry::Resource(fetch_timing()));
    assert_eq!(pipeline.buffered_resource_timings(), 1);
    pipeline.advance_to(RelativeTime(200.0));
    pipeline.request_completed(completed_fetch());
    pipeline.flush();

    let resources = of_type(&messages(&harness.sender), "resource");
    assert_eq!(resources.len(), 1);
    let resource = &resources[0]["resource"];
    assert_eq!(resource["type"], "fetch");
    assert_eq!(resource["method"], "GET");
    assert_eq!(resource["status_code"], 200);
    assert_eq!(resource["duration"], 30_000_000);
    assert_eq!(resource["size"], 512);
    assert_eq!(resources[0]["date"].as_f64(), Some(TIME_ORIGIN + 110.0));
}

#[test]
fn test_unmatched_request_uses_its_own_timing() {
    let harness = start();
    let pipeline = &harness.pipeline;

    pipeline.advance_to(RelativeTime(200.0));
    pipeline.request_completed(completed_fetch());
    pipeline.flush();

    let resources = of_type(&messages(&harness.sender), "resource");
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["resource"]["duration"], 100_000_000);
    assert!(resources[0]["resource"].get("size").is_none());
    assert_eq!(resources[0]["date"].as_f64(), Some(TIME_ORIGIN + 100.0));
}

#[test]
fn test_static_resource_entry_is_collected() {
    let harness = start();
    let timing = ResourceTiming {
        name: "https://cdn.example/app.js".to_string(),
        initiator_type: "script".to_string(),
        ..fetch_timing()
    };
    harness.pipeline.performance_entry(PerformanceEntry::Resource(timing));
    harness.pipeline.flush();

    let resources = of_type(&messages(&harness.sender), "resource");
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["resource"]["type"], "js");
    assert_eq!(resources[0]["resource"]["url"], "https://cdn.example/app.js");
}

#[test]
fn test_intake_requests_are_not_collected() {
    let harness = start();
    let mut request = completed_fetch();
    request.url = format!("{}?batch_time=1", crate::common::INTAKE);
    harness.pipeline.request_completed(request);
    harness.pipeline.flush();

    assert!(of_type(&messages(&harness.sender), "resource").is_empty());
}

#[test]
fn test_session_without_resources_skips_them() {
    let harness = start_with(config(), StaticSession::tracked_without_resources());
    harness.pipeline.request_completed(completed_fetch());
    harness.pipeline.flush();

    let all = messages(&harness.sender);
    assert!(of_type(&all, "resource").is_empty());
    assert_eq!(of_type(&all, "view").len(), 1);
}
