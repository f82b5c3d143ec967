/*!
 * Batching and delivery tests
 */

use crate::common::{config, messages, of_type, start, start_with, INTAKE};
use rum_pipeline::transport::SendMethod;
use rum_pipeline::{ErrorSource, RelativeTime, StaticSession};
use std::time::Duration;

#[test]
fn test_periodic_flush() {
    let harness = start();
    let pipeline = &harness.pipeline;

    pipeline.advance_by(Duration::from_secs(29));
    assert!(harness.sender.sent().is_empty());
    pipeline.advance_by(Duration::from_secs(1));

    let sent = harness.sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, SendMethod::Beacon);
    assert!(sent[0].url.starts_with(&format!("{INTAKE}?batch_time=")));
}

#[test]
fn test_batch_time_uses_flush_time() {
    let harness = start();
    harness.pipeline.advance_to(RelativeTime(1_234.0));
    harness.pipeline.flush();

    let sent = harness.sender.sent();
    assert_eq!(sent[0].url, format!("{INTAKE}?batch_time=1700000001234"));
}

#[test]
fn test_full_batch_is_flushed_immediately() {
    let harness = start_with(config().with_batch_limits(3, 16 * 1024, 256 * 1024), StaticSession::tracked());
    let pipeline = &harness.pipeline;

    pipeline.add_error("first", ErrorSource::Custom, None);
    assert!(harness.sender.sent().is_empty());
    pipeline.add_error("second", ErrorSource::Custom, None);

    let sent = harness.sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].messages().len(), 3);
}

#[test]
fn test_replica_gets_its_own_application_id() {
    let harness = start_with(
        config().with_replica("replica-app", "https://replica.example/v1/input"),
        StaticSession::tracked(),
    );
    harness.pipeline.flush();

    let sent = harness.sender.sent();
    assert_eq!(sent.len(), 2);

    let primary: serde_json::Value = serde_json::from_str(&sent[0].body).unwrap();
    let replica: serde_json::Value = serde_json::from_str(&sent[1].body).unwrap();
    assert_eq!(primary["application"]["id"], "app-1");
    assert_eq!(replica["application"]["id"], "replica-app");
    assert!(sent[1].url.starts_with("https://replica.example/v1/input?batch_time="));
    assert_eq!(primary["view"]["id"], replica["view"]["id"]);
}

#[test]
fn test_untracked_session_sends_nothing() {
    let harness = start_with(config(), StaticSession::untracked());
    let pipeline = &harness.pipeline;

    pipeline.add_error("boom", ErrorSource::Custom, None);
    pipeline.add_action("checkout", None);
    pipeline.before_unload();

    assert!(harness.sender.sent().is_empty());
}

#[test]
fn test_expired_session_drops_events() {
    let harness = start();
    harness.session.expire();
    harness.pipeline.add_error("boom", ErrorSource::Custom, None);
    harness.pipeline.flush();

    let all = messages(&harness.sender);
    assert!(of_type(&all, "error").is_empty());
}

#[test]
fn test_legacy_format() {
    let harness = start_with(config().with_v2_format(false), StaticSession::tracked());
    harness.pipeline.add_error("boom", ErrorSource::Network, None);
    harness.pipeline.flush();

    let all = messages(&harness.sender);
    let error = all
        .iter()
        .find(|message| message["evt"]["category"] == "error")
        .expect("error message");
    assert_eq!(error["application_id"], "app-1");
    assert_eq!(error["error"]["source"], "network");
    assert!(error.get("type").is_none());
    assert!(error.get("_dd").is_none());

    let view = all.iter().find(|message| message["evt"]["category"] == "view").unwrap();
    assert_eq!(view["rum"]["document_version"], 1);
}

#[test]
fn test_stop_releases_timers() {
    let harness = start();
    harness.pipeline.stop();
    assert_eq!(harness.pipeline.scheduler().pending(), 0);

    harness.pipeline.advance_by(Duration::from_secs(60));
    assert!(harness.sender.sent().is_empty());
}

#[test]
fn test_invalid_configuration_is_rejected() {
    use rum_pipeline::{PageStart, PipelineHost, RecordingSender, RumPipeline, StaticEnvironment, TimeStamp, ViewLocation};
    use std::rc::Rc;

    let result = RumPipeline::start(
        rum_pipeline::Configuration::new("", INTAKE),
        PipelineHost {
            session: Rc::new(StaticSession::tracked()),
            environment: Rc::new(StaticEnvironment::new()),
            sender: Rc::new(RecordingSender::new()),
        },
        PageStart {
            time_origin: TimeStamp(0.0),
            location: ViewLocation::parse("https://app.example/").unwrap(),
            referrer: String::new(),
        },
    );
    assert!(result.is_err());
}
