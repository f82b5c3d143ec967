/*!
 * Batch Benchmarks
 * Measure message admission, view upserts and wire formatting
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rum_pipeline::assembly::{to_wire, AssembledEvent, RumContext, SessionType, ViewContext, ViewRef, WireFormat};
use rum_pipeline::collection::{ErrorPayload, ErrorSource, RawErrorEvent, RawRumEvent};
use rum_pipeline::transport::{Batch, BatchLimits, HttpRequest, RequestSender};
use rum_pipeline::{Scheduler, TimeStamp, TransportError, ViewId};
use serde_json::{json, Value};
use std::rc::Rc;

/// Sender discarding every batch
struct NullSender;

impl RequestSender for NullSender {
    fn send_beacon(&self, _url: &str, _body: &str) -> bool {
        true
    }

    fn post(&self, _url: &str, _body: String) -> Result<(), TransportError> {
        Ok(())
    }
}

fn batch() -> Batch {
    let request = HttpRequest::new(
        "https://intake.example/v1/input",
        16 * 1024,
        Scheduler::new(TimeStamp(1_700_000_000_000.0)),
        Rc::new(NullSender),
    );
    Batch::new(
        request,
        BatchLimits {
            max_size: 50,
            bytes_limit: 16 * 1024,
            max_message_size: 256 * 1024,
        },
    )
}

fn message(payload_len: usize) -> Value {
    json!({
        "type": "error",
        "date": 1_700_000_000_000u64,
        "error": {"message": "x".repeat(payload_len), "source": "custom"},
    })
}

fn error_event() -> AssembledEvent {
    AssembledEvent {
        rum: RumContext {
            application_id: "app-1".to_string(),
            service: Some("storefront".to_string()),
            session_type: SessionType::User,
        },
        session_id: "session-1".to_string(),
        view: ViewContext {
            session_id: Some("session-1".to_string()),
            view: ViewRef {
                id: ViewId("view-1".to_string()),
                referrer: String::new(),
                url: "https://app.example/home".to_string(),
            },
        },
        action: None,
        raw: RawRumEvent::Error(RawErrorEvent {
            date: TimeStamp(1_700_000_000_000.0),
            error: ErrorPayload {
                message: "TypeError: undefined is not a function".to_string(),
                source: ErrorSource::Source,
                stack: Some("at checkout (app.js:10:3)".to_string()),
                error_type: Some("TypeError".to_string()),
            },
        }),
        context: Some(json!({"plan": "pro", "team": {"name": "growth"}}).as_object().cloned().unwrap_or_default()),
    }
}

fn bench_batch_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_add");

    for payload_len in [16usize, 256, 2048] {
        let msg = message(payload_len);
        group.throughput(Throughput::Bytes(serde_json::to_vec(&msg).unwrap().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(payload_len), &msg, |b, msg| {
            let batch = batch();
            b.iter(|| batch.add(black_box(msg)));
        });
    }

    group.finish();
}

fn bench_view_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_upsert");

    for views in [1usize, 10] {
        let keys: Vec<String> = (0..views).map(|i| format!("view-{i}")).collect();
        let msg = message(512);
        group.bench_with_input(BenchmarkId::new("distinct_views", views), &keys, |b, keys| {
            let batch = batch();
            b.iter(|| {
                for key in keys {
                    batch.upsert(black_box(&msg), key);
                }
            });
        });
    }

    group.finish();
}

fn bench_to_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_wire");
    let event = error_event();

    group.bench_function("v2", |b| {
        b.iter(|| to_wire(black_box(&event), WireFormat::V2).unwrap());
    });
    group.bench_function("v1", |b| {
        b.iter(|| to_wire(black_box(&event), WireFormat::V1).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_batch_add, bench_view_upsert, bench_to_wire);
criterion_main!(benches);
