/*!
 * RUM Batch
 * Ships assembled events to the primary intake and the optional replica
 *
 * View events are upserted by view id so only the latest revision of a view
 * leaves in a given batch. Batches flush when full, on a periodic timer and
 * when the pipeline unloads.
 */

use super::batch::{Batch, BatchLimits};
use super::http::{HttpRequest, RequestSender};
use crate::assembly::{to_wire, AssembledEvent, WireFormat};
use crate::collection::RumEventType;
use crate::core::config::Configuration;
use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, Subscription};
use crate::scheduler::{Scheduler, TimerId};
use std::rc::Rc;
use tracing::warn;

struct ReplicaBatch {
    batch: Batch,
    application_id: String,
}

struct Batches {
    format: WireFormat,
    primary: Batch,
    replica: Option<ReplicaBatch>,
}

impl Batches {
    fn collect(&self, event: &AssembledEvent) {
        ship(&self.primary, event, self.format);
        if let Some(replica) = &self.replica {
            ship(&replica.batch, &event.with_application_id(&replica.application_id), self.format);
        }
    }

    fn flush(&self) {
        self.primary.flush();
        if let Some(replica) = &self.replica {
            replica.batch.flush();
        }
    }
}

fn ship(batch: &Batch, event: &AssembledEvent, format: WireFormat) {
    let message = match to_wire(event, format) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, event_type = event.event_type().as_str(), "event could not be formatted");
            return;
        }
    };
    match event.event_type() {
        RumEventType::View => batch.upsert(&message, &event.view_id().0),
        _ => batch.add(&message),
    }
}

/// Batched delivery of every assembled event
pub struct RumBatch {
    batches: Rc<Batches>,
    scheduler: Rc<Scheduler>,
    subscription: Subscription,
    flush_timer: TimerId,
}

impl RumBatch {
    pub fn start(
        lifecycle: &LifeCycle,
        scheduler: Rc<Scheduler>,
        config: &Configuration,
        sender: Rc<dyn RequestSender>,
    ) -> Self {
        let limits = BatchLimits {
            max_size: config.max_batch_size,
            bytes_limit: config.batch_bytes_limit,
            max_message_size: config.max_message_size,
        };
        let make_batch = |endpoint: &str| {
            Batch::new(
                HttpRequest::new(endpoint, limits.bytes_limit, Rc::clone(&scheduler), Rc::clone(&sender)),
                limits,
            )
        };

        let batches = Rc::new(Batches {
            format: WireFormat::from_flag(config.v2_format),
            primary: make_batch(&config.endpoint),
            replica: config.replica.as_ref().map(|replica| ReplicaBatch {
                batch: make_batch(&replica.endpoint),
                application_id: replica.application_id.clone(),
            }),
        });

        let subscription = {
            let batches = Rc::clone(&batches);
            lifecycle.subscribe(LifeCycleEventKind::RumEventCollected, move |event| {
                if let LifeCycleEvent::RumEventCollected(assembled) = event {
                    batches.collect(assembled);
                }
            })
        };

        let flush_timer = {
            let batches = Rc::downgrade(&batches);
            scheduler.set_interval(config.flush_timeout, move || {
                if let Some(batches) = batches.upgrade() {
                    batches.flush();
                }
            })
        };

        Self {
            batches,
            scheduler,
            subscription,
            flush_timer,
        }
    }

    /// Flush primary and replica batches
    pub fn flush(&self) {
        self.batches.flush();
    }

    pub fn stop(&self) {
        self.subscription.unsubscribe();
        self.scheduler.clear(self.flush_timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{RumContext, SessionType, ViewContext, ViewRef};
    use crate::collection::{LongTaskPayload, RawLongTaskEvent, RawRumEvent};
    use crate::core::types::{ServerDuration, TimeStamp, ViewId};
    use crate::transport::http::RecordingSender;
    use serde_json::Value;
    use std::time::Duration;

    fn long_task() -> AssembledEvent {
        AssembledEvent {
            rum: RumContext {
                application_id: "primary-app".to_string(),
                service: None,
                session_type: SessionType::User,
            },
            session_id: "s1".to_string(),
            view: ViewContext {
                session_id: Some("s1".to_string()),
                view: ViewRef {
                    id: ViewId("v1".to_string()),
                    referrer: String::new(),
                    url: "https://app.example/".to_string(),
                },
            },
            action: None,
            raw: RawRumEvent::LongTask(RawLongTaskEvent {
                date: TimeStamp(0.0),
                long_task: LongTaskPayload {
                    duration: ServerDuration(1),
                },
            }),
            context: None,
        }
    }

    fn parse(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_periodic_flush() {
        let lifecycle = LifeCycle::new();
        let scheduler = Scheduler::new(TimeStamp(0.0));
        let sender = Rc::new(RecordingSender::new());
        let config = Configuration::new("primary-app", "https://intake.example/v1/input")
            .with_flush_timeout(Duration::from_secs(30));
        let _batch = RumBatch::start(&lifecycle, Rc::clone(&scheduler), &config, Rc::clone(&sender) as Rc<dyn RequestSender>);

        lifecycle.notify(LifeCycleEvent::RumEventCollected(long_task()));
        scheduler.advance_by(Duration::from_secs(29));
        assert!(sender.sent().is_empty());
        scheduler.advance_by(Duration::from_secs(1));
        assert_eq!(sender.sent().len(), 1);
    }

    #[test]
    fn test_replica_receives_overridden_application_id() {
        let lifecycle = LifeCycle::new();
        let sender = Rc::new(RecordingSender::new());
        let config = Configuration::new("primary-app", "https://intake.example/v1/input")
            .with_replica("replica-app", "https://replica.example/v1/input");
        let batch = RumBatch::start(
            &lifecycle,
            Scheduler::new(TimeStamp(0.0)),
            &config,
            Rc::clone(&sender) as Rc<dyn RequestSender>,
        );

        lifecycle.notify(LifeCycleEvent::RumEventCollected(long_task()));
        batch.flush();

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].url.starts_with("https://intake.example/v1/input?batch_time="));
        assert_eq!(parse(&sent[0].body)["application"]["id"], "primary-app");
        assert!(sent[1].url.starts_with("https://replica.example/v1/input?batch_time="));
        assert_eq!(parse(&sent[1].body)["application"]["id"], "replica-app");
    }

    #[test]
    fn test_legacy_format_flag() {
        let lifecycle = LifeCycle::new();
        let sender = Rc::new(RecordingSender::new());
        let config = Configuration::new("primary-app", "https://intake.example/v1/input").with_v2_format(false);
        let batch = RumBatch::start(
            &lifecycle,
            Scheduler::new(TimeStamp(0.0)),
            &config,
            Rc::clone(&sender) as Rc<dyn RequestSender>,
        );

        lifecycle.notify(LifeCycleEvent::RumEventCollected(long_task()));
        batch.flush();

        let message = parse(&sender.sent()[0].body);
        assert_eq!(message["application_id"], "primary-app");
        assert_eq!(message["evt"]["category"], "long_task");
    }

    #[test]
    fn test_stop_unsubscribes_and_clears_timer() {
        let lifecycle = LifeCycle::new();
        let scheduler = Scheduler::new(TimeStamp(0.0));
        let sender = Rc::new(RecordingSender::new());
        let config = Configuration::new("primary-app", "https://intake.example/v1/input");
        let batch = RumBatch::start(&lifecycle, Rc::clone(&scheduler), &config, Rc::clone(&sender) as Rc<dyn RequestSender>);

        batch.stop();
        assert_eq!(scheduler.pending(), 0);
        lifecycle.notify(LifeCycleEvent::RumEventCollected(long_task()));
        batch.flush();
        assert!(sender.sent().is_empty());
    }
}
