/*!
 * RUM Pipeline
 * Wires every component on one bus, one scheduler and one set of contexts
 *
 * Each pipeline owns all of its state, so several can run side by side in one
 * process. Subscription order matters: parent contexts listen before the view
 * tracker so a session renewal clears them before the next view is created.
 * The assembler and the batch are in place before any tracker starts, so the
 * initial view's immediate first update is shipped.
 */

use crate::action::{ActionTracker, ElementSnapshot};
use crate::assembly::{start_rum_assembly, AssemblyInputs, GlobalContext, ParentContexts};
use crate::collection::{
    add_custom_action, add_error, start_action_collection, start_long_task_collection, start_resource_collection,
    start_view_collection, CustomAction, ErrorSource, ProvidedError,
};
use crate::core::config::Configuration;
use crate::core::errors::RumResult;
use crate::core::types::{ActionId, Context, RelativeTime, TimeStamp, ViewId};
use crate::host::{HostEnvironment, PerformanceTimeline, ResourceTimingBuffer, SessionManager};
use crate::lifecycle::{
    unsubscribe_all, LifeCycle, LifeCycleEvent, PerformanceEntry, RequestCompleteEvent, RequestStartEvent,
    Subscription,
};
use crate::scheduler::Scheduler;
use crate::transport::{RequestSender, RumBatch};
use crate::view::{ViewLocation, ViewTracker};
use serde_json::Value;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

/// Collaborators supplied by the embedding host
pub struct PipelineHost {
    pub session: Rc<dyn SessionManager>,
    pub environment: Rc<dyn HostEnvironment>,
    pub sender: Rc<dyn RequestSender>,
}

/// Where and when the pipeline starts
#[derive(Debug, Clone)]
pub struct PageStart {
    /// Epoch time of relative time zero
    pub time_origin: TimeStamp,
    pub location: ViewLocation,
    pub referrer: String,
}

pub struct RumPipeline {
    lifecycle: LifeCycle,
    scheduler: Rc<Scheduler>,
    config: Rc<Configuration>,
    global_context: Rc<GlobalContext>,
    timeline: Rc<ResourceTimingBuffer>,
    contexts: Rc<ParentContexts>,
    view_tracker: ViewTracker,
    action_tracker: ActionTracker,
    batch: RumBatch,
    subscriptions: Vec<Subscription>,
}

impl RumPipeline {
    /// Validate the configuration and start every component
    pub fn start(config: Configuration, host: PipelineHost, page: PageStart) -> RumResult<Self> {
        config.validate()?;
        let config = Rc::new(config);
        let lifecycle = LifeCycle::new();
        let scheduler = Scheduler::new(page.time_origin);
        let global_context = Rc::new(GlobalContext::new());

        let timeline = Rc::new(ResourceTimingBuffer::new());
        let mut subscriptions = vec![timeline.attach(&lifecycle)];

        let contexts = Rc::new(ParentContexts::start(
            &lifecycle,
            Rc::clone(&scheduler),
            Rc::clone(&host.session),
        ));

        subscriptions.push(start_rum_assembly(
            &lifecycle,
            AssemblyInputs {
                config: Rc::clone(&config),
                session: Rc::clone(&host.session),
                host: Rc::clone(&host.environment),
                contexts: Rc::clone(&contexts),
                global_context: Rc::clone(&global_context),
            },
        ));
        let batch = RumBatch::start(&lifecycle, Rc::clone(&scheduler), &config, host.sender);

        subscriptions.push(start_view_collection(&lifecycle));
        subscriptions.push(start_action_collection(&lifecycle));
        subscriptions.extend(start_resource_collection(
            &lifecycle,
            Rc::clone(&scheduler),
            Rc::clone(&config),
            Rc::clone(&host.session),
            Rc::clone(&timeline) as Rc<dyn PerformanceTimeline>,
        ));
        subscriptions.push(start_long_task_collection(&lifecycle, Rc::clone(&scheduler)));

        let view_tracker = ViewTracker::start(
            &lifecycle,
            Rc::clone(&scheduler),
            Rc::clone(&config),
            Rc::clone(&host.environment),
            page.location,
            page.referrer,
        );
        let action_tracker = ActionTracker::start(&lifecycle, Rc::clone(&scheduler), Rc::clone(&config));

        info!(
            application_id = %config.application_id,
            v2_format = config.v2_format,
            replica = config.replica.is_some(),
            "RUM pipeline started"
        );

        Ok(Self {
            lifecycle,
            scheduler,
            config,
            global_context,
            timeline,
            contexts,
            view_tracker,
            action_tracker,
            batch,
            subscriptions,
        })
    }

    pub fn lifecycle(&self) -> &LifeCycle {
        &self.lifecycle
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    #[inline]
    pub fn now(&self) -> RelativeTime {
        self.scheduler.now()
    }

    // ========================================================================
    // Instrumentation inputs
    // ========================================================================

    pub fn dom_mutated(&self) {
        self.lifecycle.notify(LifeCycleEvent::DomMutated);
    }

    pub fn performance_entry(&self, entry: PerformanceEntry) {
        self.lifecycle.notify(LifeCycleEvent::PerformanceEntryCollected(entry));
    }

    pub fn request_started(&self, request_index: u64) {
        self.lifecycle
            .notify(LifeCycleEvent::RequestStarted(RequestStartEvent { request_index }));
    }

    pub fn request_completed(&self, request: RequestCompleteEvent) {
        self.lifecycle.notify(LifeCycleEvent::RequestCompleted(request));
    }

    /// Click on an element; the id of the action it started, if any
    pub fn click(&self, target: &ElementSnapshot) -> Option<ActionId> {
        self.action_tracker.click(target)
    }

    pub fn location_changed(&self, href: &str) -> RumResult<()> {
        let location = ViewLocation::parse(href)?;
        self.view_tracker.location_changed(location);
        Ok(())
    }

    /// Notify a session renewal; the session provider already holds the new id
    pub fn renew_session(&self) {
        self.lifecycle.notify(LifeCycleEvent::SessionRenewed);
    }

    /// End the current view and ship everything pending
    pub fn before_unload(&self) {
        self.lifecycle.notify(LifeCycleEvent::BeforeUnload);
        self.batch.flush();
    }

    // ========================================================================
    // Public API
    // ========================================================================

    pub fn add_error(&self, message: impl Into<String>, source: ErrorSource, context: Option<Context>) {
        add_error(
            &self.lifecycle,
            ProvidedError {
                message: message.into(),
                source,
                stack: None,
                error_type: None,
                start_clocks: self.scheduler.clocks_now(),
                context,
                saved_global_context: self.global_context.snapshot(),
            },
        );
    }

    pub fn add_action(&self, name: impl Into<String>, context: Option<Context>) {
        add_custom_action(
            &self.lifecycle,
            CustomAction {
                name: name.into(),
                start_clocks: self.scheduler.clocks_now(),
                context,
                saved_global_context: self.global_context.snapshot(),
            },
        );
    }

    pub fn set_global_context(&self, context: Context) {
        self.global_context.set(context);
    }

    pub fn add_global_context_property(&self, key: impl Into<String>, value: Value) {
        self.global_context.add_property(key, value);
    }

    pub fn remove_global_context_property(&self, key: &str) {
        self.global_context.remove_property(key);
    }

    pub fn global_context(&self) -> Context {
        self.global_context.snapshot()
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Move virtual time forward, firing due timers
    pub fn advance_to(&self, target: RelativeTime) -> usize {
        self.scheduler.advance_to(target)
    }

    pub fn advance_by(&self, duration: Duration) -> usize {
        self.scheduler.advance_by(duration)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn current_view_id(&self) -> ViewId {
        self.view_tracker.current_view_id()
    }

    pub fn has_pending_action(&self) -> bool {
        self.action_tracker.has_pending_action()
    }

    pub fn buffered_resource_timings(&self) -> usize {
        self.timeline.len()
    }

    /// Flush pending batches without ending the view
    pub fn flush(&self) {
        self.batch.flush();
    }

    /// Detach every component and release its timers
    pub fn stop(&self) {
        self.action_tracker.stop();
        self.view_tracker.stop();
        self.batch.stop();
        self.contexts.stop();
        unsubscribe_all(&self.subscriptions);
        debug!(pending_timers = self.scheduler.pending(), "RUM pipeline stopped");
    }
}
