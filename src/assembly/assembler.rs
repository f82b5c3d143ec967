/*!
 * Event Assembler
 * Layers session, view and action contexts over raw events
 *
 * Events are dropped when the session is not tracked or no view was active at
 * their start time. Only errors, resources and long tasks take the action
 * active at their start.
 */

use super::contexts::{ActionContext, ParentContexts, ViewContext};
use super::format::combine;
use super::global_context::GlobalContext;
use crate::collection::{RawRumEvent, RawRumEventCollected, RumEventType};
use crate::core::config::Configuration;
use crate::core::types::{Context, ViewId};
use crate::host::{HostEnvironment, SessionManager};
use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, Subscription};
use serde::Serialize;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    User,
    Synthetics,
}

/// Application-level fields, computed for each event
#[derive(Debug, Clone, PartialEq)]
pub struct RumContext {
    pub application_id: String,
    pub service: Option<String>,
    pub session_type: SessionType,
}

/// Raw event with every context layer resolved
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledEvent {
    pub rum: RumContext,
    pub session_id: String,
    pub view: ViewContext,
    pub action: Option<ActionContext>,
    pub raw: RawRumEvent,
    /// Global and customer context captured at assembly time
    pub context: Option<Context>,
}

impl AssembledEvent {
    #[inline]
    pub fn event_type(&self) -> RumEventType {
        self.raw.event_type()
    }

    #[inline]
    pub fn view_id(&self) -> &ViewId {
        &self.view.view.id
    }

    /// Revision of a view event, `None` for other kinds
    pub fn document_version(&self) -> Option<u64> {
        match &self.raw {
            RawRumEvent::View(view) => Some(view.document_version),
            _ => None,
        }
    }

    /// Copy addressed to another application
    pub fn with_application_id(&self, application_id: &str) -> Self {
        let mut event = self.clone();
        event.rum.application_id = application_id.to_string();
        event
    }
}

/// Sources the assembler reads from
pub struct AssemblyInputs {
    pub config: Rc<Configuration>,
    pub session: Rc<dyn SessionManager>,
    pub host: Rc<dyn HostEnvironment>,
    pub contexts: Rc<ParentContexts>,
    pub global_context: Rc<GlobalContext>,
}

pub fn start_rum_assembly(lifecycle: &LifeCycle, inputs: AssemblyInputs) -> Subscription {
    let bus = lifecycle.clone();
    lifecycle.subscribe(LifeCycleEventKind::RawRumEventCollected, move |event| {
        let LifeCycleEvent::RawRumEventCollected(collected) = event else {
            return;
        };
        if let Some(assembled) = assemble(&inputs, collected) {
            bus.notify(LifeCycleEvent::RumEventCollected(assembled));
        }
    })
}

fn assemble(inputs: &AssemblyInputs, collected: &RawRumEventCollected) -> Option<AssembledEvent> {
    let event_type = collected.raw.event_type();

    if !inputs.session.is_tracked() {
        debug!(event_type = event_type.as_str(), "session not tracked, dropping event");
        return None;
    }

    let Some(view) = inputs.contexts.find_view(Some(collected.start_time)) else {
        debug!(
            event_type = event_type.as_str(),
            start_time = %collected.start_time,
            "no view at event start, dropping event"
        );
        return None;
    };
    let Some(session_id) = view.session_id.clone() else {
        debug!(event_type = event_type.as_str(), "view has no session, dropping event");
        return None;
    };

    let action = if event_type.assembles_with_action() {
        inputs.contexts.find_action(Some(collected.start_time))
    } else {
        None
    };

    let mut context = match &collected.saved_global_context {
        Some(saved) => saved.clone(),
        None => inputs.global_context.snapshot(),
    };
    if let Some(customer) = &collected.customer_context {
        combine(&mut context, customer);
    }

    Some(AssembledEvent {
        rum: RumContext {
            application_id: inputs.config.application_id.clone(),
            service: inputs.config.service.clone(),
            session_type: if inputs.host.is_synthetics() {
                SessionType::Synthetics
            } else {
                SessionType::User
            },
        },
        session_id,
        view,
        action,
        raw: collected.raw.clone(),
        context: (!context.is_empty()).then_some(context),
    })
}
