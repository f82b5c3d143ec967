/*!
 * Action Collection
 * Raw action events from completed auto actions and custom actions
 */

use super::raw::{ActionPayload, ActionTarget, Count, RawActionEvent, RawRumEvent, RawRumEventCollected};
use crate::action::{ActionType, CompletedAction};
use crate::core::types::{ClocksState, Context, ServerDuration};
use crate::lifecycle::{LifeCycle, LifeCycleEvent, LifeCycleEventKind, Subscription};

/// Action added through the public API
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAction {
    pub name: String,
    pub start_clocks: ClocksState,
    pub context: Option<Context>,
    /// Global context at the time of the call
    pub saved_global_context: Context,
}

pub fn start_action_collection(lifecycle: &LifeCycle) -> Subscription {
    let bus = lifecycle.clone();
    lifecycle.subscribe(LifeCycleEventKind::AutoActionCompleted, move |event| {
        if let LifeCycleEvent::AutoActionCompleted(action) = event {
            bus.notify(LifeCycleEvent::RawRumEventCollected(process_auto_action(action)));
        }
    })
}

/// Collect a custom action
pub fn add_custom_action(lifecycle: &LifeCycle, action: CustomAction) {
    lifecycle.notify(LifeCycleEvent::RawRumEventCollected(process_custom_action(action)));
}

fn process_auto_action(action: &CompletedAction) -> RawRumEventCollected {
    let raw = RawActionEvent {
        date: action.start_clocks.time_stamp,
        action: ActionPayload {
            id: Some(action.id.clone()),
            action_type: action.action_type,
            target: ActionTarget {
                name: action.name.clone(),
            },
            loading_time: Some(ServerDuration::from_millis(action.duration)),
            error: Some(Count::from(action.counts.error_count)),
            long_task: Some(Count::from(action.counts.long_task_count)),
            resource: Some(Count::from(action.counts.resource_count)),
        },
    };
    RawRumEventCollected::new(action.start_clocks.relative, RawRumEvent::Action(raw))
}

fn process_custom_action(action: CustomAction) -> RawRumEventCollected {
    let raw = RawActionEvent {
        date: action.start_clocks.time_stamp,
        action: ActionPayload {
            id: None,
            action_type: ActionType::Custom,
            target: ActionTarget { name: action.name },
            loading_time: None,
            error: None,
            long_task: None,
            resource: None,
        },
    };
    RawRumEventCollected {
        start_time: action.start_clocks.relative,
        raw: RawRumEvent::Action(raw),
        saved_global_context: Some(action.saved_global_context),
        customer_context: action.context,
    }
}
