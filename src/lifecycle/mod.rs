/*!
 * Lifecycle Module
 * Event bus connecting instrumentation, trackers, assembly and transport
 */

mod bus;
mod events;

pub use bus::{unsubscribe_all, Handler, LifeCycle, Subscription};
pub use events::{
    FirstInputTiming, LargestContentfulPaintTiming, LayoutShiftTiming, LifeCycleEvent, LifeCycleEventKind,
    LongTaskTiming, NavigationTiming, PaintTiming, PerformanceEntry, RequestCompleteEvent, RequestStartEvent,
    RequestType, ResourceTiming,
};
