/*!
 * Pipeline Limits and Constants
 *
 * Centralized location for every delay, bound and threshold used by the pipeline.
 * Organized by subsystem; configuration defaults are taken from here.
 */

use std::time::Duration;

// =============================================================================
// PAGE ACTIVITY
// =============================================================================

/// Time allowed for the first activity signal after a monitor starts
/// Without any signal in this window the monitored span is considered empty
pub const PAGE_ACTIVITY_VALIDATION_DELAY: Duration = Duration::from_millis(100);

/// Quiet period after an idle signal before the page is declared settled
pub const PAGE_ACTIVITY_END_DELAY: Duration = Duration::from_millis(100);

/// Hard upper bound on a monitored span
pub const PAGE_ACTIVITY_MAX_DURATION: Duration = Duration::from_millis(10_000);

// =============================================================================
// VIEWS
// =============================================================================

/// Trailing-edge throttle window for view updates
pub const THROTTLE_VIEW_UPDATE_PERIOD: Duration = Duration::from_millis(3_000);

/// Keep-alive period re-emitting the current view (5 minutes)
pub const SESSION_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

// =============================================================================
// PARENT CONTEXTS
// =============================================================================

/// How long an ended view stays resolvable by timestamp (4 hours)
pub const VIEW_CONTEXT_TIME_OUT_DELAY: Duration = Duration::from_secs(4 * 60 * 60);

/// How long a completed action stays resolvable by timestamp (5 minutes)
pub const ACTION_CONTEXT_TIME_OUT_DELAY: Duration = Duration::from_secs(5 * 60);

/// Period of the history cleanup
pub const CLEAR_OLD_CONTEXTS_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// REQUEST TIMING CORRELATION
// =============================================================================

/// Tolerance (ms) when checking that a timing entry nests inside its request
/// Request and timing clocks are rounded independently by the host
pub const REQUEST_MATCHING_ERROR_MARGIN_MS: f64 = 1.0;

/// Resource timing entries retained for correlation, oldest evicted first
pub const RESOURCE_TIMING_BUFFER_SIZE: usize = 250;

// =============================================================================
// ACTIONS
// =============================================================================

/// Maximum length of a computed action name before truncation
pub const ACTION_NAME_MAX_LENGTH: usize = 100;

/// Attribute carrying a programmatic action name
pub const ACTION_NAME_ATTRIBUTE: &str = "data-dd-action-name";

/// Ancestors searched when the clicked element itself yields no name
pub const ACTION_NAME_MAX_PARENTS: usize = 10;

// =============================================================================
// BATCHING
// =============================================================================

/// Maximum number of messages in one batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Maximum payload size of one batch (16KB)
pub const DEFAULT_BATCH_BYTES_LIMIT: usize = 16 * 1024;

/// Maximum size of one message (256KB); larger messages are dropped
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// Periodic flush interval
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout applied to blocking HTTP sends
pub const HTTP_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameter stamped on every batch URL
pub const BATCH_TIME_PARAMETER: &str = "batch_time";

/// Wire format version advertised by the current payload shape
pub const FORMAT_VERSION: u8 = 2;
