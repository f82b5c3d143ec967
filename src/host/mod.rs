/*!
 * Host Module
 * Boundary traits for session, page environment and performance timeline,
 * with in-memory implementations
 */

mod environment;
mod session;
mod timeline;
pub mod traits;

pub use environment::StaticEnvironment;
pub use session::StaticSession;
pub use timeline::ResourceTimingBuffer;
pub use traits::{HostEnvironment, PerformanceTimeline, SessionManager};
