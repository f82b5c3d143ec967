/*!
 * Core Module
 * Fundamental pipeline types, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod tracer;
pub mod types;

// Re-export for convenience
pub use config::{ActivityTimings, Configuration, ReplicaConfig};
pub use errors::*;
pub use tracer::init_tracing;
pub use types::*;
