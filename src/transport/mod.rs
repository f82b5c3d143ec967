/*!
 * Transport Module
 * Batching and delivery of assembled events
 */

mod batch;
mod http;
mod rum_batch;

pub use batch::{Batch, BatchLimits};
pub use http::{HttpRequest, RecordingSender, ReqwestSender, RequestSender, SendMethod, SentRequest};
pub use rum_batch::RumBatch;
