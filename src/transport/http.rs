/*!
 * HTTP Request
 * Fire-and-forget delivery of serialized batches
 *
 * Each send is tagged with a `batch_time` query parameter. Payloads under the
 * byte limit go through the beacon path first; anything else, or a refused
 * beacon, is POSTed. Failures are logged and never retried.
 */

use crate::core::errors::TransportError;
use crate::core::limits::{BATCH_TIME_PARAMETER, HTTP_SEND_TIMEOUT};
use crate::scheduler::Scheduler;
use std::cell::RefCell;
use std::rc::Rc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Delivery primitives of the host
pub trait RequestSender {
    /// Queue a non-blocking send; `false` when the host refused it
    fn send_beacon(&self, url: &str, body: &str) -> bool;

    /// Blocking POST
    fn post(&self, url: &str, body: String) -> Result<(), TransportError>;
}

/// Sends batches to one endpoint
pub struct HttpRequest {
    endpoint: String,
    bytes_limit: usize,
    scheduler: Rc<Scheduler>,
    sender: Rc<dyn RequestSender>,
}

impl HttpRequest {
    pub fn new(
        endpoint: impl Into<String>,
        bytes_limit: usize,
        scheduler: Rc<Scheduler>,
        sender: Rc<dyn RequestSender>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bytes_limit,
            scheduler,
            sender,
        }
    }

    pub fn send(&self, data: String, size: usize) {
        let url = self.url_with_batch_time();

        if size < self.bytes_limit && self.sender.send_beacon(&url, &data) {
            debug!(url = %url, size, "batch sent through beacon");
            return;
        }

        match self.sender.post(&url, data) {
            Ok(()) => debug!(url = %url, size, "batch posted"),
            Err(e) => warn!(url = %url, size, error = %e, "batch delivery failed"),
        }
    }

    fn url_with_batch_time(&self) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            self.endpoint,
            separator,
            BATCH_TIME_PARAMETER,
            self.scheduler.clocks_now().time_stamp.0 as i64
        )
    }
}

/// `reqwest` backed sender
///
/// Beacons run on detached threads; `join_pending` waits for them.
pub struct ReqwestSender {
    client: reqwest::blocking::Client,
    beacons: RefCell<Vec<JoinHandle<()>>>,
}

impl ReqwestSender {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_SEND_TIMEOUT)
            .user_agent(concat!("rum-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            beacons: RefCell::new(Vec::new()),
        })
    }

    /// Beacons not yet joined
    pub fn pending_beacons(&self) -> usize {
        self.beacons.borrow().len()
    }

    /// Wait for every beacon still in flight
    pub fn join_pending(&self) {
        let beacons: Vec<_> = self.beacons.borrow_mut().drain(..).collect();
        for beacon in beacons {
            if beacon.join().is_err() {
                warn!("beacon thread panicked");
            }
        }
    }
}

/// Join beacon threads that already returned
fn reap_finished(beacons: &mut Vec<JoinHandle<()>>) {
    let (finished, running): (Vec<_>, Vec<_>) = beacons.drain(..).partition(|beacon| beacon.is_finished());
    *beacons = running;
    for beacon in finished {
        if beacon.join().is_err() {
            warn!("beacon thread panicked");
        }
    }
}

fn post_blocking(client: &reqwest::blocking::Client, url: &str, body: String) -> Result<(), TransportError> {
    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
        .body(body)
        .send()
        .map_err(|e| TransportError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::RequestFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", status.as_u16()),
        });
    }
    Ok(())
}

impl RequestSender for ReqwestSender {
    fn send_beacon(&self, url: &str, body: &str) -> bool {
        let client = self.client.clone();
        let url = url.to_string();
        let body = body.to_string();

        let spawned = std::thread::Builder::new()
            .name("rum-beacon".to_string())
            .spawn(move || {
                if let Err(e) = post_blocking(&client, &url, body) {
                    warn!(error = %e, "beacon delivery failed");
                }
            });

        match spawned {
            Ok(handle) => {
                let mut beacons = self.beacons.borrow_mut();
                reap_finished(&mut beacons);
                beacons.push(handle);
                true
            }
            Err(e) => {
                warn!(error = %e, "beacon thread could not be spawned");
                false
            }
        }
    }

    fn post(&self, url: &str, body: String) -> Result<(), TransportError> {
        post_blocking(&self.client, url, body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMethod {
    Beacon,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub method: SendMethod,
    pub url: String,
    pub body: String,
}

impl SentRequest {
    /// Body lines, one message each
    pub fn messages(&self) -> Vec<&str> {
        self.body.split('\n').collect()
    }
}

/// In-memory sender keeping every request
#[derive(Debug)]
pub struct RecordingSender {
    accept_beacons: bool,
    sent: RefCell<Vec<SentRequest>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self {
            accept_beacons: true,
            sent: RefCell::new(Vec::new()),
        }
    }

    /// Sender whose beacons are always refused
    pub fn without_beacon() -> Self {
        Self {
            accept_beacons: false,
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.borrow().clone()
    }

    pub fn take(&self) -> Vec<SentRequest> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }
}

impl Default for RecordingSender {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSender for RecordingSender {
    fn send_beacon(&self, url: &str, body: &str) -> bool {
        if !self.accept_beacons {
            return false;
        }
        self.sent.borrow_mut().push(SentRequest {
            method: SendMethod::Beacon,
            url: url.to_string(),
            body: body.to_string(),
        });
        true
    }

    fn post(&self, url: &str, body: String) -> Result<(), TransportError> {
        self.sent.borrow_mut().push(SentRequest {
            method: SendMethod::Post,
            url: url.to_string(),
            body,
        });
        Ok(())
    }
}
