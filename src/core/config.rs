/*!
 * Pipeline Configuration
 *
 * Settings consumed by every component. Defaults come from `core::limits`;
 * loading and sampling policies live with the host.
 */

use super::errors::ConfigError;
use super::limits::*;
use std::time::Duration;
use url::Url;

/// Secondary shipping destination mirroring primary traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaConfig {
    /// Application id overriding the primary one on every mirrored message
    pub application_id: String,
    pub endpoint: String,
}

/// Activity monitor timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityTimings {
    pub validation_delay: Duration,
    pub end_delay: Duration,
    pub max_duration: Duration,
}

impl Default for ActivityTimings {
    fn default() -> Self {
        Self {
            validation_delay: PAGE_ACTIVITY_VALIDATION_DELAY,
            end_delay: PAGE_ACTIVITY_END_DELAY,
            max_duration: PAGE_ACTIVITY_MAX_DURATION,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct Configuration {
    pub application_id: String,
    pub service: Option<String>,

    /// Primary intake endpoint
    pub endpoint: String,
    pub replica: Option<ReplicaConfig>,

    /// Batch bounds
    pub max_batch_size: usize,
    pub batch_bytes_limit: usize,
    pub max_message_size: usize,
    pub flush_timeout: Duration,

    pub activity: ActivityTimings,
    pub view_update_throttle: Duration,
    pub session_keep_alive: Duration,

    /// Emit the current payload shape instead of the legacy one
    pub v2_format: bool,

    /// Detect actions from clicks
    pub track_interactions: bool,
}

impl Configuration {
    /// Create a configuration with default limits
    pub fn new(application_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            service: None,
            endpoint: endpoint.into(),
            replica: None,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_bytes_limit: DEFAULT_BATCH_BYTES_LIMIT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            activity: ActivityTimings::default(),
            view_update_throttle: THROTTLE_VIEW_UPDATE_PERIOD,
            session_keep_alive: SESSION_KEEP_ALIVE_INTERVAL,
            v2_format: true,
            track_interactions: true,
        }
    }

    /// Read the configuration from `RUM_*` environment variables
    ///
    /// - RUM_APPLICATION_ID (required)
    /// - RUM_ENDPOINT (required)
    /// - RUM_SERVICE
    /// - RUM_V2_FORMAT: "0" or "false" selects the legacy payload shape
    /// - RUM_REPLICA_APPLICATION_ID / RUM_REPLICA_ENDPOINT
    pub fn from_env() -> Result<Self, ConfigError> {
        let application_id = std::env::var("RUM_APPLICATION_ID")
            .map_err(|_| ConfigError::MissingSetting("RUM_APPLICATION_ID".to_string()))?;
        let endpoint = std::env::var("RUM_ENDPOINT")
            .map_err(|_| ConfigError::MissingSetting("RUM_ENDPOINT".to_string()))?;

        let mut config = Self::new(application_id, endpoint);
        config.service = std::env::var("RUM_SERVICE").ok();
        config.v2_format = std::env::var("RUM_V2_FORMAT")
            .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
            .unwrap_or(true);

        if let (Ok(application_id), Ok(endpoint)) = (
            std::env::var("RUM_REPLICA_APPLICATION_ID"),
            std::env::var("RUM_REPLICA_ENDPOINT"),
        ) {
            config.replica = Some(ReplicaConfig {
                application_id,
                endpoint,
            });
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_replica(mut self, application_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.replica = Some(ReplicaConfig {
            application_id: application_id.into(),
            endpoint: endpoint.into(),
        });
        self
    }

    pub fn with_batch_limits(mut self, max_batch_size: usize, batch_bytes_limit: usize, max_message_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self.batch_bytes_limit = batch_bytes_limit;
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_flush_timeout(mut self, flush_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self
    }

    pub fn with_activity(mut self, activity: ActivityTimings) -> Self {
        self.activity = activity;
        self
    }

    pub fn with_v2_format(mut self, enabled: bool) -> Self {
        self.v2_format = enabled;
        self
    }

    pub fn with_track_interactions(mut self, enabled: bool) -> Self {
        self.track_interactions = enabled;
        self
    }

    /// Check limits and endpoints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_id.trim().is_empty() {
            return Err(ConfigError::MissingSetting("application_id".to_string()));
        }

        validate_endpoint(&self.endpoint)?;
        if let Some(replica) = &self.replica {
            validate_endpoint(&replica.endpoint)?;
        }

        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max_batch_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.batch_bytes_limit == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "batch_bytes_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max_message_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.flush_timeout.is_zero() {
            return Err(ConfigError::InvalidLimit {
                name: "flush_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.activity.validation_delay >= self.activity.max_duration {
            return Err(ConfigError::InvalidLimit {
                name: "activity.validation_delay",
                reason: "must be shorter than activity.max_duration".to_string(),
            });
        }

        Ok(())
    }

    /// Whether a URL targets one of the pipeline's own intakes
    ///
    /// Such requests are neither page activity nor collected resources.
    pub fn is_intake_url(&self, url: &str) -> bool {
        let Ok(candidate) = Url::parse(url) else {
            return false;
        };

        is_same_endpoint(&candidate, &self.endpoint)
            || self
                .replica
                .as_ref()
                .map(|replica| is_same_endpoint(&candidate, &replica.endpoint))
                .unwrap_or(false)
    }
}

/// Same origin and path, query ignored
fn is_same_endpoint(candidate: &Url, endpoint: &str) -> bool {
    match Url::parse(endpoint) {
        Ok(endpoint) => candidate.origin() == endpoint.origin() && candidate.path() == endpoint.path(),
        Err(_) => false,
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}
