/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 *
 * Only construction-time APIs return these. Once the pipeline runs, failures
 * are logged and dropped so telemetry never surfaces into the host.
 */

use miette::Diagnostic;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    #[diagnostic(
        code(config::missing_setting),
        help("Set the value explicitly or through its RUM_* environment variable.")
    )]
    MissingSetting(String),

    #[error("Invalid endpoint URL {url}: {reason}")]
    #[diagnostic(
        code(config::invalid_endpoint),
        help("Endpoints must be absolute http(s) URLs.")
    )]
    InvalidEndpoint { url: String, reason: String },

    #[error("Invalid limit {name}: {reason}")]
    #[diagnostic(code(config::invalid_limit))]
    InvalidLimit { name: &'static str, reason: String },
}

/// Transport errors, only ever logged
#[derive(Error, Debug, Diagnostic)]
pub enum TransportError {
    #[error("Failed to serialize message: {0}")]
    #[diagnostic(code(transport::serialization_failed))]
    Serialization(#[from] serde_json::Error),

    #[error("Request to {url} failed: {reason}")]
    #[diagnostic(
        code(transport::request_failed),
        help("Telemetry is best-effort; the batch is not retried.")
    )]
    RequestFailed { url: String, reason: String },

    #[error("HTTP client could not be built: {0}")]
    #[diagnostic(code(transport::client_build_failed))]
    ClientBuild(String),
}

/// Location parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum LocationError {
    #[error("Unparsable location {href}: {reason}")]
    #[diagnostic(code(location::unparsable))]
    Unparsable { href: String, reason: String },
}

/// Unified pipeline error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum RumError {
    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    #[error("Location error: {0}")]
    #[diagnostic(transparent)]
    Location(#[from] LocationError),
}

/// Result type for construction-time operations
pub type RumResult<T> = Result<T, RumError>;
