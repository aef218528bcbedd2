//! Layered error definitions
//!
//! Categorized by source: config / port / estimation / runtime

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum PllError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Port Errors =====
    /// start() called before a timing port was bound
    #[error("timing port unbound: bind a port before starting the loop")]
    PortUnbound,

    /// Device clock query failed or hung
    #[error("timing port error: {message}")]
    Port { message: String },

    // ===== Estimation Errors =====
    /// Offset campaign produced no usable sample within its budget
    #[error("offset probe timeout after {probes} probes in {elapsed_ms}ms")]
    ProbeTimeout { probes: u32, elapsed_ms: u64 },

    // ===== Runtime Errors =====
    /// Frame event or query against a stopped loop
    #[error("loop not running: call start() first")]
    NotRunning,

    /// Runtime divergence; the loop is FAULTED and must be restarted
    #[error("loop faulted: {reason}")]
    Fault { reason: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PllError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create timing port error
    pub fn port(message: impl Into<String>) -> Self {
        Self::Port {
            message: message.into(),
        }
    }

    /// Create fault error
    pub fn fault(reason: impl Into<String>) -> Self {
        Self::Fault {
            reason: reason.into(),
        }
    }
}
