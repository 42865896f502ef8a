use crate::types::status::PredictionStatus;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or argument that caused the error (e.g., "request.version", "prediction.urls.stream")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected format, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "route_resolver", "poll_loop")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the prediction client.
///
/// Variants map one-to-one onto the failure classes a caller has to tell apart:
/// rejected input, a misbehaving remote, a prediction that ended badly on the
/// remote side, and a local poll loop that stopped waiting.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Protocol violation: {message}{}", format_context(.context))]
    Protocol {
        message: String,
        context: ErrorContext,
    },

    #[error("Prediction failed: {message}")]
    PredictionFailed { id: String, message: String },

    #[error("Prediction was canceled (status: {status})")]
    PredictionCanceled {
        id: String,
        status: PredictionStatus,
    },

    #[error("Stopped waiting for prediction {id} after {attempts} polling attempts")]
    PollingExhausted { id: String, attempts: u32 },

    #[error("Streaming error: {message}")]
    Stream { message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::protocol_with_context(msg, ErrorContext::new())
    }

    /// Create a new protocol violation with structured context
    pub fn protocol_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Protocol {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Protocol { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The remote service moved the prediction into a failed, canceled or aborted state.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Error::PredictionFailed { .. } | Error::PredictionCanceled { .. }
        )
    }

    /// The local poll loop gave up while the prediction was still running.
    pub fn is_polling_exhausted(&self) -> bool {
        matches!(self, Error::PollingExhausted { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Prediction id carried by lifecycle errors.
    pub fn prediction_id(&self) -> Option<&str> {
        match self {
            Error::PredictionFailed { id, .. }
            | Error::PredictionCanceled { id, .. }
            | Error::PollingExhausted { id, .. } => Some(id),
            _ => None,
        }
    }
}
