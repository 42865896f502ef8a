//! Prediction lifecycle states and their terminal classification.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remote lifecycle state of a prediction, as spelled on the wire.
///
/// `Starting` is the queued state (waiting for a worker / cold boot),
/// `Processing` is the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Aborted,
}

/// Coarse classification that drives polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    TerminalSuccess,
    TerminalFailure,
    NonTerminal,
}

/// Classify a status. Total over every known status.
pub fn classify(status: PredictionStatus) -> StatusClass {
    match status {
        PredictionStatus::Succeeded => StatusClass::TerminalSuccess,
        PredictionStatus::Failed | PredictionStatus::Canceled | PredictionStatus::Aborted => {
            StatusClass::TerminalFailure
        }
        PredictionStatus::Starting | PredictionStatus::Processing => StatusClass::NonTerminal,
    }
}

impl PredictionStatus {
    pub const ALL: [PredictionStatus; 6] = [
        PredictionStatus::Starting,
        PredictionStatus::Processing,
        PredictionStatus::Succeeded,
        PredictionStatus::Failed,
        PredictionStatus::Canceled,
        PredictionStatus::Aborted,
    ];

    pub fn class(self) -> StatusClass {
        classify(self)
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self.class(), StatusClass::NonTerminal)
    }

    /// Canceled and aborted predictions are reported differently from plain failures.
    pub fn is_cancellation(self) -> bool {
        matches!(self, PredictionStatus::Canceled | PredictionStatus::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PredictionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                Error::protocol_with_context(
                    "Unknown prediction status",
                    ErrorContext::new()
                        .with_field_path("prediction.status")
                        .with_details(format!("received {:?}", s)),
                )
            })
    }
}
