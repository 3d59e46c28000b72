//! Shared order-entry types and caller-input validation.
//!
//! Everything here runs before a request is built, so a failure never
//! reaches the transport.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SdkError;

// ─── Side ────────────────────────────────────────────────────────────────────

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Side {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(SdkError::InvalidArgument(format!(
                "Invalid side '{}', must be 'buy' or 'sell'",
                s
            ))),
        }
    }
}

// ─── Validation ──────────────────────────────────────────────────────────────

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), SdkError> {
    if value.trim().is_empty() {
        return Err(SdkError::InvalidArgument(format!("{} cannot be empty", field)));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: f64) -> Result<(), SdkError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SdkError::InvalidArgument(format!(
            "{} must be a positive number, got {}",
            field, value
        )));
    }
    Ok(())
}

pub(crate) fn require_finite(field: &str, value: f64) -> Result<(), SdkError> {
    if !value.is_finite() {
        return Err(SdkError::InvalidArgument(format!(
            "{} must be finite, got {}",
            field, value
        )));
    }
    Ok(())
}
