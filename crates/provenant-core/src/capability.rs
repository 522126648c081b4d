//! Optional-capability and per-step outcome types
//!
//! Extractors never probe for optional dependencies themselves. The engine
//! decides once, at construction, whether each capability is available and
//! hands the extractors a [`Capability`]. Each optional sub-check then reports
//! a [`StepOutcome`] which the extractor folds into the score.

use crate::error::Error;

/// An optional dependency that was either initialized or ruled out
#[derive(Debug, Clone)]
pub enum Capability<T = ()> {
    /// The capability is ready to use
    Available(T),

    /// The capability could not be initialized or was disabled
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    /// Mark a capability as unavailable
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Build from an initialization result, keeping the failure reason
    pub fn from_result(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(e) => Self::unavailable(e.to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Borrow the capability if it is available
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    /// Why the capability is unavailable, if it is
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

impl Capability<()> {
    /// Enabled/disabled toggle with no payload
    pub fn toggle(enabled: bool, disabled_reason: impl Into<String>) -> Self {
        if enabled {
            Self::Available(())
        } else {
            Self::unavailable(disabled_reason)
        }
    }
}

/// Result of one optional sub-check
#[derive(Debug)]
pub enum StepOutcome<T> {
    /// The step ran and produced a value
    Completed(T),

    /// The step did not run (capability unavailable or not applicable)
    Skipped(String),

    /// The step ran and failed
    Failed(Error),
}

impl<T> StepOutcome<T> {
    /// Convert a fallible computation into a step outcome
    pub fn from_result(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(e) => Self::Failed(e),
        }
    }

    /// Skip the step when the capability is unavailable, run it otherwise
    pub fn when_available<C>(
        capability: &Capability<C>,
        run: impl FnOnce(&C) -> crate::Result<T>,
    ) -> Self {
        match capability {
            Capability::Available(c) => Self::from_result(run(c)),
            Capability::Unavailable { reason } => Self::Skipped(reason.clone()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The completed value, discarding skip/failure details
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the completed value
    pub fn as_completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Log non-completed outcomes at debug level under `step`
    pub fn trace(self, step: &'static str) -> Self {
        match &self {
            Self::Completed(_) => {}
            Self::Skipped(reason) => tracing::debug!(step, reason = %reason, "step skipped"),
            Self::Failed(e) => tracing::debug!(step, error = %e, "step failed"),
        }
        self
    }
}
