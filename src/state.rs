//! Per-form state and the submission lifecycle.
//!
//! A [`FormState`] is owned by exactly one [`SecureForm`](crate::SecureForm)
//! and lives as long as it does. Nothing here is shared between forms.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::validator::FieldErrors;

/// Field name to raw field value.
pub type FormValues = BTreeMap<String, String>;

/// Where a form is in its submission lifecycle.
///
/// ```text
/// Idle --submit--> Validating --valid, allowed--> Submitting --settled--> Idle
///                      |
///                      +--invalid or rate limited--> Idle (with errors)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    /// No submission in flight.
    #[default]
    Idle,
    /// Sanitizing, validating and consulting the rate limiter.
    Validating,
    /// Waiting for the submit handler.
    Submitting,
}

/// An error that belongs to the whole form rather than one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Too many submissions for the form's rate-limit key.
    RateLimited {
        /// Time until the current window rolls over
        retry_after: Duration,
    },
    /// The submit handler reported a failure.
    SubmissionFailed {
        /// Reason reported by the handler
        reason: String,
    },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::RateLimited { retry_after } => {
                // Round up so a banner never says "0 seconds"
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                write!(f, "too many attempts, try again in {}s", secs.max(1))
            }
            FormError::SubmissionFailed { reason } => write!(f, "submission failed: {}", reason),
        }
    }
}

impl std::error::Error for FormError {}

/// The observable state of one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Current raw values, as typed.
    pub values: FormValues,
    /// Current field errors. A field without an entry is valid.
    pub errors: FieldErrors,
    /// Current form-level error, if any.
    pub form_error: Option<FormError>,
    /// Whether a submission is in flight.
    pub is_submitting: bool,
    /// Current lifecycle phase.
    pub phase: SubmitPhase,
}

impl FormState {
    /// Creates a state seeded with `values`.
    pub fn with_values(values: FormValues) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Returns `true` when neither field nor form-level errors are present.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.form_error.is_none()
    }

    pub(crate) fn begin(&mut self) {
        self.is_submitting = true;
        self.phase = SubmitPhase::Validating;
        self.form_error = None;
    }

    pub(crate) fn settle(&mut self) {
        self.is_submitting = false;
        self.phase = SubmitPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::FieldError;

    #[test]
    fn new_state_is_idle_and_clean() {
        let state = FormState::default();

        assert_eq!(state.phase, SubmitPhase::Idle);
        assert!(!state.is_submitting);
        assert!(state.is_clean());
    }

    #[test]
    fn begin_clears_form_error_but_keeps_field_errors() {
        let mut state = FormState::default();
        state.errors.insert("name".to_string(), FieldError::Required);
        state.form_error = Some(FormError::SubmissionFailed {
            reason: "offline".to_string(),
        });

        state.begin();

        assert!(state.is_submitting);
        assert_eq!(state.phase, SubmitPhase::Validating);
        assert!(state.form_error.is_none());
        assert_eq!(state.errors.len(), 1);
    }

    #[test]
    fn settle_returns_to_idle() {
        let mut state = FormState::default();
        state.begin();
        state.phase = SubmitPhase::Submitting;

        state.settle();

        assert!(!state.is_submitting);
        assert_eq!(state.phase, SubmitPhase::Idle);
    }

    #[test]
    fn rate_limited_message_rounds_up() {
        let error = FormError::RateLimited {
            retry_after: Duration::from_millis(12_300),
        };
        assert_eq!(error.to_string(), "too many attempts, try again in 13s");

        let error = FormError::RateLimited {
            retry_after: Duration::ZERO,
        };
        assert_eq!(error.to_string(), "too many attempts, try again in 1s");
    }

    #[test]
    fn submission_failed_message_carries_reason() {
        let error = FormError::SubmissionFailed {
            reason: "server unavailable".to_string(),
        };

        assert_eq!(error.to_string(), "submission failed: server unavailable");
    }
}
