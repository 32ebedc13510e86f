//! The secure form controller.
//!
//! A [`SecureForm`] binds one [`FormSchema`], one rate-limit key and one
//! [`SubmitHandler`]. Views drive it through [`SecureForm::update_field`] and
//! [`SecureForm::submit`] and render from its state.
//!
//! # Submit flow
//!
//! ```text
//! submit()
//!   ↓ already submitting? → Busy (no-op)
//!   ↓ sanitize configured fields
//!   ↓ validate against the schema      → Invalid (field errors, handler not called)
//!   ↓ check_and_record(rate-limit key) → RateLimited (form error, handler not called)
//!   ↓ handler.on_submit(Verified<values>).await
//!   ↓ Ok  → Submitted (errors cleared)
//!   ↓ Err → Failed (form error, values untouched)
//! ```
//!
//! Every path leaves the form idle with `is_submitting == false`, including a
//! submit future that is dropped while the handler is pending.
//!
//! # Threading
//!
//! Form state lives in a `RefCell`: a form belongs to one thread, like the
//! view that owns it. Several `submit` futures may still be polled together on
//! that thread; the `is_submitting` guard lets only the first one through.
//! The shared [`RateLimiter`] is thread-safe and is never held across an
//! `.await`.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigErrorKind};
use crate::logging::FormLog;
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::sanitizer::sanitize_fields;
use crate::schema::FormSchema;
use crate::state::{FormError, FormState, FormValues, SubmitPhase};
use crate::validator::{validate, FieldError, FieldErrors};
use crate::verified::Verified;

/// Rate-limit key used when none is configured.
pub const DEFAULT_RATE_LIMIT_KEY: &str = "form-submit";

/// Failure reported by a [`SubmitHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    reason: String,
}

impl SubmitFailure {
    /// Creates a failure with a user-presentable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for SubmitFailure {}

/// Receives cleaned, validated values when a submission goes through.
///
/// This is where the real work (a network call, a store) happens. Any
/// closure `Fn(Verified<FormValues>) -> impl Future<Output = Result<(), SubmitFailure>>`
/// is a handler.
pub trait SubmitHandler {
    /// Consumes one accepted submission.
    fn on_submit(
        &self,
        values: Verified<FormValues>,
    ) -> impl Future<Output = Result<(), SubmitFailure>>;
}

impl<F, Fut> SubmitHandler for F
where
    F: Fn(Verified<FormValues>) -> Fut,
    Fut: Future<Output = Result<(), SubmitFailure>>,
{
    fn on_submit(
        &self,
        values: Verified<FormValues>,
    ) -> impl Future<Output = Result<(), SubmitFailure>> {
        self(values)
    }
}

/// How a call to [`SecureForm::submit`] settled.
///
/// This mirrors what the form state already shows; it is not an error channel.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReport {
    /// Another submission was in flight; nothing happened.
    Busy,
    /// At least one field failed validation.
    Invalid,
    /// The rate-limit key is exhausted for the current window.
    RateLimited,
    /// The handler reported a failure.
    Failed,
    /// The handler accepted the values.
    Submitted,
}

impl SubmitReport {
    /// Returns `true` when the handler accepted the values.
    pub fn is_submitted(self) -> bool {
        self == SubmitReport::Submitted
    }
}

/// Validated configuration for a [`SecureForm`].
#[derive(Debug, Clone)]
pub struct FormConfig {
    schema: Arc<FormSchema>,
    rate_limit_key: String,
    sanitize_fields: Vec<String>,
    rate_limit: RateLimitPolicy,
    initial_values: FormValues,
}

impl FormConfig {
    /// Starts configuring a form for `schema`.
    pub fn builder(schema: Arc<FormSchema>) -> FormConfigBuilder {
        FormConfigBuilder {
            schema,
            rate_limit_key: DEFAULT_RATE_LIMIT_KEY.to_string(),
            sanitize_fields: Vec::new(),
            rate_limit: RateLimitPolicy::default(),
            initial_values: FormValues::new(),
        }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Returns the rate-limit key.
    pub fn rate_limit_key(&self) -> &str {
        &self.rate_limit_key
    }

    /// Returns the fields sanitized before validation.
    pub fn sanitize_fields(&self) -> &[String] {
        &self.sanitize_fields
    }

    /// Returns the rate-limit policy.
    pub fn rate_limit(&self) -> RateLimitPolicy {
        self.rate_limit
    }

    /// Returns the values a new form starts with.
    pub fn initial_values(&self) -> &FormValues {
        &self.initial_values
    }
}

/// Builder for [`FormConfig`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use secure_form::{FieldSchema, FormConfig, FormSchema, RateLimitPolicy};
///
/// let schema = FormSchema::builder()
///     .field(FieldSchema::text("name").required().length(1, 100))
///     .build()
///     .unwrap();
///
/// let config = FormConfig::builder(Arc::new(schema))
///     .rate_limit_key("profile-update")
///     .sanitize_fields(["name"])
///     .rate_limit(RateLimitPolicy::new(5, Duration::from_secs(60)))
///     .initial_value("name", "Alex")
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.rate_limit_key(), "profile-update");
/// ```
#[derive(Debug, Clone)]
pub struct FormConfigBuilder {
    schema: Arc<FormSchema>,
    rate_limit_key: String,
    sanitize_fields: Vec<String>,
    rate_limit: RateLimitPolicy,
    initial_values: FormValues,
}

impl FormConfigBuilder {
    /// Sets the rate-limit key shared by every form of this kind.
    pub fn rate_limit_key(mut self, key: impl Into<String>) -> Self {
        self.rate_limit_key = key.into();
        self
    }

    /// Adds fields to sanitize before validation.
    pub fn sanitize_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sanitize_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Sets the rate-limit policy.
    pub fn rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }

    /// Seeds one field. Empty values are skipped.
    pub fn initial_value(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.initial_values.insert(field.into(), value);
        }
        self
    }

    /// Seeds several fields. Empty values are skipped.
    pub fn initial_values<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        values
            .into_iter()
            .fold(self, |builder, (field, value)| builder.initial_value(field, value))
    }

    /// Checks the configuration and produces a [`FormConfig`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the rate-limit key is empty, the policy
    /// can never allow a call, or a sanitized field is not declared in the
    /// schema.
    pub fn build(mut self) -> Result<FormConfig, ConfigError> {
        if self.rate_limit_key.trim().is_empty() {
            return Err(ConfigError::new(
                ConfigErrorKind::InvalidRateLimit,
                "rate limit key must not be empty",
            ));
        }

        self.rate_limit.validate()?;

        if let Some(field) = self
            .sanitize_fields
            .iter()
            .find(|field| !self.schema.contains(field))
        {
            return Err(ConfigError::new(
                ConfigErrorKind::UnknownSanitizeField {
                    field: field.clone(),
                },
                "sanitized fields must be declared in the schema",
            ));
        }

        let mut seen = Vec::with_capacity(self.sanitize_fields.len());
        self.sanitize_fields.retain(|field| {
            if seen.contains(field) {
                false
            } else {
                seen.push(field.clone());
                true
            }
        });

        Ok(FormConfig {
            schema: self.schema,
            rate_limit_key: self.rate_limit_key,
            sanitize_fields: self.sanitize_fields,
            rate_limit: self.rate_limit,
            initial_values: self.initial_values,
        })
    }
}

/// Stateful controller for one rendered form.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use secure_form::{
///     FieldSchema, FormConfig, FormSchema, FormValues, RateLimiter, SecureForm,
///     SubmitFailure, SubmitReport, Verified,
/// };
///
/// # tokio::runtime::Builder::new_current_thread()
/// #     .build()
/// #     .expect("runtime builds")
/// #     .block_on(async {
/// let schema = FormSchema::builder()
///     .field(FieldSchema::text("name").required().length(1, 100))
///     .build()
///     .unwrap();
/// let config = FormConfig::builder(Arc::new(schema))
///     .sanitize_fields(["name"])
///     .build()
///     .unwrap();
///
/// let form = SecureForm::new(
///     config,
///     Arc::new(RateLimiter::new()),
///     |values: Verified<FormValues>| async move {
///         assert_eq!(values.get("name"), Some("Alex"));
///         Ok::<(), SubmitFailure>(())
///     },
/// );
///
/// form.update_field("name", "<b>Alex</b>");
/// assert_eq!(form.submit().await, SubmitReport::Submitted);
/// # });
/// ```
pub struct SecureForm<H> {
    config: FormConfig,
    limiter: Arc<RateLimiter>,
    handler: H,
    state: RefCell<FormState>,
}

impl<H: SubmitHandler> SecureForm<H> {
    /// Creates a form seeded with the configured initial values.
    ///
    /// `limiter` should be the process-wide limiter shared by every form, so
    /// that rebuilding a form does not reset its submission budget.
    pub fn new(config: FormConfig, limiter: Arc<RateLimiter>, handler: H) -> Self {
        let state = FormState::with_values(config.initial_values.clone());
        Self {
            config,
            limiter,
            handler,
            state: RefCell::new(state),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Returns a logger stamped with this form's rate-limit key.
    pub fn log(&self) -> FormLog<'_> {
        FormLog::new(&self.config.rate_limit_key)
    }

    /// Stores a raw value and clears the field's current error.
    ///
    /// No sanitization or validation happens here; both are deferred to
    /// [`submit`](Self::submit).
    pub fn update_field(&self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let mut state = self.state.borrow_mut();
        state.errors.remove(&field);
        state.values.insert(field, value.into());
    }

    /// Returns the raw value of `field`.
    pub fn value(&self, field: &str) -> Option<String> {
        self.state.borrow().values.get(field).cloned()
    }

    /// Returns all raw values.
    pub fn values(&self) -> FormValues {
        self.state.borrow().values.clone()
    }

    /// Returns the error attached to `field`, if any.
    pub fn error(&self, field: &str) -> Option<FieldError> {
        self.state.borrow().errors.get(field).cloned()
    }

    /// Returns all field errors.
    pub fn errors(&self) -> FieldErrors {
        self.state.borrow().errors.clone()
    }

    /// Returns the form-level error, if any.
    pub fn form_error(&self) -> Option<FormError> {
        self.state.borrow().form_error.clone()
    }

    /// Returns whether a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.state.borrow().is_submitting
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> SubmitPhase {
        self.state.borrow().phase
    }

    /// Returns a copy of the whole state for rendering.
    pub fn snapshot(&self) -> FormState {
        self.state.borrow().clone()
    }

    /// Sanitizes, validates, rate-limits and hands the values to the handler.
    ///
    /// Returns [`SubmitReport::Busy`] without side effects when another
    /// submission on this form has not settled yet.
    pub async fn submit(&self) -> SubmitReport {
        let log = self.log();

        let cleaned = {
            let mut state = self.state.borrow_mut();
            if state.is_submitting {
                log.debug(format_args!("submission already in flight, ignoring"));
                return SubmitReport::Busy;
            }
            state.begin();
            sanitize_fields(state.values.clone(), &self.config.sanitize_fields)
        };
        let _settle = SettleOnDrop(&self.state);

        let errors = validate(&self.config.schema, &cleaned);
        if !errors.is_empty() {
            log.info(format_args!(
                "validation failed for: {}",
                errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
            ));
            self.state.borrow_mut().errors = errors;
            return SubmitReport::Invalid;
        }

        let key = &self.config.rate_limit_key;
        let policy = self.config.rate_limit;
        if !self.limiter.check_and_record(key, policy) {
            let retry_after = self.limiter.retry_after(key).unwrap_or(policy.window);
            log.warn(format_args!(
                "rate limit exceeded ({} attempts per {:?})",
                policy.max_attempts, policy.window
            ));
            let mut state = self.state.borrow_mut();
            state.errors.clear();
            state.form_error = Some(FormError::RateLimited { retry_after });
            return SubmitReport::RateLimited;
        }

        {
            let mut state = self.state.borrow_mut();
            state.errors.clear();
            state.phase = SubmitPhase::Submitting;
        }

        let field_count = cleaned.len();
        let outcome = self
            .handler
            .on_submit(Verified::new_unchecked(cleaned))
            .await;

        let mut state = self.state.borrow_mut();
        match outcome {
            Ok(()) => {
                log.info(format_args!("submission accepted ({} fields)", field_count));
                state.errors.clear();
                state.form_error = None;
                SubmitReport::Submitted
            }
            Err(failure) => {
                log.warn(format_args!("submission failed: {}", failure));
                state.form_error = Some(FormError::SubmissionFailed {
                    reason: failure.reason,
                });
                SubmitReport::Failed
            }
        }
    }
}

impl<H> fmt::Debug for SecureForm<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureForm")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Returns the form to idle however `submit` exits, including cancellation.
struct SettleOnDrop<'a>(&'a RefCell<FormState>);

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.try_borrow_mut() {
            state.settle();
        }
    }
}
