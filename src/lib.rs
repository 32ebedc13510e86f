//! Secure form handling: declarative validation, input sanitization and
//! client-side rate limiting behind one submit controller.
//!
//! A form is described once by a [`FormSchema`] and a [`FormConfig`]. A
//! [`SecureForm`] then owns the editable values and runs every submission
//! through the same pipeline:
//!
//! - **Sanitize**: configured fields are stripped of markup and script
//!   vectors ([`sanitize_text`])
//! - **Validate**: every declared field is checked against its rules
//!   ([`validate`]), producing one [`FieldError`] per failing field
//! - **Rate limit**: a process-wide [`RateLimiter`] caps attempts per key
//!   within a fixed window
//! - **Submit**: the [`SubmitHandler`] receives [`Verified`] values only
//!
//! # Core Types
//!
//! - [`FormSchema`] / [`FieldSchema`]: field declarations and their rules
//! - [`RateLimiter`]: shared, thread-safe attempt counter with an injectable [`Clock`]
//! - [`SecureForm`]: the controller views render from
//! - [`Verified<T>`]: proof that values were sanitized and validated
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use secure_form::{
//!     FieldSchema, FormConfig, FormSchema, FormValues, RateLimiter, SecureForm,
//!     SubmitFailure, SubmitReport, Verified,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread()
//! #     .build()
//! #     .expect("runtime builds")
//! #     .block_on(async {
//! let schema = FormSchema::builder()
//!     .field(FieldSchema::text("name").required().length(1, 100))
//!     .field(FieldSchema::email("email").required().max_len(254))
//!     .build()
//!     .expect("valid schema");
//!
//! let config = FormConfig::builder(Arc::new(schema))
//!     .rate_limit_key("contact")
//!     .sanitize_fields(["name"])
//!     .build()
//!     .expect("valid config");
//!
//! let limiter = Arc::new(RateLimiter::new());
//! let form = SecureForm::new(config, limiter, |values: Verified<FormValues>| async move {
//!     println!("saving {} fields", values.as_ref().len());
//!     Ok::<(), SubmitFailure>(())
//! });
//!
//! form.update_field("name", "");
//! form.update_field("email", "bad");
//! assert_eq!(form.submit().await, SubmitReport::Invalid);
//! assert_eq!(form.error("email").map(|e| e.message()).as_deref(), Some("invalid format"));
//!
//! form.update_field("name", "Alex");
//! form.update_field("email", "alex@example.com");
//! assert_eq!(form.submit().await, SubmitReport::Submitted);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capability;
mod error;
mod form;
mod logging;
mod profile;
mod rate_limit;
mod sanitizer;
mod schema;
mod state;
mod validator;
mod verified;

#[cfg(test)]
mod test_utils;

pub use capability::{Authentication, Notice, NoticeLevel, Notifier};
pub use error::{ConfigError, ConfigErrorKind, Error};
pub use form::{
    FormConfig, FormConfigBuilder, SecureForm, SubmitFailure, SubmitHandler, SubmitReport,
    DEFAULT_RATE_LIMIT_KEY,
};
pub use logging::FormLog;
pub use profile::{
    display_name, profile_form_config, profile_schema, sign_out, InitialProfile, Preferences,
    ProfileSaver, BIO_MAX_LEN, EMAIL_MAX_LEN, LOCATION_MAX_LEN, NAME_MAX_LEN, PHONE_MAX_LEN,
    PROFILE_RATE_LIMIT_KEY, PROFILE_SANITIZE_FIELDS,
};
pub use rate_limit::{Clock, ManualClock, RateLimitEntry, RateLimitPolicy, RateLimiter, SystemClock};
pub use sanitizer::{sanitize_fields, sanitize_text};
pub use schema::{FieldBuilder, FieldKind, FieldSchema, FormSchema, FormSchemaBuilder, Rule};
pub use state::{FormError, FormState, FormValues, SubmitPhase};
pub use validator::{validate, validate_field, FieldError, FieldErrors};
pub use verified::Verified;
