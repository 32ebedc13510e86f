//! The account profile form.
//!
//! Ties the generic pieces together for the profile screen: the field rules,
//! which fields are sanitized, the shared rate-limit key, the seeded account
//! data, the save handler, and the notification preferences saved alongside.

use std::future::Future;
use std::sync::Arc;

use crate::capability::{Authentication, Notice, Notifier};
use crate::error::{ConfigError, Error};
use crate::form::{FormConfig, SecureForm, SubmitFailure, SubmitHandler};
use crate::rate_limit::RateLimitPolicy;
use crate::sanitizer::sanitize_text;
use crate::schema::{FieldSchema, FormSchema};
use crate::state::FormValues;
use crate::verified::Verified;

/// Rate-limit key shared by every profile form in the process.
pub const PROFILE_RATE_LIMIT_KEY: &str = "profile-update";

/// Profile fields that accept free text and are sanitized before saving.
pub const PROFILE_SANITIZE_FIELDS: [&str; 3] = ["name", "location", "bio"];

/// Maximum length of the display name.
pub const NAME_MAX_LEN: usize = 100;
/// Maximum length of an email address.
pub const EMAIL_MAX_LEN: usize = 254;
/// Maximum length of a phone number as typed.
pub const PHONE_MAX_LEN: usize = 20;
/// Maximum length of the location.
pub const LOCATION_MAX_LEN: usize = 100;
/// Maximum length of the bio.
pub const BIO_MAX_LEN: usize = 500;

/// Builds the profile field rules.
///
/// # Errors
///
/// Only fails if the rules themselves are contradictory.
pub fn profile_schema() -> Result<FormSchema, ConfigError> {
    FormSchema::builder()
        .field(FieldSchema::text("name").required().length(1, NAME_MAX_LEN))
        .field(FieldSchema::email("email").required().max_len(EMAIL_MAX_LEN))
        .field(FieldSchema::phone("phone").max_len(PHONE_MAX_LEN))
        .field(FieldSchema::text("location").max_len(LOCATION_MAX_LEN))
        .field(FieldSchema::freeform("bio").max_len(BIO_MAX_LEN))
        .build()
}

/// Account data the profile screen starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialProfile {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Free-form location
    pub location: String,
    /// Short biography
    pub bio: String,
    /// When the account was created, as displayed
    pub join_date: String,
}

impl InitialProfile {
    /// Returns the editable fields as `(field, value)` pairs.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("location", &self.location),
            ("bio", &self.bio),
        ]
    }
}

impl Default for InitialProfile {
    fn default() -> Self {
        Self {
            name: "Alex Johnson".to_string(),
            email: "alex.johnson@email.com".to_string(),
            phone: "+1 (555) 123-4567".to_string(),
            location: "San Francisco, CA".to_string(),
            bio: "Passionate learner focused on web development and AI. Always eager to \
                  explore new technologies and collaborate with fellow developers."
                .to_string(),
            join_date: "January 2024".to_string(),
        }
    }
}

/// Builds the profile form configuration, seeded from `initial`.
///
/// # Errors
///
/// Returns [`Error::Config`] if the schema or the configuration is inconsistent.
pub fn profile_form_config(initial: &InitialProfile) -> Result<FormConfig, Error> {
    let config = FormConfig::builder(Arc::new(profile_schema()?))
        .rate_limit_key(PROFILE_RATE_LIMIT_KEY)
        .sanitize_fields(PROFILE_SANITIZE_FIELDS)
        .rate_limit(RateLimitPolicy::default())
        .initial_values(initial.fields())
        .build()?;
    Ok(config)
}

/// Submit handler for the profile form.
///
/// Records which fields were saved and confirms the save to the user. The
/// values never appear in logs.
#[derive(Debug, Clone)]
pub struct ProfileSaver<N> {
    notifier: N,
}

impl<N: Notifier> ProfileSaver<N> {
    /// Creates a saver that confirms through `notifier`.
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }
}

impl<N: Notifier> SubmitHandler for ProfileSaver<N> {
    fn on_submit(
        &self,
        values: Verified<FormValues>,
    ) -> impl Future<Output = Result<(), SubmitFailure>> {
        let fields: Vec<&str> = values.field_names().collect();
        tracing::info!(form = PROFILE_RATE_LIMIT_KEY, ?fields, "profile saved");
        self.notifier.notify(Notice::info(
            "Profile Updated",
            "Your profile information has been saved securely.",
        ));
        std::future::ready(Ok(()))
    }
}

/// Returns the name shown in the profile header.
///
/// Uses the name being edited when it is not blank, the initial name
/// otherwise, and sanitizes whichever it picks.
pub fn display_name<H: SubmitHandler>(form: &SecureForm<H>, initial: &InitialProfile) -> String {
    match form.value("name") {
        Some(name) if !name.trim().is_empty() => sanitize_text(&name),
        _ => sanitize_text(&initial.name),
    }
}

/// Notification and privacy preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    /// Course updates and announcements by email
    pub email_notifications: bool,
    /// Real-time browser notifications
    pub push_notifications: bool,
    /// Weekly progress summary
    pub weekly_digest: bool,
    /// Deadline and session reminders
    pub course_reminders: bool,
    /// Profile visible to other users
    pub public_profile: bool,
    /// Completion and achievements shown publicly
    pub show_progress: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: false,
            weekly_digest: true,
            course_reminders: true,
            public_profile: false,
            show_progress: true,
        }
    }
}

impl Preferences {
    /// Saves the preferences and confirms to the user.
    ///
    /// Returns the saved preferences.
    pub fn save(&self, notifier: &impl Notifier) -> Preferences {
        tracing::info!(preferences = ?self, "preferences saved");
        notifier.notify(Notice::info(
            "Preferences Updated",
            "Your notification and privacy preferences have been saved securely.",
        ));
        *self
    }
}

/// Signs the current user out.
pub fn sign_out(auth: &impl Authentication) {
    if auth.is_authenticated() {
        tracing::info!("signing out");
    }
    auth.sign_out();
}
