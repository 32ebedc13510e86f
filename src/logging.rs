use std::fmt;

/// Form-scoped logging interface.
///
/// `FormLog` is obtained from [`SecureForm::log`](crate::SecureForm::log) and
/// is lifetime-bound to the form. Every event carries the form's rate-limit
/// key as the `form` field.
///
/// Callers log field names and outcomes, never raw field values.
#[derive(Debug, Clone, Copy)]
pub struct FormLog<'a> {
    form: &'a str,
}

impl<'a> FormLog<'a> {
    /// Creates a logger for the form identified by `form`.
    pub(crate) fn new(form: &'a str) -> Self {
        Self { form }
    }

    /// Returns the form key stamped on every event.
    pub fn form(&self) -> &str {
        self.form
    }

    /// Logs an info-level message.
    ///
    /// Use with `format_args!` for efficient formatting:
    /// ```no_run
    /// # use secure_form::FormLog;
    /// # fn example(log: FormLog<'_>) {
    /// log.info(format_args!("submission accepted ({} fields)", 5));
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(form = %self.form, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(form = %self.form, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(form = %self.form, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(form = %self.form, "{}", args);
    }
}
