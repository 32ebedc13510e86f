use crate::state::FormValues;

/// Form data that has been sanitized and validated by a [`SecureForm`](crate::SecureForm).
///
/// A submit handler receives `Verified<FormValues>` rather than a bare map,
/// which proves at the type level that the values went through the form's
/// sanitize and validate steps.
///
/// # Construction Invariants
///
/// External code cannot construct a `Verified<T>`. There is no public
/// constructor and no `From<T>` implementation; only the form's submit path
/// wraps values, after sanitization and validation both succeeded.
///
/// ```compile_fail
/// use secure_form::{FormValues, Verified};
///
/// // This will not compile - no public constructor:
/// let verified = Verified::new(FormValues::new());
/// ```
///
/// # Access
///
/// - [`AsRef::as_ref`]: borrow the values
/// - [`into_inner`](Self::into_inner): consume and take the values
/// - [`get`](Verified::get): read one cleaned field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value that the caller has already sanitized and validated.
    ///
    /// This is `pub(crate)` so only the form's submit path can create one.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl Verified<FormValues> {
    /// Returns the cleaned value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.inner.get(field).map(String::as_str)
    }

    /// Iterates over the field names present in the data.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
