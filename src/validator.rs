//! Pure validation of form values against a [`FormSchema`].
//!
//! Every field is checked independently. For each field the first failing
//! rule wins and later rules are not evaluated, so a field carries at most
//! one error. Values for fields the schema does not declare pass through
//! unchecked.

use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{FieldKind, FieldSchema, FormSchema, Rule};
use crate::state::FormValues;

/// Field name to the error currently attached to it.
///
/// A field without an entry is valid.
pub type FieldErrors = BTreeMap<String, FieldError>;

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The field is required but missing or blank.
    Required,
    /// The value is shorter than the declared minimum.
    TooShort {
        /// Minimum length in characters
        min: usize,
    },
    /// The value is longer than the declared maximum.
    TooLong {
        /// Maximum length in characters
        max: usize,
    },
    /// The value does not match the field kind's format.
    InvalidFormat,
    /// The value does not match the declared pattern.
    PatternMismatch {
        /// Message supplied with the pattern
        message: String,
    },
    /// A custom predicate rejected the value.
    Custom {
        /// Message supplied with the predicate
        message: String,
    },
}

impl FieldError {
    /// Returns the message to show next to the offending input.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Required => write!(f, "required"),
            FieldError::TooShort { min } => write!(f, "must be at least {} characters", min),
            FieldError::TooLong { max } => write!(f, "must be at most {} characters", max),
            FieldError::InvalidFormat => write!(f, "invalid format"),
            FieldError::PatternMismatch { message } | FieldError::Custom { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for FieldError {}

/// Validates every declared field of `schema` against `values`.
///
/// Returns an empty map when all fields pass.
///
/// # Examples
///
/// ```
/// use secure_form::{validate, FieldError, FieldSchema, FormSchema, FormValues};
///
/// let schema = FormSchema::builder()
///     .field(FieldSchema::text("name").required().length(1, 100))
///     .field(FieldSchema::email("email").required().max_len(254))
///     .build()
///     .unwrap();
///
/// let mut values = FormValues::new();
/// values.insert("name".to_string(), String::new());
/// values.insert("email".to_string(), "bad".to_string());
///
/// let errors = validate(&schema, &values);
/// assert_eq!(errors.get("name"), Some(&FieldError::Required));
/// assert_eq!(errors.get("email"), Some(&FieldError::InvalidFormat));
/// ```
pub fn validate(schema: &FormSchema, values: &FormValues) -> FieldErrors {
    schema
        .fields()
        .filter_map(|field| {
            validate_field(field, values.get(field.name()).map(String::as_str))
                .map(|error| (field.name().to_string(), error))
        })
        .collect()
}

/// Validates one value against one field's rules.
///
/// A missing value is treated like an empty one. An empty or blank value on
/// an optional field is valid and skips every other rule.
pub fn validate_field(field: &FieldSchema, value: Option<&str>) -> Option<FieldError> {
    let value = value.unwrap_or("");

    if value.trim().is_empty() && !field.is_required() {
        return None;
    }

    field.rules().iter().find_map(|rule| check_rule(rule, value))
}

fn check_rule(rule: &Rule, value: &str) -> Option<FieldError> {
    match rule {
        Rule::Required => value.trim().is_empty().then_some(FieldError::Required),
        Rule::Length { min, max } => {
            let len = value.chars().count();
            match (min, max) {
                (Some(min), _) if len < *min => Some(FieldError::TooShort { min: *min }),
                (_, Some(max)) if len > *max => Some(FieldError::TooLong { max: *max }),
                _ => None,
            }
        }
        Rule::Format(kind) => (!matches_format(*kind, value)).then_some(FieldError::InvalidFormat),
        Rule::Pattern { regex, message } => {
            (!regex.is_match(value)).then(|| FieldError::PatternMismatch {
                message: message.clone(),
            })
        }
        Rule::Custom { check, message } => (!check(value)).then(|| FieldError::Custom {
            message: message.clone(),
        }),
    }
}

fn matches_format(kind: FieldKind, value: &str) -> bool {
    match kind {
        FieldKind::Text => !value.chars().any(is_control_char),
        FieldKind::Freeform => !value
            .chars()
            .any(|c| is_control_char(c) && !matches!(c, '\n' | '\r' | '\t')),
        FieldKind::Email => is_email(value),
        FieldKind::Phone => is_phone(value),
    }
}

/// Checks if a character is a control or non-printable character.
fn is_control_char(c: char) -> bool {
    c.is_control() || c == '\u{007F}'
}

const MAX_EMAIL_LOCAL_LEN: usize = 64;

fn is_email(value: &str) -> bool {
    if value.chars().any(|c| c.is_whitespace() || is_control_char(c)) {
        return false;
    }

    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || local.chars().count() > MAX_EMAIL_LOCAL_LEN {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

fn is_phone(value: &str) -> bool {
    let value = value.trim();
    let body = value.strip_prefix('+').unwrap_or(value);

    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
    {
        return false;
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}
