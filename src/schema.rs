//! Declarative field rules for a form.
//!
//! A [`FormSchema`] is built once through [`FormSchema::builder`], checked for
//! contradictory rules at build time, and then shared read-only between any
//! number of forms (usually behind an `Arc`).
//!
//! Each field compiles down to an ordered list of [`Rule`] values. The order is
//! the evaluation precedence used by the validator: required, length, format
//! and pattern, then custom predicates.

use std::fmt;

use regex::Regex;

use crate::error::{ConfigError, ConfigErrorKind};

/// Type classification of a field, selecting its built-in format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text. Control characters are rejected.
    Text,
    /// An email address.
    Email,
    /// A phone number made of digits and common separators.
    Phone,
    /// Multi-line text. Newlines and tabs are allowed.
    Freeform,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Email => write!(f, "email"),
            FieldKind::Phone => write!(f, "phone"),
            FieldKind::Freeform => write!(f, "freeform"),
        }
    }
}

/// A single validation rule with its parameters.
#[derive(Debug, Clone)]
pub enum Rule {
    /// The value must be present and not blank.
    Required,
    /// The value length (in characters) must lie within the bounds.
    Length {
        /// Inclusive lower bound
        min: Option<usize>,
        /// Inclusive upper bound
        max: Option<usize>,
    },
    /// The value must match the built-in format of the kind.
    Format(FieldKind),
    /// The value must match a regular expression.
    Pattern {
        /// Compiled pattern
        regex: Regex,
        /// Message reported on mismatch
        message: String,
    },
    /// The value must satisfy a caller-supplied predicate.
    Custom {
        /// Returns `true` when the value is acceptable
        check: fn(&str) -> bool,
        /// Message reported when `check` returns `false`
        message: String,
    },
}

impl Rule {
    fn precedence(&self) -> u8 {
        match self {
            Rule::Required => 0,
            Rule::Length { .. } => 1,
            Rule::Format(_) | Rule::Pattern { .. } => 2,
            Rule::Custom { .. } => 3,
        }
    }
}

/// The compiled rules for one form field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    name: String,
    kind: FieldKind,
    required: bool,
    rules: Vec<Rule>,
}

impl FieldSchema {
    /// Starts declaring a single-line text field.
    pub fn text(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name, FieldKind::Text)
    }

    /// Starts declaring an email field.
    pub fn email(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name, FieldKind::Email)
    }

    /// Starts declaring a phone field.
    pub fn phone(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name, FieldKind::Phone)
    }

    /// Starts declaring a multi-line text field.
    pub fn freeform(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name, FieldKind::Freeform)
    }

    /// Declares a field that carries no rules at all.
    ///
    /// Use this for values that must be known to the schema (for instance so
    /// they can be sanitized) but are never validated.
    pub fn unconstrained(name: impl Into<String>) -> FieldBuilder {
        let mut builder = FieldBuilder::new(name, FieldKind::Freeform);
        builder.format = false;
        builder
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether the field must be filled in.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Builder for a [`FieldSchema`]. Obtained from the `FieldSchema` constructors.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    kind: FieldKind,
    required: bool,
    format: bool,
    min: Option<usize>,
    max: Option<usize>,
    pattern: Option<(String, String)>,
    custom: Vec<(fn(&str) -> bool, String)>,
}

impl FieldBuilder {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            format: true,
            min: None,
            max: None,
            pattern: None,
            custom: Vec::new(),
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the inclusive minimum length in characters.
    pub fn min_len(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the inclusive maximum length in characters.
    pub fn max_len(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets both length bounds.
    pub fn length(self, min: usize, max: usize) -> Self {
        self.min_len(min).max_len(max)
    }

    /// Requires the value to match `pattern`. The pattern is compiled when the
    /// schema is built.
    pub fn pattern(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.pattern = Some((pattern.into(), message.into()));
        self
    }

    /// Adds a custom predicate, evaluated after every other rule.
    pub fn custom(mut self, check: fn(&str) -> bool, message: impl Into<String>) -> Self {
        self.custom.push((check, message.into()));
        self
    }

    fn build(self) -> Result<FieldSchema, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::new(
                ConfigErrorKind::EmptyFieldName,
                "field names must not be empty",
            ));
        }

        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ConfigError::new(
                    ConfigErrorKind::InvalidLengthBounds {
                        field: self.name.clone(),
                    },
                    format!("min length {} exceeds max length {}", min, max),
                ));
            }
        }

        if self.required && self.max == Some(0) {
            return Err(ConfigError::new(
                ConfigErrorKind::InvalidLengthBounds {
                    field: self.name.clone(),
                },
                "a required field cannot have a max length of 0",
            ));
        }

        let mut rules = Vec::new();
        if self.required {
            rules.push(Rule::Required);
        }
        if self.min.is_some() || self.max.is_some() {
            rules.push(Rule::Length {
                min: self.min,
                max: self.max,
            });
        }
        if self.format {
            rules.push(Rule::Format(self.kind));
        }
        if let Some((pattern, message)) = self.pattern {
            let regex = Regex::new(&pattern).map_err(|e| {
                ConfigError::new(
                    ConfigErrorKind::InvalidPattern {
                        field: self.name.clone(),
                    },
                    e.to_string(),
                )
            })?;
            rules.push(Rule::Pattern { regex, message });
        }
        for (check, message) in self.custom {
            rules.push(Rule::Custom { check, message });
        }

        // Stable, so custom predicates keep their declaration order
        rules.sort_by_key(Rule::precedence);

        Ok(FieldSchema {
            name: self.name,
            kind: self.kind,
            required: self.required,
            rules,
        })
    }
}

/// An immutable set of field rules keyed by field name.
///
/// # Examples
///
/// ```
/// use secure_form::{FieldSchema, FormSchema};
///
/// let schema = FormSchema::builder()
///     .field(FieldSchema::text("name").required().length(1, 100))
///     .field(FieldSchema::email("email").required().max_len(254))
///     .build()
///     .expect("schema is consistent");
///
/// assert!(schema.field("name").is_some());
/// assert!(schema.field("nickname").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<FieldSchema>,
}

impl FormSchema {
    /// Starts building a schema.
    pub fn builder() -> FormSchemaBuilder {
        FormSchemaBuilder { fields: Vec::new() }
    }

    /// Looks up the rules for a field.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns whether the schema declares `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Iterates over the fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter()
    }
}

/// Builder for a [`FormSchema`].
#[derive(Debug, Clone)]
pub struct FormSchemaBuilder {
    fields: Vec<FieldBuilder>,
}

impl FormSchemaBuilder {
    /// Adds a field declaration.
    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Compiles every declaration into a [`FormSchema`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a field name is empty or repeated, when
    /// length bounds contradict each other, or when a pattern does not compile.
    pub fn build(self) -> Result<FormSchema, ConfigError> {
        let mut fields: Vec<FieldSchema> = Vec::with_capacity(self.fields.len());

        for builder in self.fields {
            let field = builder.build()?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(ConfigError::new(
                    ConfigErrorKind::DuplicateField {
                        field: field.name.clone(),
                    },
                    "field names must be unique within a schema",
                ));
            }
            fields.push(field);
        }

        Ok(FormSchema { fields })
    }
}
