//! Declarative form validation
//!
//! A `ValidationSchema` lists fields in display order, each with an optional
//! required rule and a sequence of format rules. Validation is pure: the same
//! values always produce the same result.
//!
//! Per field, the required rule runs first and an empty value stops there.
//! Format rules then run in declaration order and the first failure is the
//! field's message. Cross-field rules report on the field that declares them.
//!
//! # Example
//!
//! ```
//! use app_core::validation::{FieldValues, ValidationSchema};
//!
//! let schema = ValidationSchema::new()
//!     .field("password", |f| f.required("Password is required"))
//!     .field("confirm_password", |f| {
//!         f.required("Please confirm your password")
//!             .matches("password", "Passwords don't match")
//!     });
//!
//! let mut values = FieldValues::new();
//! values.insert("password".into(), "supersecret".into());
//! values.insert("confirm_password".into(), "supersecreT".into());
//!
//! let errors = schema.validate(&values).into_result().unwrap_err();
//! assert_eq!(errors.get("confirm_password").map(String::as_str), Some("Passwords don't match"));
//! assert!(!errors.contains_key("password"));
//! ```

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Raw field values keyed by field name
pub type FieldValues = BTreeMap<String, String>;

/// First failing message per invalid field
pub type FieldErrors = BTreeMap<String, String>;

/// A format rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// At least `min` characters (grapheme clusters)
    MinLength {
        /// Minimum length
        min: usize,
        /// Message on failure
        message: String,
    },
    /// Exactly `len` characters (grapheme clusters)
    ExactLength {
        /// Required length
        len: usize,
        /// Message on failure
        message: String,
    },
    /// Looks like an email address
    Email {
        /// Message on failure
        message: String,
    },
    /// ASCII digits only
    Digits {
        /// Message on failure
        message: String,
    },
    /// Equal to the value of another field
    Matches {
        /// Field compared against
        other: String,
        /// Message on failure
        message: String,
    },
}

impl Rule {
    fn check(&self, value: &str, values: &FieldValues) -> Result<(), &str> {
        let ok = match self {
            Rule::MinLength { min, .. } => value.graphemes(true).count() >= *min,
            Rule::ExactLength { len, .. } => value.graphemes(true).count() == *len,
            Rule::Email { .. } => is_email(value),
            Rule::Digits { .. } => value.chars().all(|c| c.is_ascii_digit()),
            Rule::Matches { other, .. } => {
                value == values.get(other).map(String::as_str).unwrap_or_default()
            }
        };

        if ok {
            Ok(())
        } else {
            Err(self.message())
        }
    }

    /// Message reported when the rule fails
    pub fn message(&self) -> &str {
        match self {
            Rule::MinLength { message, .. }
            | Rule::ExactLength { message, .. }
            | Rule::Email { message }
            | Rule::Digits { message }
            | Rule::Matches { message, .. } => message,
        }
    }
}

fn is_email(value: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9_'+-]+(?:\.[A-Za-z0-9_'+-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
        )
        .unwrap()
    });
    re.is_match(value)
}

/// Rules for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    required: Option<String>,
    rules: Vec<Rule>,
}

impl FieldSpec {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: None, rules: Vec::new() }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field must be filled in
    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }

    /// Reject empty (or whitespace-only) values
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    /// Require at least `min` characters
    pub fn min_length(mut self, min: usize, message: impl Into<String>) -> Self {
        self.rules.push(Rule::MinLength { min, message: message.into() });
        self
    }

    /// Require exactly `len` characters
    pub fn exact_length(mut self, len: usize, message: impl Into<String>) -> Self {
        self.rules.push(Rule::ExactLength { len, message: message.into() });
        self
    }

    /// Require an email address
    pub fn email(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Email { message: message.into() });
        self
    }

    /// Require ASCII digits only
    pub fn digits(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Digits { message: message.into() });
        self
    }

    /// Require the same value as `other`
    pub fn matches(mut self, other: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Matches { other: other.into(), message: message.into() });
        self
    }

    /// Format rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn check<'a>(&'a self, values: &FieldValues) -> Option<&'a str> {
        let value = values.get(&self.name).map(String::as_str).unwrap_or_default();

        if value.trim().is_empty() {
            // Optional and empty: nothing else to check
            return self.required.as_deref();
        }

        self.rules.iter().find_map(|rule| rule.check(value, values).err())
    }
}

/// Values that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    values: FieldValues,
}

impl ValidatedFields {
    /// Value of a declared field (empty for an optional field left blank)
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Owned value of a declared field
    pub fn take(&self, name: &str) -> String {
        self.get(name).to_string()
    }
}

/// Outcome of validating a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Every field passed
    Valid(ValidatedFields),
    /// Field-keyed messages; fields not listed are valid
    Invalid(FieldErrors),
}

impl ValidationResult {
    /// Whether every field passed
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    /// Convert into a `Result`
    pub fn into_result(self) -> Result<ValidatedFields, FieldErrors> {
        match self {
            ValidationResult::Valid(fields) => Ok(fields),
            ValidationResult::Invalid(errors) => Err(errors),
        }
    }
}

/// Ordered set of field rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSchema {
    fields: Vec<FieldSpec>,
}

impl ValidationSchema {
    /// Create a schema with no fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field
    ///
    /// Declaring the same name twice replaces the earlier declaration.
    pub fn field(mut self, name: &str, build: impl FnOnce(FieldSpec) -> FieldSpec) -> Self {
        let spec = build(FieldSpec::new(name));
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Declared field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Declared fields in order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Whether `name` is declared
    pub fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Validate raw values
    ///
    /// Missing fields count as empty; undeclared keys are ignored.
    pub fn validate(&self, values: &FieldValues) -> ValidationResult {
        let errors: FieldErrors = self
            .fields
            .iter()
            .filter_map(|spec| {
                spec.check(values)
                    .map(|message| (spec.name.clone(), message.to_string()))
            })
            .collect();

        if !errors.is_empty() {
            return ValidationResult::Invalid(errors);
        }

        let values = self
            .fields
            .iter()
            .map(|spec| {
                let value = values.get(&spec.name).cloned().unwrap_or_default();
                (spec.name.clone(), value)
            })
            .collect();

        ValidationResult::Valid(ValidatedFields { values })
    }
}
