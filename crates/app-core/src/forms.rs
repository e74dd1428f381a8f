//! Form field model
//!
//! A `Form` holds the raw text of each field its schema declares. Fields are
//! edited on every keystroke, cleared after a successful submission, and
//! marked validated once they pass a validation run.

use thiserror::Error;

use crate::validation::{FieldErrors, FieldValues, ValidationSchema};

/// Form errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The field is not declared by the form's schema
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// One input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Field name
    pub name: String,
    /// Text as typed
    pub raw_value: String,
    /// Whether the current value passed the last validation run
    pub validated: bool,
}

impl FormField {
    fn empty(name: &str) -> Self {
        Self { name: name.to_string(), raw_value: String::new(), validated: false }
    }
}

/// Fields of one form, in schema order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    fields: Vec<FormField>,
}

impl Form {
    /// Empty form with one field per declared schema field
    pub fn for_schema(schema: &ValidationSchema) -> Self {
        Self { fields: schema.field_names().map(FormField::empty).collect() }
    }

    /// Replace a field's text
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;

        field.raw_value = value.into();
        field.validated = false;
        Ok(())
    }

    /// A field's text
    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.raw_value.as_str())
    }

    /// A field
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All fields
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Snapshot of every field's text for validation
    pub fn values(&self) -> FieldValues {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.raw_value.clone()))
            .collect()
    }

    /// Whether every field is empty
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.raw_value.is_empty())
    }

    /// Record a validation run: fields without an error are validated
    pub fn mark_validated(&mut self, errors: &FieldErrors) {
        for field in &mut self.fields {
            field.validated = !errors.contains_key(&field.name);
        }
    }

    /// Reset every field to empty
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.raw_value.clear();
            field.validated = false;
        }
    }
}
