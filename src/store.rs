//! Mutable form state: current values, touched fields, and stored errors.
//!
//! The resolvers and validator never see this store directly. They are
//! handed a [`FormState::snapshot`] so a dependency lookup can never observe
//! a half-applied update.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::error::EvalError;
use crate::resolver::should_show;
use crate::types::{EvalOptions, FieldDefinition, FormData, FormErrors, FormSchema};
use crate::validator::{validate_form, FormValidation};

/// State container owned by the UI layer.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    data: FormData,
    errors: FormErrors,
    touched: BTreeSet<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing values.
    pub fn with_data(data: FormData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn is_touched(&self, key: &str) -> bool {
        self.touched.contains(key)
    }

    /// Copy of the current values for handing to the resolvers.
    pub fn snapshot(&self) -> FormData {
        self.data.clone()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn touch(&mut self, key: impl Into<String>) {
        self.touched.insert(key.into());
    }

    /// Store errors for a field. An empty list clears the field's entry.
    pub fn set_errors(&mut self, key: impl Into<String>, errors: Vec<String>) {
        let key = key.into();
        if errors.is_empty() {
            self.errors.remove(&key);
        } else {
            self.errors.insert(key, errors);
        }
    }

    pub fn clear_errors(&mut self, key: &str) {
        self.errors.remove(key);
    }

    pub fn clear_all_errors(&mut self) {
        self.errors.clear();
    }

    /// Blank out every field whose source depends on `parent_key`.
    ///
    /// Dependents get an empty string value, lose their touched flag, and
    /// have their errors cleared.
    pub fn reset_dependent_fields(&mut self, parent_key: &str, fields: &[FieldDefinition]) {
        for field in fields {
            let depends = field
                .props
                .source
                .as_ref()
                .and_then(|s| s.depends_on())
                .is_some_and(|parent| parent == parent_key);
            if !depends {
                continue;
            }
            debug!(field = %field.key, parent = parent_key, "resetting dependent field");
            self.data
                .insert(field.key.clone(), Value::String(String::new()));
            self.touched.remove(&field.key);
            self.errors.remove(&field.key);
        }
    }

    /// Touch every field the predicate reports as shown.
    pub fn touch_all<F>(&mut self, fields: &[FieldDefinition], mut should_show: F)
    where
        F: FnMut(&FieldDefinition) -> bool,
    {
        for field in fields {
            if should_show(field) {
                self.touched.insert(field.key.clone());
            }
        }
    }

    /// Errors are displayed once a field is touched, or for every field on submit.
    pub fn should_show_errors(&self, key: &str, submitting: bool) -> bool {
        submitting || self.touched.contains(key)
    }

    /// Drop all values, touched flags, and errors.
    pub fn reset(&mut self) {
        self.data.clear();
        self.errors.clear();
        self.touched.clear();
    }

    /// Touch every visible field, validate a snapshot, and store the result.
    ///
    /// # Errors
    ///
    /// Returns `EvalError` if the schema is malformed for the current data.
    /// Stored errors are left unchanged in that case.
    pub fn submit(
        &mut self,
        schema: &FormSchema,
        options: &EvalOptions,
    ) -> Result<FormValidation, EvalError> {
        let snapshot = self.snapshot();
        let fields = schema.fields();

        let mut visible = Vec::new();
        for field in &fields {
            if should_show(field, schema, &snapshot, options)? {
                visible.push(field.key.clone());
            }
        }
        let validation = validate_form(schema, &snapshot, options)?;

        self.touched.extend(visible);
        self.errors = validation.errors.clone();
        Ok(validation)
    }
}
