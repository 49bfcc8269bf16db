//! Field and form validation.

use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::EvalError;
use crate::resolver::{is_required, should_show};
use crate::types::{
    is_falsy, EvalOptions, FieldDefinition, FormData, FormErrors, FormSchema, SourceKind,
};

/// Outcome of validating every visible field of a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidation {
    pub is_valid: bool,
    pub errors: FormErrors,
}

impl FormValidation {
    fn from_errors(errors: FormErrors) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Resolved state of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    pub key: String,
    pub label: String,
    pub visible: bool,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Per-field states in display order plus the form-level verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormReport {
    pub fields: Vec<FieldState>,
    #[serde(flatten)]
    pub validation: FormValidation,
}

/// Validate a single value against a field's constraints.
///
/// An empty required value yields only the "is required" message. An empty
/// optional value is always valid. Otherwise length, pattern, and age checks
/// all run and their messages accumulate.
///
/// # Errors
///
/// Returns `EvalError::InvalidPattern` if the field's pattern does not compile,
/// or `EvalError::InvalidDate` if a date field with a minimum age holds a value
/// that is not a date.
pub fn validate_field(
    field: &FieldDefinition,
    value: Option<&Value>,
    is_required: bool,
    options: &EvalOptions,
) -> Result<Vec<String>, EvalError> {
    let label = field.label();

    if is_falsy(value) {
        return Ok(if is_required {
            vec![format!("{} is required", label)]
        } else {
            Vec::new()
        });
    }

    let mut errors = Vec::new();
    let text = value.and_then(Value::as_str);

    if let (Some(min_length), Some(text)) = (field.props.min_length, text) {
        if min_length > 0 && text.chars().count() < min_length {
            errors.push(format!(
                "{} must be at least {} characters",
                label, min_length
            ));
        }
    }

    if let (Some(pattern), Some(text)) = (&field.props.pattern, text) {
        let re = Regex::new(pattern).map_err(|source| EvalError::InvalidPattern {
            field: field.key.clone(),
            pattern: pattern.clone(),
            source,
        })?;
        if !re.is_match(text) {
            let message = field
                .props
                .error_message
                .as_ref()
                .and_then(|m| m.pattern.clone())
                .unwrap_or_else(|| format!("{} format is invalid", label));
            errors.push(message);
        }
    }

    if let (Some(source), Some(value)) = (&field.props.source, value) {
        match source.min_age() {
            Some(min_age) if source.kind == SourceKind::Date && min_age > 0 => {
                let birth = parse_date(field, value)?;
                if age_on(birth, options.today) < i64::from(min_age) {
                    errors.push(format!("You must be at least {} years old", min_age));
                }
            }
            _ => {}
        }
    }

    Ok(errors)
}

/// Validate every visible field and collect the errors.
///
/// Hidden fields are skipped entirely: they are neither asked for
/// requiredness nor validated, so stale values never surface as errors.
///
/// # Errors
///
/// Propagates the first `EvalError` raised by a predicate or a field check.
pub fn validate_all<S, R>(
    fields: &[FieldDefinition],
    data: &FormData,
    mut should_show: S,
    mut is_required: R,
    options: &EvalOptions,
) -> Result<FormValidation, EvalError>
where
    S: FnMut(&FieldDefinition) -> Result<bool, EvalError>,
    R: FnMut(&FieldDefinition) -> Result<bool, EvalError>,
{
    let mut errors = FormErrors::new();

    for field in fields {
        if !should_show(field)? {
            continue;
        }
        let required = is_required(field)?;
        let field_errors = validate_field(field, data.get(&field.key), required, options)?;
        if !field_errors.is_empty() {
            errors.insert(field.key.clone(), field_errors);
        }
    }

    debug!(invalid_fields = errors.len(), "validated form");
    Ok(FormValidation::from_errors(errors))
}

/// Validate a data snapshot against a schema using the conditional resolvers.
///
/// # Errors
///
/// Returns `EvalError` if the schema is malformed for the given data.
pub fn validate_form(
    schema: &FormSchema,
    data: &FormData,
    options: &EvalOptions,
) -> Result<FormValidation, EvalError> {
    validate_all(
        &schema.fields(),
        data,
        |field| should_show(field, schema, data, options),
        |field| is_required(field, schema, data, options),
        options,
    )
}

/// Resolve visibility, requiredness, and errors for every field.
///
/// Hidden fields are reported as not required and without errors.
///
/// # Errors
///
/// Returns `EvalError` if the schema is malformed for the given data.
pub fn evaluate_form(
    schema: &FormSchema,
    data: &FormData,
    options: &EvalOptions,
) -> Result<FormReport, EvalError> {
    let mut states = Vec::new();
    let mut errors = FormErrors::new();

    for field in schema.fields() {
        let visible = should_show(&field, schema, data, options)?;
        let (required, field_errors) = if visible {
            let required = is_required(&field, schema, data, options)?;
            let field_errors = validate_field(&field, data.get(&field.key), required, options)?;
            (required, field_errors)
        } else {
            (false, Vec::new())
        };

        if !field_errors.is_empty() {
            errors.insert(field.key.clone(), field_errors.clone());
        }
        states.push(FieldState {
            label: field.label().to_string(),
            key: field.key,
            visible,
            required,
            errors: field_errors,
        });
    }

    Ok(FormReport {
        fields: states,
        validation: FormValidation::from_errors(errors),
    })
}

/// Parse a `YYYY-MM-DD` date or the date part of an RFC 3339 timestamp.
fn parse_date(field: &FieldDefinition, value: &Value) -> Result<NaiveDate, EvalError> {
    let invalid = || EvalError::InvalidDate {
        field: field.key.clone(),
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    };

    let text = value.as_str().ok_or_else(invalid)?.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
        .map_err(|_| invalid())
}

/// Whole years between `birth` and `today`.
fn age_on(birth: NaiveDate, today: NaiveDate) -> i64 {
    let mut age = i64::from(today.year() - birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
