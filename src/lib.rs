//! Form Logic
//!
//! Conditional visibility, requiredness, and validation for schema-driven forms.
//!
//! Given a form schema (field definitions plus conditional rules) and the
//! current values, this library decides per field whether it is shown, whether
//! it is currently required, and whether its value is valid.
//!
//! # Example
//!
//! ```
//! use form_logic::{load_schema_str, validate_form, EvalOptions, FormData};
//! use serde_json::json;
//!
//! let schema = load_schema_str(r#"{
//!     "type": "object",
//!     "properties": {
//!         "status": { "type": "string", "x-label": "Status" },
//!         "employer": { "type": "string", "x-label": "Employer" },
//!         "reason": { "type": "string", "x-label": "Reason" }
//!     },
//!     "if": { "properties": { "status": { "const": "employed" } } },
//!     "then": { "required": ["employer"] },
//!     "else": { "required": ["reason"] }
//! }"#).unwrap();
//!
//! let mut data = FormData::new();
//! data.insert("status".into(), json!("employed"));
//!
//! let result = validate_form(&schema, &data, &EvalOptions::new()).unwrap();
//!
//! // The employer branch is active, so only "employer" is missing
//! assert!(!result.is_valid);
//! assert_eq!(result.errors["employer"], ["Employer is required"]);
//! assert!(!result.errors.contains_key("reason"));
//! ```
//!
//! # Conditional Rules
//!
//! | Declared on field | Hidden when | Required when |
//! |-------------------|-------------|---------------|
//! | `isRequired` / top-level `required` | never | always |
//! | `x-required_if` (`eq`) | dependency blank or not equal | dependency equal |
//! | `if`/`then`/`else` membership | condition blank, or field not in selected branch | key in selected branch's `required` |
//! | (none) | never | never |
//!
//! A field declaring `x-required_if` is never governed by the schema branch.
//!
//! # Validation Rules
//!
//! An empty required value reports only "is required". An empty optional
//! value is always valid. Otherwise `minLength`, `pattern`, and the `minAge`
//! check of date sources all run and their messages accumulate.

mod error;
mod format;
mod linter;
mod loader;
mod resolver;
mod store;
mod types;
mod validator;

pub use error::{EvalError, LoadError, ValidateError};
pub use format::is_valid_url;
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    is_url, load_data, load_json, load_schema, load_schema_auto, load_schema_str, parse_data,
    parse_schema,
};
pub use resolver::{is_required, should_show};
pub use store::FormState;
pub use types::{
    is_blank, is_falsy, json_type_name, values_equal, Branch, BranchProbe, BranchSide, Branching,
    ConstMatch, Control, ErrorMessages, EvalOptions, FieldDefinition, FieldProperties,
    FieldSource, FieldType, FormData, FormErrors, FormSchema, Operator, RequiredIfCondition,
    SelectOption, SourceData, SourceKind, SourceSettings,
};
pub use validator::{
    evaluate_form, validate_all, validate_field, validate_form, FieldState, FormReport,
    FormValidation,
};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;
