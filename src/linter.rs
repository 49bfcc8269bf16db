//! Schema linting - static analysis of form schema files.
//!
//! Validates schema files for:
//! - JSON syntax errors
//! - Documents that don't have the form schema shape
//! - Patterns that aren't valid regular expressions
//! - Conditions and branches that name unknown fields
//! - Conditional declarations the resolvers will not fully evaluate

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::loader::{load_json, parse_schema};
use crate::types::{FormSchema, Operator};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/zip/pattern")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings count as failures.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result, Severity::Error);
        total_warnings += count(&file_result, Severity::Warning);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

fn count(result: &FileResult, severity: Severity) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diags = Diagnostics {
        file,
        items: Vec::new(),
    };

    match load_json(file) {
        Ok(document) => lint_document(document, &mut diags),
        Err(e) => diags.error("E001", "/", format!("syntax error: {}", e)),
    }

    let items = diags.items;
    let status = if items.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if items.iter().any(|d| d.severity == Severity::Warning) {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics: items,
    }
}

struct Diagnostics<'a> {
    file: &'a Path,
    items: Vec<Diagnostic>,
}

impl Diagnostics<'_> {
    fn push(&mut self, severity: Severity, code: &str, path: &str, message: String) {
        self.items.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path: path.to_string(),
            message,
        });
    }

    fn error(&mut self, code: &str, path: &str, message: String) {
        self.push(Severity::Error, code, path, message);
    }

    fn warning(&mut self, code: &str, path: &str, message: String) {
        self.push(Severity::Warning, code, path, message);
    }
}

fn lint_document(document: Value, diags: &mut Diagnostics<'_>) {
    if !check_shape(&document, diags) {
        return;
    }
    let schema = match parse_schema(document) {
        Ok(schema) => schema,
        Err(e) => {
            diags.error("E002", "/", e.to_string());
            return;
        }
    };

    check_fields(&schema, diags);
    check_branching(&schema, diags);
}

/// Structural check against the form schema shape. Returns false on mismatch.
fn check_shape(document: &Value, diags: &mut Diagnostics<'_>) -> bool {
    let Some(validator) = shape_validator() else {
        return true;
    };

    let before = diags.items.len();
    for e in validator.iter_errors(document) {
        let path = e.instance_path.to_string();
        let path = if path.is_empty() { "/".to_string() } else { path };
        diags.error("E002", &path, format!("not a form schema: {}", e));
    }
    diags.items.len() == before
}

fn shape_validator() -> Option<jsonschema::Validator> {
    match jsonschema::validator_for(&form_schema_shape()) {
        Ok(validator) => Some(validator),
        Err(e) => {
            warn!(error = %e, "form schema shape failed to compile, skipping shape check");
            None
        }
    }
}

/// JSON Schema describing the documents [`FormSchema`] accepts.
fn form_schema_shape() -> Value {
    let keys = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "required": ["properties"],
        "properties": {
            "type": { "const": "object" },
            "required": keys,
            "properties": {
                "type": "object",
                "additionalProperties": { "$ref": "#/$defs/field" }
            },
            "if": {
                "type": "object",
                "required": ["properties"],
                "properties": {
                    "required": keys,
                    "properties": {
                        "type": "object",
                        "additionalProperties": { "type": "object" }
                    }
                }
            },
            "then": { "$ref": "#/$defs/branch" },
            "else": { "$ref": "#/$defs/branch" }
        },
        "$defs": {
            "field": {
                "type": "object",
                "required": ["type"],
                "properties": {
                    "type": { "enum": ["string", "number", "boolean"] },
                    "x-label": { "type": "string" },
                    "x-description": { "type": "string" },
                    "x-order": { "type": "integer" },
                    "x-source": {
                        "type": "object",
                        "required": ["type"],
                        "properties": {
                            "type": { "enum": ["text", "tel", "number", "date", "file", "array"] },
                            "data": { "type": ["object", "array"] }
                        }
                    },
                    "x-required_if": {
                        "type": "object",
                        "required": ["field", "value", "operator"],
                        "properties": {
                            "field": { "type": "string" },
                            "operator": { "enum": ["eq", "ne", "gt", "lt", "gte", "lte"] }
                        }
                    },
                    "minLength": { "type": "integer", "minimum": 0 },
                    "pattern": { "type": "string" },
                    "format": { "type": "string" },
                    "enum": keys,
                    "errorMessage": {
                        "type": "object",
                        "properties": { "pattern": { "type": "string" } }
                    }
                }
            },
            "branch": {
                "type": "object",
                "properties": {
                    "required": keys,
                    "properties": { "type": "object" }
                }
            }
        }
    })
}

fn check_fields(schema: &FormSchema, diags: &mut Diagnostics<'_>) {
    for (i, key) in schema.required.iter().enumerate() {
        if !schema.properties.contains_key(key) {
            diags.warning(
                "W004",
                &format!("/required/{}", i),
                format!("required field \"{}\" is not declared", key),
            );
        }
    }

    for (key, props) in &schema.properties {
        let field_path = format!("/properties/{}", key);

        if let Some(pattern) = &props.pattern {
            if let Err(e) = Regex::new(pattern) {
                diags.error(
                    "E003",
                    &format!("{}/pattern", field_path),
                    format!("invalid pattern: {}", e),
                );
            }
        }

        if let Some(condition) = &props.required_if {
            let path = format!("{}/x-required_if", field_path);
            if !schema.properties.contains_key(&condition.field) {
                diags.error(
                    "E004",
                    &format!("{}/field", path),
                    format!("condition field \"{}\" is not declared", condition.field),
                );
            }
            if condition.operator != Operator::Eq {
                diags.warning(
                    "W001",
                    &format!("{}/operator", path),
                    format!(
                        "operator \"{}\" is not evaluated, only \"eq\" hides and requires",
                        condition.operator
                    ),
                );
            }
        }

        if let Some(parent) = props.source.as_ref().and_then(|s| s.depends_on()) {
            if !schema.properties.contains_key(parent) {
                diags.warning(
                    "W005",
                    &format!("{}/x-source/data/dependsOn", field_path),
                    format!("dependsOn names undeclared field \"{}\"", parent),
                );
            }
        }
    }
}

fn check_branching(schema: &FormSchema, diags: &mut Diagnostics<'_>) {
    let Some(probe) = &schema.condition else {
        return;
    };
    let Some(branching) = schema.branching() else {
        diags.warning(
            "W003",
            "/if",
            "\"if\" needs both \"then\" and \"else\" to take effect".to_string(),
        );
        return;
    };

    for (i, key) in probe.properties.keys().enumerate() {
        let path = format!("/if/properties/{}", key);
        if i > 0 {
            diags.warning(
                "W002",
                &path,
                format!(
                    "only the first condition field is evaluated, \"{}\" is ignored",
                    key
                ),
            );
        } else if !schema.properties.contains_key(key) {
            diags.warning(
                "W004",
                &path,
                format!("condition field \"{}\" is not declared", key),
            );
        }
    }

    for (name, branch) in [
        ("then", branching.then_branch),
        ("else", branching.else_branch),
    ] {
        let keys = branch
            .required
            .iter()
            .enumerate()
            .map(|(i, k)| (format!("/{}/required/{}", name, i), k))
            .chain(
                branch
                    .properties
                    .keys()
                    .map(|k| (format!("/{}/properties/{}", name, k), k)),
            );

        for (path, key) in keys {
            match schema.properties.get(key) {
                None => diags.warning(
                    "W004",
                    &path,
                    format!("branch names undeclared field \"{}\"", key),
                ),
                Some(props) if props.required_if.is_some() => diags.warning(
                    "W006",
                    &path,
                    format!(
                        "\"{}\" declares x-required_if, so this branch is ignored for it",
                        key
                    ),
                ),
                Some(_) => {}
            }
        }
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
