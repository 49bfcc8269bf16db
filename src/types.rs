//! Core types for form schemas and conditional evaluation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current values of a form, keyed by field key.
pub type FormData = Map<String, Value>;

/// Violation messages per field. A missing key means the field has no errors.
pub type FormErrors = BTreeMap<String, Vec<String>>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Absent, `null`, or the empty string.
///
/// This is the emptiness rule the resolvers use for dependency lookups.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Blank, `false`, or numeric zero.
///
/// This is the emptiness rule the validation engine uses, so an unchecked
/// checkbox or a `0` counts as "no value" for a required field.
pub fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        other => is_blank(other),
    }
}

/// Strict-typed equality, with numbers compared by magnitude (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Primitive type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

/// Kind of input a field is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Tel,
    Number,
    Date,
    File,
    Array,
}

/// A selectable option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

/// Kind-specific settings of an input source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
    /// Key of the field whose value scopes this field's options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    /// Options grouped by the value of the `depends_on` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<IndexMap<String, Vec<SelectOption>>>,
}

/// Data attached to a source: either a flat option list or settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceData {
    Options(Vec<SelectOption>),
    Settings(SourceSettings),
}

/// Tagged descriptor of a field's input kind (`x-source`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SourceData>,
}

impl FieldSource {
    fn settings(&self) -> Option<&SourceSettings> {
        match &self.data {
            Some(SourceData::Settings(settings)) => Some(settings),
            _ => None,
        }
    }

    /// Minimum age declared for a date source.
    pub fn min_age(&self) -> Option<u32> {
        self.settings().and_then(|s| s.min_age)
    }

    /// Key of the parent field this source depends on.
    pub fn depends_on(&self) -> Option<&str> {
        self.settings().and_then(|s| s.depends_on.as_deref())
    }
}

/// Comparison operator of a [`RequiredIfCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ties a field's visibility and requiredness to another field (`x-required_if`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredIfCondition {
    /// Key of the field whose value is inspected.
    pub field: String,
    pub value: Value,
    pub operator: Operator,
}

/// Custom violation messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// A field as declared under `properties` in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProperties {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(rename = "x-label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "x-description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "x-order", default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(rename = "x-source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FieldSource>,
    #[serde(rename = "x-required_if", default, skip_serializing_if = "Option::is_none")]
    pub required_if: Option<RequiredIfCondition>,
    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Allowed values. Carried for renderers; not enforced by validation.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(rename = "errorMessage", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<ErrorMessages>,
}

impl FieldProperties {
    /// A bare field of the given type.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            label: None,
            description: None,
            order: None,
            source: None,
            required_if: None,
            min_length: None,
            pattern: None,
            format: None,
            enum_values: None,
            error_message: None,
        }
    }
}

/// One form field: its key, unconditional requiredness, and declared properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    #[serde(rename = "isRequired", default)]
    pub is_required: bool,
    #[serde(flatten)]
    pub props: FieldProperties,
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>, props: FieldProperties) -> Self {
        Self {
            key: key.into(),
            is_required: false,
            props,
        }
    }

    /// Mark the field as unconditionally required.
    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    /// Display label, falling back to the key.
    pub fn label(&self) -> &str {
        self.props.label.as_deref().unwrap_or(&self.key)
    }

    /// Which conditional mechanism governs this field.
    ///
    /// A field-level `x-required_if` always wins; the schema branch is only
    /// considered for fields that declare no dependency of their own.
    pub fn control<'a>(&'a self, schema: &'a FormSchema) -> Control<'a> {
        if let Some(condition) = &self.props.required_if {
            return Control::DependsOnField(condition);
        }
        match schema.branching() {
            Some(branching) if branching.participates(&self.key) => {
                Control::DependsOnBranch(branching)
            }
            _ => Control::Unconditional,
        }
    }
}

/// What decides a field's visibility and requiredness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control<'a> {
    /// Always shown; required only through `isRequired`.
    Unconditional,
    /// Governed by the field's own `x-required_if`.
    DependsOnField(&'a RequiredIfCondition),
    /// Governed by the schema's `if`/`then`/`else` block.
    DependsOnBranch(Branching<'a>),
}

/// Expected value of a branch condition field (`{ "const": ... }`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstMatch {
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// The `if` block of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchProbe {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, ConstMatch>,
}

/// A `then` or `else` block of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Value>,
}

impl Branch {
    /// Key is listed in `required` or present in `properties`.
    pub fn mentions(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key) || self.properties.contains_key(key)
    }

    pub fn requires(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key)
    }
}

/// Which side of the schema branch the current data selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSide {
    Then,
    Else,
}

/// A complete `if`/`then`/`else` block.
///
/// Branching supports exactly one condition field: the first entry of
/// `if.properties`. Additional entries are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branching<'a> {
    pub probe: &'a BranchProbe,
    pub then_branch: &'a Branch,
    pub else_branch: &'a Branch,
}

impl<'a> Branching<'a> {
    pub fn condition_field(&self) -> Option<&'a str> {
        self.probe.properties.keys().next().map(String::as_str)
    }

    pub fn expected_value(&self) -> Option<&'a Value> {
        self.probe
            .properties
            .values()
            .next()
            .and_then(|c| c.value.as_ref())
    }

    /// Number of `if.properties` entries beyond the condition field.
    pub fn ignored_conditions(&self) -> usize {
        self.probe.properties.len().saturating_sub(1)
    }

    pub fn in_then(&self, key: &str) -> bool {
        self.then_branch.mentions(key)
    }

    pub fn in_else(&self, key: &str) -> bool {
        self.else_branch.mentions(key)
    }

    pub fn participates(&self, key: &str) -> bool {
        self.in_then(key) || self.in_else(key)
    }

    /// Select a branch from the condition field's current value.
    ///
    /// Returns `None` when the condition value is blank.
    pub fn select(&self, data: &FormData) -> Option<BranchSide> {
        let current = self.condition_field().and_then(|k| data.get(k));
        if is_blank(current) {
            return None;
        }
        let matched = match (current, self.expected_value()) {
            (Some(current), Some(expected)) => values_equal(current, expected),
            _ => false,
        };
        Some(if matched {
            BranchSide::Then
        } else {
            BranchSide::Else
        })
    }

    pub fn branch(&self, side: BranchSide) -> &'a Branch {
        match side {
            BranchSide::Then => self.then_branch,
            BranchSide::Else => self.else_branch,
        }
    }
}

/// A whole form: field declarations plus optional schema-level branching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Keys of unconditionally required fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, FieldProperties>,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<BranchProbe>,
    #[serde(rename = "then", default, skip_serializing_if = "Option::is_none")]
    pub then_branch: Option<Branch>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub else_branch: Option<Branch>,
}

impl FormSchema {
    /// The branching block, if `if`, `then`, and `else` are all present.
    pub fn branching(&self) -> Option<Branching<'_>> {
        match (&self.condition, &self.then_branch, &self.else_branch) {
            (Some(probe), Some(then_branch), Some(else_branch)) => Some(Branching {
                probe,
                then_branch,
                else_branch,
            }),
            _ => None,
        }
    }

    /// Build field definitions in display order.
    ///
    /// Fields are sorted by `x-order`; fields without one keep declaration
    /// order after the ordered ones.
    pub fn fields(&self) -> Vec<FieldDefinition> {
        let mut fields: Vec<FieldDefinition> = self
            .properties
            .iter()
            .map(|(key, props)| {
                FieldDefinition::new(key.clone(), props.clone())
                    .required(self.required.contains(key))
            })
            .collect();
        fields.sort_by_key(|f| (f.props.order.is_none(), f.props.order.unwrap_or(0)));
        fields
    }
}

/// Options for evaluating a schema against data.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Calendar date age checks are measured against.
    pub today: NaiveDate,
    /// When true, conditions using an operator other than `eq` fail with
    /// [`EvalError::UnsupportedOperator`](crate::EvalError::UnsupportedOperator)
    /// instead of falling back to the blank check.
    pub strict_operators: bool,
}

impl EvalOptions {
    /// Options dated to the local calendar day, lenient operators.
    pub fn new() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
            strict_operators: false,
        }
    }

    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn strict_operators(mut self, strict: bool) -> Self {
        self.strict_operators = strict;
        self
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self::new()
    }
}
