//! Conditional resolution - decides whether a field is shown and whether it is required.
//!
//! Both resolvers dispatch on [`FieldDefinition::control`], so a field is
//! governed either by its own `x-required_if` or by the schema branch, never both.

use tracing::{debug, warn};

use crate::error::EvalError;
use crate::types::{
    is_blank, values_equal, Control, EvalOptions, FieldDefinition, FormData, FormSchema, Operator,
    RequiredIfCondition,
};

/// Decide whether a field should be shown for the current data.
///
/// # Errors
///
/// Returns `EvalError::UnsupportedOperator` when the field's condition uses an
/// operator other than `eq` and `options.strict_operators` is set.
pub fn should_show(
    field: &FieldDefinition,
    schema: &FormSchema,
    data: &FormData,
    options: &EvalOptions,
) -> Result<bool, EvalError> {
    let visible = match field.control(schema) {
        Control::Unconditional => true,
        Control::DependsOnField(condition) => {
            let current = data.get(&condition.field);
            if is_blank(current) {
                false
            } else {
                match condition.operator {
                    Operator::Eq => current.is_some_and(|v| values_equal(v, &condition.value)),
                    // Only the blank check applies to the other operators
                    _ => {
                        unsupported_operator(field, condition, options)?;
                        true
                    }
                }
            }
        }
        Control::DependsOnBranch(branching) => match branching.select(data) {
            Some(side) => branching.branch(side).mentions(&field.key),
            None => false,
        },
    };

    debug!(field = %field.key, visible, "resolved visibility");
    Ok(visible)
}

/// Decide whether a field is currently mandatory.
///
/// Callers must not ask about fields [`should_show`] hides.
///
/// # Errors
///
/// Returns `EvalError::UnsupportedOperator` when the field's condition uses an
/// operator other than `eq` and `options.strict_operators` is set.
pub fn is_required(
    field: &FieldDefinition,
    schema: &FormSchema,
    data: &FormData,
    options: &EvalOptions,
) -> Result<bool, EvalError> {
    if field.is_required {
        return Ok(true);
    }

    let required = match field.control(schema) {
        Control::Unconditional => false,
        Control::DependsOnField(condition) => match condition.operator {
            Operator::Eq => data
                .get(&condition.field)
                .is_some_and(|v| values_equal(v, &condition.value)),
            _ => {
                unsupported_operator(field, condition, options)?;
                false
            }
        },
        // Membership in a branch's `properties` alone does not make a field required
        Control::DependsOnBranch(branching) => branching
            .select(data)
            .is_some_and(|side| branching.branch(side).requires(&field.key)),
    };

    debug!(field = %field.key, required, "resolved requiredness");
    Ok(required)
}

fn unsupported_operator(
    field: &FieldDefinition,
    condition: &RequiredIfCondition,
    options: &EvalOptions,
) -> Result<(), EvalError> {
    if options.strict_operators {
        return Err(EvalError::UnsupportedOperator {
            field: field.key.clone(),
            operator: condition.operator,
        });
    }
    warn!(
        field = %field.key,
        operator = %condition.operator,
        "operator is not evaluated, only the blank check applies"
    );
    Ok(())
}
