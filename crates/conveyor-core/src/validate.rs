//! Field-level validation helpers.
//!
//! Job params and results are plain Rust types deriving
//! [`validator::Validate`]. The helpers here flatten a
//! [`ValidationErrors`] tree into a single message that lists **every**
//! failing field, so callers see the full picture instead of the first
//! failure.

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;
use crate::result::AppResult;

/// Validate a value, reporting all failing fields in one error.
///
/// `subject` names what is being validated ("params", "result") and is
/// included in the error message.
pub fn validate_fields<T: Validate>(subject: &str, value: &T) -> AppResult<()> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(AppError::validation(format!(
            "{subject} validation failed: {}",
            describe_errors(&errors)
        ))),
    }
}

/// Flatten a validation-error tree into `field: reason; field: reason`.
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut parts = Vec::new();
    collect(errors, "", &mut parts);
    parts.sort();
    parts.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let reason = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    out.push(format!("{path}: {reason}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}
