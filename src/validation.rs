//! Input validation for episode configurations.
//!
//! Checks structural integrity of machine and job-template definitions
//! before an episode is constructed. Detects:
//! - Duplicate machine or template names
//! - Machines with no capabilities
//! - Templates with no operations or negative durations
//! - Fewer deadlines than requested repeats
//! - Dangling or out-of-order predecessor references
//!
//! Predecessor links are the canonical precedence rule; the commit path
//! additionally chains each finish into the next array slot, so any
//! template whose predecessor is not an earlier slot would let the two
//! rules diverge and is rejected here.

use std::collections::HashSet;

use crate::models::{JobTemplate, MachineSpec};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two machines or two templates share a name.
    DuplicateName,
    /// A machine has an empty capability set.
    EmptyCapabilities,
    /// A template has no operations.
    EmptyTemplate,
    /// An operation has a negative duration.
    NegativeDuration,
    /// A template declares fewer deadlines than requested repeats.
    DeadlineShortfall,
    /// An operation references a predecessor outside the template.
    InvalidPredecessor,
    /// An operation's predecessor is not an earlier array slot, so the
    /// predecessor bound and the positional finish-chaining bound could
    /// disagree.
    PredecessorOrder,
    /// The repeats list does not match the template list.
    ShapeMismatch,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates an episode configuration.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_config(
    machines: &[MachineSpec],
    templates: &[JobTemplate],
    repeats: &[usize],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut machine_names = HashSet::new();
    for m in machines {
        if !machine_names.insert(m.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate machine name: {}", m.name),
            ));
        }
        if m.capabilities.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyCapabilities,
                format!("Machine '{}' has no capabilities", m.name),
            ));
        }
    }

    if repeats.len() != templates.len() {
        errors.push(ValidationError::new(
            ValidationErrorKind::ShapeMismatch,
            format!(
                "{} repeat counts for {} job templates",
                repeats.len(),
                templates.len()
            ),
        ));
    }

    let mut template_names = HashSet::new();
    for (t_idx, template) in templates.iter().enumerate() {
        if !template_names.insert(template.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate job template name: {}", template.name),
            ));
        }

        if template.operations.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyTemplate,
                format!("Job template '{}' has no operations", template.name),
            ));
        }

        if let Some(&required) = repeats.get(t_idx) {
            if template.deadlines.len() < required {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DeadlineShortfall,
                    format!(
                        "Job template '{}' declares {} deadlines for {} repeats",
                        template.name,
                        template.deadlines.len(),
                        required
                    ),
                ));
            }
        }

        for (o_idx, op) in template.operations.iter().enumerate() {
            if op.duration < 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeDuration,
                    format!(
                        "Operation {} of '{}' has negative duration {}",
                        o_idx, template.name, op.duration
                    ),
                ));
            }

            if let Some(pred) = op.predecessor {
                if pred >= template.operations.len() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidPredecessor,
                        format!(
                            "Operation {} of '{}' references missing predecessor {}",
                            o_idx, template.name, pred
                        ),
                    ));
                } else if pred >= o_idx {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::PredecessorOrder,
                        format!(
                            "Operation {} of '{}' has predecessor {} at or after itself",
                            o_idx, template.name, pred
                        ),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
