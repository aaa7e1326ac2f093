//! Field validation for activities entering the store.
//!
//! The store itself accepts whatever it is given; callers run these checks
//! first and refuse to write when any field fails.

use std::fmt;

use crate::models::{ActivityPatch, NewActivity, YearMonth};

pub const MIN_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn into_result(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn check_required(errors: &mut ValidationError, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} is required", label));
    }
}

fn check_description(errors: &mut ValidationError, value: &str) {
    if value.chars().count() < MIN_DESCRIPTION_CHARS {
        errors.push(
            "description",
            format!(
                "Description must be at least {} characters",
                MIN_DESCRIPTION_CHARS
            ),
        );
    }
}

fn check_hours(errors: &mut ValidationError, hours: Option<f64>) {
    if let Some(hours) = hours {
        if !hours.is_finite() || hours < 0.0 {
            errors.push("hours", "Hours must be a non-negative number");
        }
    }
}

fn check_date_order(
    errors: &mut ValidationError,
    start: YearMonth,
    end: Option<YearMonth>,
    is_ongoing: bool,
) {
    if let (false, Some(end)) = (is_ongoing, end) {
        if end < start {
            errors.push("end_date", "End date cannot be before start date");
        }
    }
}

impl NewActivity {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        check_required(&mut errors, "name", "Name", &self.name);
        check_required(&mut errors, "organization", "Organization", &self.organization);
        check_required(&mut errors, "role", "Role", &self.role);
        check_description(&mut errors, &self.description);
        check_hours(&mut errors, self.hours);
        check_date_order(&mut errors, self.start_date, self.end_date, self.is_ongoing);
        errors.into_result()
    }
}

impl ActivityPatch {
    /// Checks the fields present in the patch. Date ordering needs the merged
    /// record, so it is checked separately by the caller through
    /// [`validate_dates`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        if let Some(name) = &self.name {
            check_required(&mut errors, "name", "Name", name);
        }
        if let Some(organization) = &self.organization {
            check_required(&mut errors, "organization", "Organization", organization);
        }
        if let Some(role) = &self.role {
            check_required(&mut errors, "role", "Role", role);
        }
        if let Some(description) = &self.description {
            check_description(&mut errors, description);
        }
        if let Some(hours) = self.hours {
            check_hours(&mut errors, hours);
        }
        errors.into_result()
    }
}

/// Date ordering check for a record after a patch has been merged.
pub fn validate_dates(
    start: YearMonth,
    end: Option<YearMonth>,
    is_ongoing: bool,
) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    check_date_order(&mut errors, start, end, is_ongoing);
    errors.into_result()
}
