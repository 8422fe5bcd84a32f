//! Field-level validation errors for user-submitted forms.

use serde::Serialize;

/// A single rejected field and the message to show next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

/// Accumulates at most one message per field, keeping the first.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
    if !self.0.iter().any(|e| e.field == field) {
      self.0.push(FieldError { field, message: message.into() });
    }
  }

  /// Add `message` for `field` unless `ok` holds.
  pub fn check(&mut self, ok: bool, field: &'static str, message: &str) {
    if !ok {
      self.add(field, message);
    }
  }

  /// `Ok(value)` if nothing was recorded, otherwise every violation.
  pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
    if self.0.is_empty() { Ok(value) } else { Err(self.0) }
  }
}

/// Trim a free-text field, mapping blank input to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}
