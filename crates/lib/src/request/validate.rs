//! Request validation.
//!
//! Each field is checked explicitly and every failure is collected, so a
//! caller sees all problems with a request at once.

use std::fmt;

use super::BuildRequest;
use crate::module::ModuleRef;
use crate::platform::{Platform, is_arch, is_os};

const BLANK: &str = "cannot be blank";
const INVALID: &str = "must be a valid value";

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  /// Field path, e.g. `arch` or `plugins[2].module`.
  pub field: String,
  pub message: &'static str,
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

/// Every field that failed validation, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
  pub errors: Vec<FieldError>,
}

impl ValidationError {
  /// Whether `field` is among the failures.
  pub fn has_field(&self, field: &str) -> bool {
    self.errors.iter().any(|e| e.field == field)
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, error) in self.errors.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{error}")?;
    }
    f.write_str(".")
  }
}

impl std::error::Error for ValidationError {}

/// Validate every field of a request, returning the parsed target platform.
///
/// Checks, in order: `arch` and `os` are present and supported, each plugin
/// has a module identity, and the glue and base application modules are
/// present with identities.
pub fn validate(request: &BuildRequest) -> Result<Platform, ValidationError> {
  let mut errors = Vec::new();
  let mut fail = |field: String, message: &'static str| errors.push(FieldError { field, message });

  check_member(&request.arch, is_arch, "arch", &mut fail);
  check_member(&request.os, is_os, "os", &mut fail);

  for (i, plugin) in request.plugins.iter().enumerate() {
    if is_blank(&plugin.module) {
      fail(format!("plugins[{i}].module"), BLANK);
    }
  }

  check_required(request.xpb.as_ref(), "xpb", &mut fail);
  check_required(request.pocketbase.as_ref(), "pocketbase", &mut fail);

  match request.platform() {
    Some(platform) if errors.is_empty() => Ok(platform),
    _ => Err(ValidationError { errors }),
  }
}

fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

fn check_member(value: &str, predicate: fn(&str) -> bool, field: &str, fail: &mut impl FnMut(String, &'static str)) {
  if is_blank(value) {
    fail(field.to_string(), BLANK);
  } else if !predicate(value) {
    fail(field.to_string(), INVALID);
  }
}

fn check_required(module: Option<&ModuleRef>, field: &str, fail: &mut impl FnMut(String, &'static str)) {
  match module {
    None => fail(field.to_string(), BLANK),
    Some(m) if is_blank(&m.module) => fail(format!("{field}.module"), BLANK),
    Some(_) => {}
  }
}
