//! Shared primitive types used across the scoring engine.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub type TemplateId = i64;
pub type CategoryId = i64;
pub type AspectId = i64;
pub type SubAspectId = i64;
pub type EventId = i64;
pub type PositionId = i64;
pub type BatchId = i64;
pub type ParticipantId = i64;
pub type InstitutionId = i64;
pub type CustomStandardId = i64;

/// A stable code naming a category, aspect or sub-aspect inside one template.
///
/// Override layers key their maps by code, never by row id, so a custom
/// standard survives a re-import of the template structure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Code {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Code {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
