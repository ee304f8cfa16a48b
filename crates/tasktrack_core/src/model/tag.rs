//! Tag domain model.
//!
//! # Invariants
//! - Tag names are unique under [`normalize_tag_name`]; the store keeps a
//!   normalized-name side map for case-insensitive lookup.
//! - The stored `name` keeps the caller's casing for display.

use super::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable tag identifier.
pub type TagId = Uuid;

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid color regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// Display color, `#rgb` or `#rrggbb`.
    pub color: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: None,
        }
    }

    /// Lookup key for this tag's name.
    pub fn normalized_name(&self) -> String {
        normalize_tag_name(&self.name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let Some(color) = self.color.as_deref() {
            if !COLOR_RE.is_match(color) {
                return Err(ValidationError::InvalidColor(color.to_string()));
            }
        }
        Ok(())
    }
}

/// Case-insensitive lookup key: trimmed and lower-cased.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}
