//! Tag use-case service.
//!
//! # Invariants
//! - Tag names are unique case-insensitively; create and rename both check.
//! - Removing a tag leaves task references dangling; hydration omits them.

use super::{normalize_optional_text, normalize_required_text, ServiceError, ServiceResult};
use crate::model::{Tag, TagId, ValidationError};
use crate::store::EntityStore;
use log::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub color: Option<String>,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }
}

/// Partial change for [`TagService::update`]; `color: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
}

pub struct TagService<'s> {
    store: &'s mut EntityStore,
}

impl<'s> TagService<'s> {
    pub fn new(store: &'s mut EntityStore) -> Self {
        Self { store }
    }

    /// # Errors
    /// - `Validation` for a blank or already-used name, or a bad color.
    pub fn create(&mut self, input: NewTag) -> ServiceResult<Tag> {
        let name = normalize_required_text(&input.name, ValidationError::EmptyName)
            .map_err(|err| reject("tag_create", None, err.into()))?;
        self.ensure_name_free(&name, None)
            .map_err(|err| reject("tag_create", None, err.into()))?;

        let mut tag = Tag::new(name);
        tag.color = normalize_optional_text(input.color);
        tag.validate()
            .map_err(|err| reject("tag_create", Some(tag.id), err.into()))?;

        self.store.add_tag(tag.clone());
        info!(
            "event=tag_create module=service status=ok tag_id={} has_color={}",
            tag.id,
            tag.color.is_some()
        );
        Ok(tag)
    }

    /// Renames and/or recolors a tag.
    pub fn update(&mut self, id: TagId, patch: TagPatch) -> ServiceResult<Tag> {
        let Some(mut tag) = self.store.get_tag(id).cloned() else {
            return Err(reject("tag_update", Some(id), ServiceError::TagNotFound(id)));
        };

        if let Some(name) = patch.name {
            let name = normalize_required_text(&name, ValidationError::EmptyName)
                .map_err(|err| reject("tag_update", Some(id), err.into()))?;
            self.ensure_name_free(&name, Some(id))
                .map_err(|err| reject("tag_update", Some(id), err.into()))?;
            tag.name = name;
        }
        if let Some(color) = patch.color {
            tag.color = normalize_optional_text(color);
        }
        tag.validate()
            .map_err(|err| reject("tag_update", Some(id), err.into()))?;

        self.store.update_tag(tag.clone());
        info!(
            "event=tag_update module=service status=ok tag_id={} has_color={}",
            tag.id,
            tag.color.is_some()
        );
        Ok(tag)
    }

    pub fn remove(&mut self, id: TagId) -> ServiceResult<Tag> {
        match self.store.remove_tag(id) {
            Some(tag) => {
                info!("event=tag_remove module=service status=ok tag_id={id}");
                Ok(tag)
            }
            None => Err(reject("tag_remove", Some(id), ServiceError::TagNotFound(id))),
        }
    }

    pub fn get(&self, id: TagId) -> Option<&Tag> {
        self.store.get_tag(id)
    }

    /// Case-insensitive lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&Tag> {
        self.store.find_tag_by_name(name)
    }

    pub fn list(&self) -> Vec<&Tag> {
        let mut tags = self.store.tags().collect::<Vec<_>>();
        tags.sort_by_key(|tag| tag.normalized_name());
        tags
    }

    fn ensure_name_free(&self, name: &str, owner: Option<TagId>) -> Result<(), ValidationError> {
        match self.store.find_tag_by_name(name) {
            Some(existing) if Some(existing.id) != owner => {
                Err(ValidationError::DuplicateTagName(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn reject(event: &str, id: Option<TagId>, err: ServiceError) -> ServiceError {
    let id = id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    warn!(
        "event={event} module=service status=error tag_id={id} error_code={}",
        err.code()
    );
    err
}
