//! Project use-case service.
//!
//! # Responsibility
//! - Create, rename, reorder and move projects within the project forest.
//! - Reject moves that would make a project its own ancestor.
//!
//! # Invariants
//! - A new or moved project's parent must exist at call time.
//! - Removing a project leaves child projects and tasks with dangling
//!   `parent_id`/`project_id` references; they surface as roots/unassigned.

use super::{normalize_required_text, ServiceError, ServiceResult};
use crate::model::{Project, ProjectId, ValidationError};
use crate::store::EntityStore;
use log::{info, warn};
use std::collections::HashSet;

/// Input for [`ProjectService::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub parent_id: Option<ProjectId>,
    /// `None` appends after the current last sibling.
    pub order: Option<i64>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial change for [`ProjectService::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub order: Option<i64>,
    /// `Some(None)` moves the project to the root level.
    pub parent_id: Option<Option<ProjectId>>,
}

pub struct ProjectService<'s> {
    store: &'s mut EntityStore,
}

impl<'s> ProjectService<'s> {
    pub fn new(store: &'s mut EntityStore) -> Self {
        Self { store }
    }

    /// Creates a project under `input.parent_id` (or at the root).
    ///
    /// # Errors
    /// - `ProjectNotFound` when the parent does not exist.
    /// - `Validation` for a blank name.
    pub fn create(&mut self, input: NewProject) -> ServiceResult<Project> {
        let name = normalize_required_text(&input.name, ValidationError::EmptyName)
            .map_err(|err| reject("project_create", None, err.into()))?;
        self.ensure_parent(input.parent_id)
            .map_err(|err| reject("project_create", None, err))?;

        let order = input
            .order
            .unwrap_or_else(|| self.next_sibling_order(input.parent_id));
        let mut project = Project::new(name, order);
        project.parent_id = input.parent_id;
        project
            .validate()
            .map_err(|err| reject("project_create", Some(project.id), err.into()))?;

        self.store.add_project(project.clone());
        info!(
            "event=project_create module=service status=ok project_id={} has_parent={} order={}",
            project.id,
            project.parent_id.is_some(),
            project.order
        );
        Ok(project)
    }

    /// Applies `patch` to an existing project.
    ///
    /// # Errors
    /// - `ProjectNotFound` when `id` or the new parent is unknown.
    /// - `Validation` for a blank name or a move that would create a cycle.
    pub fn update(&mut self, id: ProjectId, patch: ProjectPatch) -> ServiceResult<Project> {
        let Some(mut project) = self.store.get_project(id).cloned() else {
            return Err(reject("project_update", Some(id), ServiceError::ProjectNotFound(id)));
        };

        if let Some(name) = patch.name {
            project.name = normalize_required_text(&name, ValidationError::EmptyName)
                .map_err(|err| reject("project_update", Some(id), err.into()))?;
        }
        if let Some(order) = patch.order {
            project.order = order;
        }
        if let Some(parent_id) = patch.parent_id {
            self.ensure_parent(parent_id)
                .map_err(|err| reject("project_update", Some(id), err))?;
            if let Some(parent_id) = parent_id {
                if self.would_create_cycle(id, parent_id) {
                    let err = ValidationError::ProjectCycle {
                        project_id: id,
                        parent_id,
                    };
                    return Err(reject("project_update", Some(id), err.into()));
                }
            }
            project.parent_id = parent_id;
        }

        self.store.update_project(project.clone());
        info!(
            "event=project_update module=service status=ok project_id={} has_parent={} order={}",
            project.id,
            project.parent_id.is_some(),
            project.order
        );
        Ok(project)
    }

    pub fn remove(&mut self, id: ProjectId) -> ServiceResult<Project> {
        match self.store.remove_project(id) {
            Some(project) => {
                info!("event=project_remove module=service status=ok project_id={id}");
                Ok(project)
            }
            None => Err(reject(
                "project_remove",
                Some(id),
                ServiceError::ProjectNotFound(id),
            )),
        }
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.store.get_project(id)
    }

    /// Direct children of `parent_id` (`None` = roots) in display order.
    ///
    /// Projects whose parent was removed are listed with the roots.
    pub fn list_children(&self, parent_id: Option<ProjectId>) -> Vec<&Project> {
        match parent_id {
            Some(parent_id) => self.store.children_of(Some(parent_id)),
            None => {
                let mut roots = self.store.children_of(None);
                let mut orphans = self
                    .store
                    .projects()
                    .filter(|project| {
                        project
                            .parent_id
                            .is_some_and(|parent_id| !self.store.contains_project(parent_id))
                    })
                    .collect::<Vec<_>>();
                if orphans.is_empty() {
                    return roots;
                }
                roots.append(&mut orphans);
                roots.sort_by(|left, right| {
                    left.order
                        .cmp(&right.order)
                        .then_with(|| left.name.to_lowercase().cmp(&right.name.to_lowercase()))
                        .then_with(|| left.id.cmp(&right.id))
                });
                roots
            }
        }
    }

    fn ensure_parent(&self, parent_id: Option<ProjectId>) -> ServiceResult<()> {
        match parent_id {
            Some(parent_id) if !self.store.contains_project(parent_id) => {
                Err(ServiceError::ProjectNotFound(parent_id))
            }
            _ => Ok(()),
        }
    }

    /// Walks up from `new_parent`; a cycle exists if the walk reaches `project_id`.
    fn would_create_cycle(&self, project_id: ProjectId, new_parent: ProjectId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(new_parent);
        while let Some(current) = cursor {
            if current == project_id {
                return true;
            }
            if !visited.insert(current) {
                // Pre-existing loop that does not include `project_id`.
                return false;
            }
            cursor = self
                .store
                .get_project(current)
                .and_then(|project| project.parent_id);
        }
        false
    }

    fn next_sibling_order(&self, parent_id: Option<ProjectId>) -> i64 {
        self.store
            .children_of(parent_id)
            .last()
            .map_or(0, |project| project.order.saturating_add(1))
    }
}

fn reject(event: &str, id: Option<ProjectId>, err: ServiceError) -> ServiceError {
    let id = id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    warn!(
        "event={event} module=service status=error project_id={id} error_code={}",
        err.code()
    );
    err
}

#[cfg(test)]
mod tests {
    use super::{NewProject, ProjectPatch, ProjectService};
    use crate::model::ValidationError;
    use crate::service::ServiceError;
    use crate::store::EntityStore;
    use uuid::Uuid;

    #[test]
    fn create_appends_after_last_sibling() {
        let mut store = EntityStore::new();
        let mut service = ProjectService::new(&mut store);
        let first = service.create(NewProject::new("Work")).expect("create should succeed");
        let second = service.create(NewProject::new("Home")).expect("create should succeed");
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);

        let names = service
            .list_children(None)
            .into_iter()
            .map(|project| project.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Work", "Home"]);
    }

    #[test]
    fn create_requires_existing_parent() {
        let mut store = EntityStore::new();
        let mut service = ProjectService::new(&mut store);
        let missing = Uuid::new_v4();
        let mut input = NewProject::new("Child");
        input.parent_id = Some(missing);
        assert_eq!(
            service.create(input).expect_err("create should be rejected"),
            ServiceError::ProjectNotFound(missing)
        );
    }

    #[test]
    fn moving_under_a_descendant_is_a_cycle() {
        let mut store = EntityStore::new();
        let mut service = ProjectService::new(&mut store);
        let root = service.create(NewProject::new("Root")).expect("create should succeed");
        let mut child_input = NewProject::new("Child");
        child_input.parent_id = Some(root.id);
        let child = service.create(child_input).expect("create should succeed");

        let patch = ProjectPatch {
            parent_id: Some(Some(child.id)),
            ..ProjectPatch::default()
        };
        assert_eq!(
            service.update(root.id, patch).expect_err("update should be rejected"),
            ServiceError::Validation(ValidationError::ProjectCycle {
                project_id: root.id,
                parent_id: child.id,
            })
        );

        let self_parent = ProjectPatch {
            parent_id: Some(Some(root.id)),
            ..ProjectPatch::default()
        };
        assert!(service.update(root.id, self_parent).is_err());
        assert_eq!(service.get(root.id).expect("entity should exist").parent_id, None);
    }

    #[test]
    fn orphans_are_listed_with_roots_after_parent_removal() {
        let mut store = EntityStore::new();
        let mut service = ProjectService::new(&mut store);
        let parent = service.create(NewProject::new("Parent")).expect("create should succeed");
        let mut child_input = NewProject::new("Child");
        child_input.parent_id = Some(parent.id);
        child_input.order = Some(5);
        let child = service.create(child_input).expect("create should succeed");

        service.remove(parent.id).expect("remove should succeed");
        let roots = service.list_children(None);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, child.id);
        assert!(service.remove(parent.id).expect_err("remove should be rejected").is_not_found());
    }
}
