//! Who may do what with a task.
//!
//! Listing and creating are open to every authenticated user. Viewing,
//! updating and deleting a single task are reserved for its creator; a task
//! without a creator belongs to nobody.

use crate::entities::{task, user};
use crate::errors::ApiError;

pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAbility {
    View,
    Update,
    Delete,
}

impl TaskAbility {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[must_use]
pub fn is_owner(user: &user::Model, task: &task::Model) -> bool {
    task.created_by == Some(user.id)
}

#[must_use]
pub fn allows(user: &user::Model, ability: TaskAbility, task: &task::Model) -> bool {
    match ability {
        TaskAbility::View | TaskAbility::Update | TaskAbility::Delete => is_owner(user, task),
    }
}

/// # Errors
///
/// A 403 [`ApiError`] when `user` may not perform `ability` on `task`.
pub fn authorize(
    user: &user::Model,
    ability: TaskAbility,
    task: &task::Model,
) -> Result<(), ApiError> {
    if allows(user, ability, task) {
        return Ok(());
    }
    tracing::debug!(
        user_id = user.id,
        task_id = task.id,
        ability = ability.as_str(),
        "task access denied"
    );
    Err(ApiError::forbidden(FORBIDDEN_MESSAGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i32) -> user::Model {
        user::Model {
            id,
            name: "Someone".into(),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(created_by: Option<i32>) -> task::Model {
        task::Model {
            id: 1,
            title: "Write docs".into(),
            description: None,
            status: "pending".into(),
            due_date: None,
            priority: 3,
            created_by,
            updated_by: created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_creator_may_do_everything() {
        for ability in [TaskAbility::View, TaskAbility::Update, TaskAbility::Delete] {
            assert!(authorize(&user(1), ability, &task(Some(1))).is_ok());
        }
    }

    #[test]
    fn test_others_are_forbidden() {
        let err = authorize(&user(2), TaskAbility::Update, &task(Some(1))).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_orphan_tasks_belong_to_nobody() {
        assert!(!allows(&user(1), TaskAbility::View, &task(None)));
    }
}
