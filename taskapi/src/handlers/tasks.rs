use axum::extract::{RawQuery, State};
use chrono::NaiveDate;
use querykit::RawParams;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::auth::AuthUser;
use crate::entities::task::{self, MAX_PRIORITY, MIN_PRIORITY, TaskStatus, TaskSummary};
use crate::errors::{ApiError, ErrorResponse};
use crate::policy::{self, TaskAbility};
use crate::response::{ApiResponse, MessageResponse};
use crate::state::AppState;
use crate::validation::{
    AppJson, AppPath, ValidationErrors, sanitize, sanitize_params, validate_search,
    validators::{char_len, parse_date},
};

pub const MAX_TITLE: usize = 255;

/// Body of `POST`, `PUT` and `PATCH`. Omitted fields keep their value on
/// update; `null` clears the nullable ones.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskRequest {
    /// Required on create, at most 255 characters.
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// `pending`, `in_progress`, `completed` or `cancelled`.
    pub status: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<Option<String>>,
    /// 1 to 5, as a number or a numeric string.
    #[schema(value_type = Option<i32>, minimum = 1, maximum = 5)]
    pub priority: Option<Value>,
}

/// A validated [`TaskRequest`], with `None` meaning "not sent".
#[derive(Debug, Default, PartialEq, Eq)]
struct TaskInput {
    title: Option<String>,
    description: Option<Option<String>>,
    status: Option<TaskStatus>,
    due_date: Option<Option<NaiveDate>>,
    priority: Option<i32>,
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

impl TaskRequest {
    fn validate(self, creating: bool) -> Result<TaskInput, ApiError> {
        let mut errors = ValidationErrors::new();

        let title = self.title.as_deref().map(sanitize);
        match title.as_deref() {
            None | Some("") if creating || title.is_some() => {
                errors.add("title", "The title is mandatory");
            }
            Some(title) if char_len(title) > MAX_TITLE => {
                errors.add("title", "The title cannot exceed 255 characters");
            }
            _ => {}
        }

        let description = self.description.map(|description| {
            description
                .map(|text| sanitize(&text))
                .filter(|text| !text.is_empty())
        });

        let status = self.status.as_deref().map(sanitize).and_then(|status| {
            let parsed = TaskStatus::parse(&status);
            if parsed.is_none() {
                errors.add(
                    "status",
                    "The status must be pending, in_progress, completed or cancelled",
                );
            }
            parsed
        });

        let due_date = self.due_date.map(|due_date| {
            due_date
                .map(|text| sanitize(&text))
                .filter(|text| !text.is_empty())
                .and_then(|text| {
                    let parsed = parse_date(&text).map(|moment| moment.date());
                    if parsed.is_none() {
                        errors.add("due_date", "The expiration date must be a valid date");
                    }
                    parsed
                })
        });

        let priority = match self.priority.as_ref().filter(|value| !value.is_null()) {
            None => None,
            Some(value) => match integer_value(value) {
                None => {
                    errors.add("priority", "The priority must be an integer");
                    None
                }
                Some(number) if number < i64::from(MIN_PRIORITY) => {
                    errors.add("priority", "The priority must be at least 1");
                    None
                }
                Some(number) if number > i64::from(MAX_PRIORITY) => {
                    errors.add("priority", "The priority cannot be greater than 5");
                    None
                }
                Some(number) => i32::try_from(number).ok(),
            },
        };

        errors.result()?;
        Ok(TaskInput {
            title,
            description,
            status,
            due_date,
            priority,
        })
    }
}

/// One row of `GET /tasks`: the whole task, or only `id` and `title` when
/// the listing was narrowed by simple search.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum TaskListItem {
    Full(task::Model),
    Summary(TaskSummary),
}

/// Query parameters of `GET /tasks`. Only documents them; the handler reads
/// the raw query so repeated and `key[]` parameters survive.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct TaskListQuery {
    /// Page number, from 1
    page: Option<u64>,
    /// Page size, 1 to 100 (default 10)
    per_page: Option<u64>,
    /// `priority` by default; `status` sorts by workflow position
    sort_by: Option<String>,
    /// `asc` or `desc`
    sort_order: Option<String>,
    /// Words matched across title, description and the creator's name and email
    global: Option<String>,
    /// Part of the title; returns only `id` and `title`
    search: Option<String>,
    /// One status or a comma-separated list
    status: Option<String>,
    priority: Option<i32>,
    /// Part of the title
    title: Option<String>,
    /// Created on or after (`YYYY-MM-DD`)
    date_start: Option<String>,
    /// Created on or before (`YYYY-MM-DD`)
    date_end: Option<String>,
    due_start: Option<String>,
    due_end: Option<String>,
    priority_min: Option<i32>,
    priority_max: Option<i32>,
}

async fn find_task<C: ConnectionTrait>(db: &C, id: i32) -> Result<task::Model, ApiError> {
    task::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", Some(id.to_string())))
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    security(("bearer" = [])),
    params(TaskListQuery),
    responses(
        (status = 200, description = "One page of tasks", body = ApiResponse<Vec<TaskListItem>>,
            headers(("Content-Range" = String, description = "tasks <first>-<last>/<total>"))),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 422, description = "Invalid search parameters", body = ErrorResponse)
    ),
    summary = "List tasks"
)]
pub async fn index(
    State(state): State<AppState>,
    _auth: AuthUser,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<TaskListItem>>, ApiError> {
    let raw = sanitize_params(&RawParams::from_query(query.as_deref().unwrap_or_default()));
    validate_search(&raw)?;

    let (params, listing) = state.tasks.listing(&raw);
    let result = if listing.is_projected() {
        listing
            .paginate::<TaskSummary, _>(&state.db, params.page, params.per_page)
            .await?
            .map(TaskListItem::Summary)
    } else {
        listing
            .paginate::<task::Model, _>(&state.db, params.page, params.per_page)
            .await?
            .map(TaskListItem::Full)
    };

    tracing::debug!(
        total = result.total,
        page = result.page,
        sort_by = %params.sort_by,
        "tasks listed"
    );
    Ok(ApiResponse::page(result, "tasks"))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    security(("bearer" = [])),
    request_body = TaskRequest,
    responses(
        (status = 201, description = "Task created", body = ApiResponse<task::Model>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    summary = "Create a task"
)]
pub async fn store(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<TaskRequest>,
) -> Result<ApiResponse<task::Model>, ApiError> {
    let input = request.validate(true)?;

    let created = task::ActiveModel {
        title: Set(input.title.unwrap_or_default()),
        description: Set(input.description.flatten()),
        status: Set(input.status.unwrap_or_default().as_str().to_owned()),
        due_date: Set(input.due_date.flatten()),
        priority: Set(input.priority.unwrap_or(task::DEFAULT_PRIORITY)),
        created_by: Set(Some(auth.user.id)),
        updated_by: Set(Some(auth.user.id)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(task_id = created.id, user_id = auth.user.id, "task created");
    Ok(ApiResponse::created(created, "Task created successfully"))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = i32, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = ApiResponse<task::Model>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 403, description = "Not the task's creator", body = ErrorResponse),
        (status = 404, description = "No such task", body = ErrorResponse)
    ),
    summary = "Show a task"
)]
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<task::Model>, ApiError> {
    let task = find_task(&state.db, id).await?;
    policy::authorize(&auth.user, TaskAbility::View, &task)?;
    Ok(ApiResponse::ok(task, "Task obtained successfully"))
}

async fn apply_update(
    state: &AppState,
    auth: &AuthUser,
    id: i32,
    request: TaskRequest,
) -> Result<ApiResponse<task::Model>, ApiError> {
    let task = find_task(&state.db, id).await?;
    policy::authorize(&auth.user, TaskAbility::Update, &task)?;
    let input = request.validate(false)?;

    let mut active: task::ActiveModel = task.into();
    if let Some(title) = input.title {
        active.title = Set(title);
    }
    if let Some(description) = input.description {
        active.description = Set(description);
    }
    if let Some(status) = input.status {
        active.status = Set(status.as_str().to_owned());
    }
    if let Some(due_date) = input.due_date {
        active.due_date = Set(due_date);
    }
    if let Some(priority) = input.priority {
        active.priority = Set(priority);
    }
    active.updated_by = Set(Some(auth.user.id));
    let updated = active.update(&state.db).await?;

    tracing::info!(task_id = updated.id, user_id = auth.user.id, "task updated");
    Ok(ApiResponse::ok(updated, "Task updated successfully"))
}

#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = i32, Path, description = "Task id")),
    request_body = TaskRequest,
    responses(
        (status = 200, description = "Task updated", body = ApiResponse<task::Model>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 403, description = "Not the task's creator", body = ErrorResponse),
        (status = 404, description = "No such task", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    summary = "Update a task"
)]
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(request): AppJson<TaskRequest>,
) -> Result<ApiResponse<task::Model>, ApiError> {
    apply_update(&state, &auth, id, request).await
}

#[utoipa::path(
    patch,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = i32, Path, description = "Task id")),
    request_body = TaskRequest,
    responses(
        (status = 200, description = "Task updated", body = ApiResponse<task::Model>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 403, description = "Not the task's creator", body = ErrorResponse),
        (status = 404, description = "No such task", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    summary = "Partially update a task"
)]
pub async fn modify(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(request): AppJson<TaskRequest>,
) -> Result<ApiResponse<task::Model>, ApiError> {
    apply_update(&state, &auth, id, request).await
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = i32, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 403, description = "Not the task's creator", body = ErrorResponse),
        (status = 404, description = "No such task", body = ErrorResponse)
    ),
    summary = "Delete a task"
)]
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    let task = find_task(&state.db, id).await?;
    policy::authorize(&auth.user, TaskAbility::Delete, &task)?;
    task.delete(&state.db).await?;

    tracing::info!(task_id = id, user_id = auth.user.id, "task deleted");
    Ok(ApiResponse::message("Task deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> TaskRequest {
        serde_json::from_value(body).unwrap()
    }

    fn failures(result: Result<TaskInput, ApiError>) -> crate::errors::FieldErrors {
        match result {
            Err(ApiError::ValidationFailed { errors }) => errors,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_requires_title() {
        let errors = failures(request(json!({})).validate(true));
        assert_eq!(errors["title"], vec!["The title is mandatory"]);

        let errors = failures(request(json!({"title": "   "})).validate(true));
        assert_eq!(errors["title"], vec!["The title is mandatory"]);
    }

    #[test]
    fn test_update_may_omit_title_but_not_blank_it() {
        let input = request(json!({"priority": 2})).validate(false).unwrap();
        assert_eq!(input.title, None);
        assert_eq!(input.priority, Some(2));

        let errors = failures(request(json!({"title": ""})).validate(false));
        assert_eq!(errors["title"], vec!["The title is mandatory"]);
    }

    #[test]
    fn test_fields_are_sanitized_and_parsed() {
        let input = request(json!({
            "title": "  Write\u{7}   docs ",
            "description": "  ",
            "status": "in_progress",
            "due_date": "2024-05-01",
            "priority": "4"
        }))
        .validate(true)
        .unwrap();

        assert_eq!(input.title.as_deref(), Some("Write docs"));
        assert_eq!(input.description, Some(None));
        assert_eq!(input.status, Some(TaskStatus::InProgress));
        assert_eq!(input.due_date, Some(NaiveDate::from_ymd_opt(2024, 5, 1)));
        assert_eq!(input.priority, Some(4));
    }

    #[test]
    fn test_null_clears_and_absent_keeps() {
        let input = request(json!({"description": null})).validate(false).unwrap();
        assert_eq!(input.description, Some(None));
        assert_eq!(input.due_date, None);
    }

    #[test]
    fn test_every_failure_is_reported() {
        let errors = failures(
            request(json!({
                "title": "x".repeat(256),
                "status": "done",
                "due_date": "someday",
                "priority": 9
            }))
            .validate(true),
        );
        assert_eq!(errors["title"], vec!["The title cannot exceed 255 characters"]);
        assert_eq!(
            errors["status"],
            vec!["The status must be pending, in_progress, completed or cancelled"]
        );
        assert_eq!(errors["due_date"], vec!["The expiration date must be a valid date"]);
        assert_eq!(errors["priority"], vec!["The priority cannot be greater than 5"]);
    }

    #[test]
    fn test_priority_bounds_and_type() {
        let low = failures(request(json!({"title": "a", "priority": 0})).validate(true));
        assert_eq!(low["priority"], vec!["The priority must be at least 1"]);

        let text = failures(request(json!({"title": "a", "priority": "high"})).validate(true));
        assert_eq!(text["priority"], vec!["The priority must be an integer"]);

        let fraction = failures(request(json!({"title": "a", "priority": 2.5})).validate(true));
        assert_eq!(fraction["priority"], vec!["The priority must be an integer"]);
    }
}
