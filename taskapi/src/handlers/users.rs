use axum::extract::State;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthUser, password};
use crate::entities::user;
use crate::errors::{ApiError, ErrorResponse};
use crate::response::{ApiResponse, MessageResponse};
use crate::state::AppState;
use crate::validation::{AppJson, ValidationErrors, rules, sanitize_opt, validators::is_blank};

pub const EMAIL_TAKEN: &str = "This email is already registered.";

/// A user as clients see it; the password hash never leaves the server.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(as = User)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    /// Left unchanged when omitted.
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    pub current_password: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// Whether a user other than `except` already uses `email`.
async fn email_taken(state: &AppState, email: &str, except: i32) -> Result<bool, ApiError> {
    let count = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .filter(user::Column::Id.ne(except))
        .count(&state.db)
        .await?;
    Ok(count > 0)
}

#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse)
    ),
    summary = "Show profile"
)]
pub async fn profile(auth: AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(auth.user.into(), "Profile obtained successfully")
}

#[utoipa::path(
    put,
    path = "/users/profile",
    tag = "users",
    security(("bearer" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    summary = "Update profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let name = sanitize_opt(request.name);
    let email = sanitize_opt(request.email).filter(|email| !email.is_empty());

    let mut errors = ValidationErrors::new();
    rules::name(&mut errors, name.as_deref(), true);
    rules::email(&mut errors, email.as_deref(), false);
    if let Some(email) = email.as_deref()
        && !errors.has("email")
        && email_taken(&state, email, auth.user.id).await?
    {
        errors.add("email", EMAIL_TAKEN);
    }
    errors.result()?;

    let user_id = auth.user.id;
    let mut active: user::ActiveModel = auth.user.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id, "profile updated");
    Ok(ApiResponse::ok(updated.into(), "Profile updated successfully"))
}

#[utoipa::path(
    put,
    path = "/users/password",
    tag = "users",
    security(("bearer" = [])),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    summary = "Change password"
)]
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<UpdatePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let mut errors = ValidationErrors::new();
    let current = request.current_password.as_deref();
    if is_blank(current) {
        errors.add("current_password", "The current password is mandatory.");
    } else if let Some(current) = current
        && !password::verify(current, &auth.user.password_hash).await?
    {
        errors.add("current_password", "The current password is incorrect.");
    }
    rules::password(
        &mut errors,
        request.password.as_deref(),
        Some(request.password_confirmation.as_deref()),
        "The new password is mandatory.",
    );
    errors.result()?;

    let Some(new_password) = request.password else {
        return Err(ApiError::field("password", "The new password is mandatory."));
    };
    let user_id = auth.user.id;
    let mut active: user::ActiveModel = auth.user.into();
    active.password_hash = Set(password::hash(&new_password).await?);
    active.update(&state.db).await?;

    tracing::info!(user_id, "password changed");
    Ok(ApiResponse::message("Password updated successfully"))
}
