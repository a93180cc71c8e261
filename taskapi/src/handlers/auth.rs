use axum::extract::State;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::{EMAIL_TAKEN, UserResponse};
use crate::auth::{AuthUser, password, tokens};
use crate::entities::user;
use crate::errors::{ApiError, ErrorResponse};
use crate::response::{ApiResponse, MessageResponse};
use crate::state::AppState;
use crate::validation::{AppJson, ValidationErrors, rules, sanitize_opt};

pub const BAD_CREDENTIALS: &str = "The provided credentials are incorrect.";

/// Login for a known email, registration for a new one.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AuthRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Required when registering.
    pub name: Option<String>,
    /// Required when registering.
    pub password_confirmation: Option<String>,
}

/// The user together with a freshly issued bearer token.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

struct Registration {
    name: String,
    email: String,
    password: String,
}

impl AuthRequest {
    fn validate_registration(self) -> Result<Registration, ApiError> {
        let name = sanitize_opt(self.name);
        let email = sanitize_opt(self.email);

        let mut errors = ValidationErrors::new();
        rules::name(&mut errors, name.as_deref(), true);
        rules::email(&mut errors, email.as_deref(), true);
        rules::password(
            &mut errors,
            self.password.as_deref(),
            Some(self.password_confirmation.as_deref()),
            "The password is mandatory.",
        );
        errors.result()?;

        match (name, email, self.password) {
            (Some(name), Some(email), Some(password)) => Ok(Registration {
                name,
                email,
                password,
            }),
            _ => Err(ApiError::bad_request("Incomplete registration")),
        }
    }
}

async fn register(state: &AppState, registration: Registration) -> Result<AuthResponse, ApiError> {
    let password_hash = password::hash(&registration.password).await?;

    let txn = state.db.begin().await?;
    let created = user::ActiveModel {
        name: Set(registration.name),
        email: Set(registration.email),
        password_hash: Set(password_hash),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| match ApiError::from(err) {
        ApiError::Conflict { .. } => ApiError::field("email", EMAIL_TAKEN),
        other => other,
    })?;
    let token = tokens::issue(&txn, created.id, &state.config.token_name).await?;
    txn.commit().await?;

    tracing::info!(user_id = created.id, email = %created.email, "user registered");
    Ok(AuthResponse {
        user: created.into(),
        token,
    })
}

#[utoipa::path(
    post,
    path = "/auth",
    tag = "auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthResponse>),
        (status = 201, description = "Registered and logged in", body = ApiResponse<AuthResponse>),
        (status = 422, description = "Validation error or wrong credentials", body = ErrorResponse)
    ),
    summary = "Log in or register",
    description = "Logs a known email in. An unknown email registers a new user, which needs `name` and `password_confirmation` as well."
)]
pub async fn authenticate(
    State(state): State<AppState>,
    AppJson(request): AppJson<AuthRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let email = sanitize_opt(request.email.clone()).unwrap_or_default();
    let existing = if email.is_empty() {
        None
    } else {
        user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&state.db)
            .await?
    };

    let Some(existing) = existing else {
        let registered = register(&state, request.validate_registration()?).await?;
        return Ok(ApiResponse::created(registered, "User registered successfully"));
    };

    let mut errors = ValidationErrors::new();
    if request.password.as_deref().is_none_or(str::is_empty) {
        errors.add("password", "The password is mandatory.");
    }
    errors.result()?;

    let attempt = request.password.unwrap_or_default();
    if !password::verify(&attempt, &existing.password_hash).await? {
        tracing::debug!(user_id = existing.id, "login rejected");
        return Err(ApiError::field("email", BAD_CREDENTIALS));
    }

    let token = tokens::issue(&state.db, existing.id, &state.config.token_name).await?;
    tracing::info!(user_id = existing.id, "user logged in");
    Ok(ApiResponse::ok(
        AuthResponse {
            user: existing.into(),
            token,
        },
        "User authenticated successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/auth",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The authenticated user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse)
    ),
    summary = "Current user"
)]
pub async fn current_user(auth: AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(auth.user.into(), "User obtained successfully")
}

#[utoipa::path(
    delete,
    path = "/auth",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Every token of the user revoked", body = MessageResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse)
    ),
    summary = "Log out"
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<()>, ApiError> {
    let revoked = tokens::revoke_all(&state.db, auth.user.id).await?;
    tracing::info!(user_id = auth.user.id, revoked, "user logged out");
    Ok(ApiResponse::message("Logged out successfully"))
}
