use axum::{Json, Router, middleware, routing::get};
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_scalar::{Scalar, Servable};

use crate::errors::ErrorResponse;
use crate::handlers::{auth, tasks, users};
use crate::rate_limit::rate_limit;
use crate::response::{MessageResponse, PageMeta};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

#[derive(OpenApi)]
#[openapi(
    info(title = "Task API", description = "Users and their tasks"),
    modifiers(&BearerAuth),
    components(schemas(ErrorResponse, MessageResponse, PageMeta)),
    tags(
        (name = "auth", description = "Log in, register and log out"),
        (name = "users", description = "The caller's profile"),
        (name = "tasks", description = "Tasks and their listing")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme the protected operations refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("opaque")
                    .build(),
            ),
        );
    }
}

fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::authenticate, auth::current_user, auth::logout))
        .routes(routes!(users::profile, users::update_profile))
        .routes(routes!(users::update_password))
        .routes(routes!(tasks::index, tasks::store))
        .routes(routes!(
            tasks::show,
            tasks::update,
            tasks::modify,
            tasks::destroy
        ))
}

/// The whole application: API under `/api/v1`, its OpenAPI document, the
/// Scalar UI at `/docs` and request tracing.
pub fn router(state: AppState) -> Router {
    let (mut api, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest(API_PREFIX, api_routes())
        .split_for_parts();

    if state.limiter.is_some() {
        api = api.layer(middleware::from_fn_with_state(state.clone(), rate_limit));
    }

    let document = Json(openapi.clone());
    api.with_state(state)
        .route(
            &format!("{API_PREFIX}/openapi.json"),
            get(move || async move { document }),
        )
        .merge(Scalar::with_url("/docs", openapi))
        .layer(TraceLayer::new_for_http())
}
