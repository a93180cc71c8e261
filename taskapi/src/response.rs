use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use querykit::PaginatedResult;
use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_MESSAGE: &str = "Operation successful";

/// Paging numbers attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

impl<T> From<&PaginatedResult<T>> for PageMeta {
    fn from(result: &PaginatedResult<T>) -> Self {
        Self {
            total: result.total,
            page: result.page,
            per_page: result.per_page,
            last_page: result.last_page,
        }
    }
}

/// Success envelope: `{"success": true, "message", "data", "meta"?}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    #[serde(skip)]
    status: StatusCode,
    #[serde(skip)]
    headers: HeaderMap,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            meta: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::ok(data, message).with_status(StatusCode::CREATED)
    }

    /// `data: null`, as after a delete or a password change.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            meta: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// One page of a listing, with `meta` and a `Content-Range` header.
    pub fn page(result: PaginatedResult<T>, resource: &str) -> Self {
        let meta = PageMeta::from(&result);
        let headers = result.content_range(resource);
        Self {
            success: true,
            message: DEFAULT_MESSAGE.to_owned(),
            data: Some(result.items),
            meta: Some(meta),
            status: StatusCode::OK,
            headers,
        }
    }
}

/// Documents the `data: null` envelope of [`ApiResponse::message`].
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Always `true`
    pub success: bool,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<()>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(mut self) -> Response {
        let status = self.status;
        let headers = std::mem::take(&mut self.headers);
        (status, headers, Json(self)).into_response()
    }
}
