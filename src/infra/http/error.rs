use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::{blogs::BlogError, error::ErrorReport, repos::RepoError};

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
}

/// JSON error for the `/api` surface. The public message is fixed; the
/// detail only reaches the logs through the attached [`ErrorReport`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    detail: String,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            detail: detail.into(),
        }
    }

    pub fn not_found(message: &'static str, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Timeout => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
                err.to_string(),
            ),
            RepoError::NotFound => Self::not_found("Resource not found", err.to_string()),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Failed to load blogs",
                other.to_string(),
            ),
        }
    }
}

impl From<BlogError> for ApiError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::NotFound(slug) => {
                Self::not_found("Blog not found", format!("no blog with slug `{slug}`"))
            }
            BlogError::Repo(repo) => repo.into(),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "Internal server error",
                other.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, self.detail),
        )
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_errors_map_to_codes() {
        let missing = ApiError::from(BlogError::NotFound("ghost".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), codes::NOT_FOUND);

        let timeout = ApiError::from(BlogError::Repo(RepoError::Timeout));
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.code(), codes::DB_TIMEOUT);

        let down = ApiError::from(BlogError::Repo(RepoError::from_persistence("refused")));
        assert_eq!(down.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(down.code(), codes::REPO);

        let stalled = ApiError::from(BlogError::Stalled { offset: 10 });
        assert_eq!(stalled.code(), codes::INTERNAL);
    }

    #[test]
    fn response_hides_detail_but_reports_it() {
        let response =
            ApiError::from(BlogError::Repo(RepoError::from_persistence("refused"))).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("error report attached");
        assert_eq!(report.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(report.messages[0].starts_with("repo_error: "));
        assert!(report.messages[0].contains("refused"));
    }
}
