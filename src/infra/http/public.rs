use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use folio_api_types::{BlogDetail, BlogsPage};

use crate::application::{blogs::BlogService, error::ErrorReport, pagination::PageWindow};

use super::{
    error::ApiError,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub blogs: Arc<BlogService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/blogs", get(list_blogs))
        .route("/api/blogs/{slug}", get(blog_detail))
        .route("/_health/db", get(db_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Raw `cursor` and `limit` values. A repeated key keeps its first value.
#[derive(Debug, Default, PartialEq, Eq)]
struct PagingParams {
    cursor: Option<String>,
    limit: Option<String>,
}

impl PagingParams {
    fn parse(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "cursor" if params.cursor.is_none() => params.cursor = Some(value.into_owned()),
                "limit" if params.limit.is_none() => params.limit = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

async fn list_blogs(
    State(state): State<HttpState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = PagingParams::parse(query.as_deref());
    let window = PageWindow::from_query(params.cursor.as_deref(), params.limit.as_deref());
    let page: BlogsPage = state.blogs.list_page(window).await?;

    let mut response = Json(page).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

async fn blog_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogDetail>, ApiError> {
    let detail = state.blogs.detail(&slug).await?;
    Ok(Json(detail))
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match state.blogs.health().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
