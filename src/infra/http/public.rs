use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::info;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        feed::{FeedError, FeedService},
    },
    infra::db::PostgresRepositories,
    presentation::views::{
        ContactsTemplate, ErrorTemplate, IndexTemplate, PostDetailTemplate, PostsListTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub db: PostgresRepositories,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/page/{page}", get(index_page))
        .route("/tag/{slug}", get(tag_index))
        .route("/post/{slug}", get(post_detail))
        .route("/contacts", get(contacts))
        .route("/_health/db", get(db_health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Bind and run the public server until ctrl-c.
pub async fn serve(router: Router, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "public server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
    }
}

async fn index(State(state): State<HttpState>) -> Response {
    render_home(state, 1).await
}

async fn index_page(State(state): State<HttpState>, Path(page): Path<usize>) -> Response {
    render_home(state, page).await
}

async fn render_home(state: HttpState, page: usize) -> Response {
    match state.feed.home_page(page).await {
        Ok(context) => {
            render_template_response(IndexTemplate { page: context }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn tag_index(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    match state.feed.tag_page(&slug).await {
        Ok(context) => {
            render_template_response(PostsListTemplate { page: context }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    match state.feed.post_detail(&slug).await {
        Ok(context) => {
            render_template_response(PostDetailTemplate::new(context), StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn contacts() -> Response {
    render_template_response(ContactsTemplate, StatusCode::OK)
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => HttpError::from_error(
            "infra::http::db_health",
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
            &err,
        )
        .into_response(),
    }
}

async fn fallback() -> Response {
    render_not_found_response("No route matched the request path")
}

/// Unknown slugs render the 404 page; everything else is a 500 with the
/// diagnostic report attached for the logging middleware.
fn feed_error_to_response(err: FeedError) -> Response {
    match err {
        FeedError::UnknownTag => render_not_found_response("Tag slug not found"),
        FeedError::UnknownPost => render_not_found_response("Post slug not found"),
        FeedError::Repo(repo_err) => {
            let mut response = render_template_response(
                ErrorTemplate {
                    status: 500,
                    message: "Something went wrong",
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            );
            ErrorReport::from_error(
                "infra::http::feed_error_to_response",
                StatusCode::INTERNAL_SERVER_ERROR,
                &repo_err,
            )
            .attach(&mut response);
            response
        }
    }
}
