use std::sync::Arc;

use arbor_shared::constants::MAX_MESSAGE_SIZE;
use arbor_shared::protocol::{
    CommentDto, CommentMessage, DeletedComment, LikeToggled, NewComment, PostDetail, PostSummary,
};
use arbor_shared::{PostId, UserId};
use arbor_store::Database;
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, DefaultBodyLimit, Path, State},
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::identity::Actor;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<ServerConfig>,
    /// Resolved from `config.default_user` at startup.
    pub default_actor: Option<UserId>,
}

pub fn build_router(state: AppState) -> Router {
    let origin = match state
        .config
        .client_url
        .as_deref()
        .and_then(|url| HeaderValue::from_str(url).ok())
    {
        Some(url) => AllowOrigin::exact(url),
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/posts", get(list_posts))
        .route("/posts/:post_id", get(get_post))
        .route("/posts/:post_id/comments", post(create_comment))
        .route(
            "/posts/:post_id/comments/:comment_id",
            put(update_comment).delete(delete_comment),
        )
        .route(
            "/posts/:post_id/comments/:comment_id/toggleLike",
            post(toggle_like),
        )
        .layer(DefaultBodyLimit::max(MAX_MESSAGE_SIZE * 2))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostSummary>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_posts()?))
}

async fn get_post(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PostId>, PathRejection>,
) -> Result<Json<PostDetail>, ServerError> {
    let Path(post_id) = path?;
    let db = state.db.lock().await;
    Ok(Json(db.get_post(post_id, actor.0)?))
}

async fn create_comment(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<PostId>, PathRejection>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> Result<Json<CommentDto>, ServerError> {
    let Path(post_id) = path?;
    let Json(new) = body?;

    let mut db = state.db.lock().await;
    let comment = db.create_comment(post_id, actor.0, &new)?;
    info!(post = %post_id, comment = %comment.id, actor = %actor.0, "comment created");
    Ok(Json(comment))
}

async fn update_comment(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<(PostId, Uuid)>, PathRejection>,
    body: Result<Json<CommentMessage>, JsonRejection>,
) -> Result<Json<CommentMessage>, ServerError> {
    let Path((post_id, comment_id)) = path?;
    let Json(update) = body?;

    let mut db = state.db.lock().await;
    let stored = db.update_comment(actor.0, post_id, comment_id, &update.message)?;
    info!(post = %post_id, comment = %comment_id, "comment updated");
    Ok(Json(stored))
}

async fn delete_comment(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<(PostId, Uuid)>, PathRejection>,
) -> Result<Json<DeletedComment>, ServerError> {
    let Path((post_id, comment_id)) = path?;

    let mut db = state.db.lock().await;
    let deleted = db.delete_comment(actor.0, post_id, comment_id)?;
    info!(post = %post_id, comment = %comment_id, "comment deleted");
    Ok(Json(deleted))
}

async fn toggle_like(
    State(state): State<AppState>,
    actor: Actor,
    path: Result<Path<(PostId, Uuid)>, PathRejection>,
) -> Result<Json<LikeToggled>, ServerError> {
    let Path((post_id, comment_id)) = path?;

    let mut db = state.db.lock().await;
    let liked = db.toggle_like(actor.0, post_id, comment_id)?;
    Ok(Json(LikeToggled { liked }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
