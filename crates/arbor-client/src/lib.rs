//! # arbor-client
//!
//! [`CommentBackend`] over the Arbor HTTP API. Every request carries the
//! backend's actor in the `x-actor-id` header; non-success responses are
//! mapped onto [`RemoteError`] by status code.

use arbor_shared::constants::ACTOR_HEADER;
use arbor_shared::protocol::{
    CommentDto, CommentMessage, DeletedComment, ErrorBody, LikeToggled, NewComment, PostDetail,
    PostSummary,
};
use arbor_shared::{CommentBackend, PostId, RemoteError, UserId};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    actor: UserId,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, actor: UserId) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, actor)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, actor: UserId) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            actor,
        }
    }

    /// Same server and connection pool, different actor.
    pub fn as_actor(&self, actor: UserId) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            actor,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn comment_url(&self, post_id: PostId, comment_id: Uuid) -> String {
        self.url(&format!("/posts/{post_id}/comments/{comment_id}"))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request
            .header(ACTOR_HEADER, self.actor.to_string())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, body = %body, "request refused");
            return Err(status_error(status, &body));
        }

        response.json::<T>().await.map_err(transport_error)
    }
}

impl CommentBackend for HttpBackend {
    fn actor(&self) -> UserId {
        self.actor
    }

    async fn list_posts(&self) -> Result<Vec<PostSummary>, RemoteError> {
        self.send(self.client.get(self.url("/posts"))).await
    }

    async fn get_post(&self, post_id: PostId) -> Result<PostDetail, RemoteError> {
        self.send(self.client.get(self.url(&format!("/posts/{post_id}"))))
            .await
    }

    async fn create_comment(&self, post_id: PostId, comment: &NewComment) -> Result<CommentDto, RemoteError> {
        let url = self.url(&format!("/posts/{post_id}/comments"));
        self.send(self.client.post(url).json(comment)).await
    }

    async fn update_comment(
        &self,
        post_id: PostId,
        comment_id: Uuid,
        message: &str,
    ) -> Result<CommentMessage, RemoteError> {
        let body = CommentMessage {
            message: message.to_string(),
        };
        self.send(self.client.put(self.comment_url(post_id, comment_id)).json(&body))
            .await
    }

    async fn delete_comment(&self, post_id: PostId, comment_id: Uuid) -> Result<DeletedComment, RemoteError> {
        self.send(self.client.delete(self.comment_url(post_id, comment_id)))
            .await
    }

    async fn toggle_like(&self, post_id: PostId, comment_id: Uuid) -> Result<LikeToggled, RemoteError> {
        let url = format!("{}/toggleLike", self.comment_url(post_id, comment_id));
        self.send(self.client.post(url)).await
    }
}

/// Map a refused response onto the boundary taxonomy, keeping the server's
/// `{"error": ...}` message when there is one.
fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());

    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(message),
        s if s.is_client_error() => RemoteError::InvalidInput(message),
        _ => RemoteError::Unavailable(message),
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(err.to_string())
}
