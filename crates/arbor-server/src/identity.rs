//! Asserted identity: the acting user is read from the `x-actor-id` header
//! and falls back to the configured default user. Nothing is verified beyond
//! the user existing.

use arbor_shared::constants::ACTOR_HEADER;
use arbor_shared::UserId;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::AppState;
use crate::error::ServerError;

/// The user a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let asserted = match parts.headers.get(ACTOR_HEADER) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| ServerError::Unauthorized("Invalid actor header".into()))?;
                let id: UserId = raw
                    .parse()
                    .map_err(|_| ServerError::Unauthorized(format!("Invalid actor id '{raw}'")))?;
                Some(id)
            }
            None => None,
        };

        let Some(id) = asserted.or(state.default_actor) else {
            return Err(ServerError::Unauthorized("No actor".into()));
        };

        let db = state.db.lock().await;
        match db.get_user(id) {
            Ok(_) => Ok(Actor(id)),
            Err(arbor_store::StoreError::NotFound(_)) => {
                Err(ServerError::Unauthorized(format!("Unknown actor {id}")))
            }
            Err(other) => Err(other.into()),
        }
    }
}
