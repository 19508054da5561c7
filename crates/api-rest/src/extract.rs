//! Identity extraction.
//!
//! Handlers take a [`Caller`] argument; the bearer token is resolved once
//! here and the resulting [`Identity`] is passed down explicitly. A missing
//! or invalid token extracts as `Identity::Anonymous` rather than rejecting,
//! so listing endpoints can fail closed while mutations decide for
//! themselves.

use crate::error::ApiError;
use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use healthvault_core::{identity, Identity};

pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let identity = identity::resolve_bearer(&state.pool, &state.cfg, header).await?;
        Ok(Caller(identity))
    }
}
