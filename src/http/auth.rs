//! Bearer-token extractor for admin routes.

use super::{parse_slug, ApiError, AppState};
use crate::model::Slug;
use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

/// A live admin session, taken from `Authorization: Bearer <token>`.
///
/// Event streams may pass the token as `?access_token=` instead, since browsers cannot set
/// headers on an `EventSource`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
    pub restaurant: Slug,
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

impl AdminSession {
    /// Checks that the session belongs to the restaurant named in the path.
    pub fn authorize(&self, raw_slug: &str) -> Result<Slug, ApiError> {
        let slug = parse_slug(raw_slug)?;
        if slug != self.restaurant {
            return Err(ApiError::Forbidden(format!(
                "session is not valid for {slug}"
            )));
        }
        Ok(slug)
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| {
                Query::<TokenQuery>::try_from_uri(&parts.uri)
                    .ok()
                    .and_then(|Query(q)| q.access_token)
            })
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

        let session = state
            .sessions
            .validate(&token)
            .ok_or_else(|| ApiError::Unauthorized("invalid or expired session".into()))?;
        Ok(AdminSession {
            token,
            restaurant: session.restaurant,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}
