use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// The raw bearer credential of a request, if one was presented.
///
/// Extraction never fails: handlers validate their input first and then hand this to
/// [`AppState::identify`](crate::state::AppState::identify), which rejects a missing token.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    fn parse(header: &str) -> Option<String> {
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }
        Some(token.to_owned())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(BearerToken::parse);
        Ok(BearerToken(token))
    }
}
