//! Server-side session store. Tokens are opaque random strings mapped to
//! user ids; the browser only ever holds the token in an HttpOnly cookie,
//! and logout revokes it server-side.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<String, i64>>>,
}

impl Sessions {
    pub async fn create(&self, user_id: i64) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.inner.write().await.insert(token.clone(), user_id);
        debug!(user_id, "session created");
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<i64> {
        self.inner.read().await.get(token).copied()
    }

    pub async fn revoke(&self, token: &str) {
        if self.inner.write().await.remove(token).is_some() {
            debug!("session revoked");
        }
    }
}

/// Pulls the session token out of a Cookie header value.
pub fn session_token(cookies: &str) -> Option<&str> {
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix("session="))
        .filter(|t| !t.is_empty())
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// Extracts the authenticated user's id from the session cookie. Every
/// guarded handler takes this; the rejection redirects to `/login`.
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(session_token)
            .ok_or(AppError::Unauthenticated)?;

        match state.sessions.resolve(token).await {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => Err(AppError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn create_resolve_revoke_lifecycle() {
        let sessions = Sessions::default();
        let token = sessions.create(7).await;
        assert_eq!(sessions.resolve(&token).await, Some(7));
        sessions.revoke(&token).await;
        assert_eq!(sessions.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn tokens_are_unique_per_session() {
        let sessions = Sessions::default();
        let a = sessions.create(1).await;
        let b = sessions.create(1).await;
        assert_ne!(a, b);
    }

    #[test]
    fn session_token_parses_cookie_header() {
        assert_eq!(session_token("session=abc123"), Some("abc123"));
        assert_eq!(session_token("theme=dark; session=abc123"), Some("abc123"));
        assert_eq!(session_token("session="), None);
        assert_eq!(session_token("other=1"), None);
    }

    async fn extract(state: &AppState, cookie: Option<&str>) -> Result<i64, AppError> {
        let mut builder = Request::builder().uri("/estoque");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        let (mut parts, _) = builder.body(()).expect("request").into_parts();
        AuthUser::from_request_parts(&mut parts, state)
            .await
            .map(|AuthUser(id)| id)
    }

    #[tokio::test]
    async fn extractor_rejects_missing_and_stale_cookies() {
        let state = crate::state::test_state().await;
        assert!(extract(&state, None).await.is_err());
        assert!(extract(&state, Some("session=stale")).await.is_err());
    }

    #[tokio::test]
    async fn extractor_resolves_live_session() {
        let state = crate::state::test_state().await;
        let token = state.sessions.create(42).await;
        let cookie = format!("session={token}");
        assert_eq!(extract(&state, Some(&cookie)).await.expect("auth"), 42);
    }
}
