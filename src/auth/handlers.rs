use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        password::{dummy_hash, verify_password},
        repo::User,
        sessions::{clear_session_cookie, session_cookie, session_token, AuthUser},
    },
    error::AppError,
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", get(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

async fn index() -> Redirect {
    Redirect::to("/login")
}

async fn login_form(Query(q): Query<LoginQuery>) -> Html<String> {
    views::login_page(q.error.is_some())
}

#[instrument(skip(state, form))]
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = User::find_by_username(&state.db, form.username.trim()).await?;

    // Unknown username still pays for a verification so the two failure
    // cases are indistinguishable, in timing as well as in output.
    let verified = match &user {
        Some(u) => verify_password(&form.password, &u.password_hash).unwrap_or(false),
        None => {
            let _ = verify_password(&form.password, dummy_hash());
            false
        }
    };

    match user {
        Some(user) if verified => {
            let token = state.sessions.create(user.id).await;
            info!(user_id = user.id, "login succeeded");
            Ok((
                AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
                Redirect::to("/estoque"),
            )
                .into_response())
        }
        _ => {
            warn!("login failed");
            Err(AppError::InvalidCredentials)
        }
    }
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token)
    {
        state.sessions.revoke(token).await;
    }
    info!(user_id, "logged out");
    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/login"),
    )
}
