use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::views;

/// Request-level failures. Domain variants are recovered at the handlers
/// (re-rendered form or redirect); storage failures become a generic 500
/// without detail leaking to the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not found")]
    NotFound,
    #[error("invalid quantity")]
    InvalidQuantity,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidCredentials => Redirect::to("/login?error=1").into_response(),
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            AppError::NotFound => (StatusCode::NOT_FOUND, views::not_found_page()).into_response(),
            AppError::InvalidQuantity => {
                (StatusCode::BAD_REQUEST, "Quantidade inválida").into_response()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Falha interna, tente novamente",
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_do_not_leak_detail() {
        let resp = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let resp = AppError::Unauthenticated.into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/login");
    }
}
