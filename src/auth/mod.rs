use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod password;
pub mod repo;
pub mod sessions;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
