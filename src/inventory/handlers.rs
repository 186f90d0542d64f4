use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::sessions::AuthUser,
    error::AppError,
    inventory::repo::{self, Product},
    state::AppState,
    views,
};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/estoque", get(list_stock))
        .route("/retirada/:product_id", get(withdrawal_form).post(withdrawal_submit))
        .route("/historico", get(history))
        .route("/cadastrar_produto", get(register_form).post(register_submit))
}

/// One-shot confirmation/error flags carried across redirects. Stands in
/// for session-backed flash messages; the codes map to fixed notices.
#[derive(Debug, Deserialize)]
pub struct Flash {
    pub notice: Option<String>,
    pub error: Option<String>,
}

fn notice_text(code: &str) -> Option<&'static str> {
    match code {
        "retirada" => Some("Retirada realizada com sucesso"),
        "cadastro" => Some("Produto cadastrado com sucesso"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalForm {
    pub quantidade: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub nome: String,
    pub quantidade: i64,
}

#[instrument(skip(state))]
pub async fn list_stock(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    let products = Product::list(&state.db).await?;
    let notice = flash.notice.as_deref().and_then(notice_text);
    Ok(views::stock_page(&products, notice))
}

#[instrument(skip(state))]
pub async fn withdrawal_form(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(product_id): Path<i64>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    let product = Product::get(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(views::withdrawal_page(&product, flash.error.is_some()))
}

#[instrument(skip(state, form))]
pub async fn withdrawal_submit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(product_id): Path<i64>,
    Form(form): Form<WithdrawalForm>,
) -> Result<Response, AppError> {
    match repo::withdraw(&state.db, user_id, product_id, form.quantidade).await {
        Ok(()) => {
            info!(user_id, product_id, quantity = form.quantidade, "withdrawal applied");
            Ok(Redirect::to("/estoque?notice=retirada").into_response())
        }
        Err(AppError::InvalidQuantity) => {
            warn!(user_id, product_id, quantity = form.quantidade, "withdrawal rejected");
            Ok(Redirect::to(&format!("/retirada/{product_id}?error=quantidade")).into_response())
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Html<String>, AppError> {
    let entries = repo::list_history(&state.db).await?;
    Ok(views::history_page(&entries))
}

async fn register_form(
    AuthUser(_user_id): AuthUser,
    Query(flash): Query<Flash>,
) -> Html<String> {
    views::register_page(flash.error.is_some())
}

#[instrument(skip(state, form))]
pub async fn register_submit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let name = form.nome.trim();
    if name.is_empty() || form.quantidade < 0 {
        warn!(user_id, "product registration rejected");
        return Ok(Redirect::to("/cadastrar_produto?error=1").into_response());
    }
    let product = Product::create(&state.db, name, form.quantidade).await?;
    info!(user_id, product_id = product.id, "product registered");
    Ok(Redirect::to("/estoque?notice=cadastro").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use crate::state::test_state;
    use axum::http::StatusCode;

    async fn seed_user(state: &AppState) -> User {
        User::create(&state.db, "Pessoa Teste", "teste", "hash")
            .await
            .expect("seed user")
    }

    #[tokio::test]
    async fn register_then_list_shows_the_product() {
        let state = test_state().await;
        let user = seed_user(&state).await;

        let resp = register_submit(
            State(state.clone()),
            AuthUser(user.id),
            Form(RegisterForm {
                nome: "Luvas".into(),
                quantidade: 10,
            }),
        )
        .await
        .expect("register")
        .into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/estoque?notice=cadastro");

        let Html(body) = list_stock(
            State(state.clone()),
            AuthUser(user.id),
            Query(Flash {
                notice: Some("cadastro".into()),
                error: None,
            }),
        )
        .await
        .expect("list");
        assert!(body.contains("Luvas"));
        assert!(body.contains("Produto cadastrado com sucesso"));
    }

    #[tokio::test]
    async fn register_rejects_blank_name_and_negative_quantity() {
        let state = test_state().await;
        let user = seed_user(&state).await;

        for form in [
            RegisterForm {
                nome: "   ".into(),
                quantidade: 1,
            },
            RegisterForm {
                nome: "Luvas".into(),
                quantidade: -1,
            },
        ] {
            let resp = register_submit(State(state.clone()), AuthUser(user.id), Form(form))
                .await
                .expect("handled")
                .into_response();
            assert_eq!(resp.headers()["location"], "/cadastrar_produto?error=1");
        }
        assert!(Product::list(&state.db).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn withdrawal_submit_redirects_by_outcome() {
        let state = test_state().await;
        let user = seed_user(&state).await;
        let product = Product::create(&state.db, "Luvas", 10)
            .await
            .expect("create");

        let ok = withdrawal_submit(
            State(state.clone()),
            AuthUser(user.id),
            Path(product.id),
            Form(WithdrawalForm { quantidade: 4 }),
        )
        .await
        .expect("withdraw")
        .into_response();
        assert_eq!(ok.headers()["location"], "/estoque?notice=retirada");

        let rejected = withdrawal_submit(
            State(state.clone()),
            AuthUser(user.id),
            Path(product.id),
            Form(WithdrawalForm { quantidade: 100 }),
        )
        .await
        .expect("handled")
        .into_response();
        assert_eq!(
            rejected.headers()["location"],
            format!("/retirada/{}?error=quantidade", product.id)
        );

        let after = Product::get(&state.db, product.id)
            .await
            .expect("get")
            .expect("some");
        assert_eq!(after.quantity, 6);
    }

    #[tokio::test]
    async fn withdrawal_form_404s_on_missing_product() {
        let state = test_state().await;
        let user = seed_user(&state).await;
        let err = withdrawal_form(
            State(state.clone()),
            AuthUser(user.id),
            Path(999),
            Query(Flash {
                notice: None,
                error: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
