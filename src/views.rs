//! Thin server-side HTML rendering. Pages are assembled with `format!`
//! around a shared shell; anything fancier is out of scope here.

use axum::response::Html;
use time::macros::format_description;

use crate::inventory::repo::{HistoryEntry, Product};

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head><meta charset=\"utf-8\">\
         <title>{title} - Controle de Estoque</title></head>\n<body>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>"
    ))
}

fn nav() -> &'static str {
    "<p><a href=\"/estoque\">Estoque</a> | <a href=\"/historico\">Histórico</a> | \
     <a href=\"/cadastrar_produto\">Cadastrar produto</a> | \
     <a href=\"/logout\">Sair</a></p>"
}

/// Minimal HTML escaping for user-supplied text.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn notice_line(notice: Option<&str>) -> String {
    match notice {
        Some(text) => format!("<p><em>{}</em></p>", escape(text)),
        None => String::new(),
    }
}

pub fn login_page(error: bool) -> Html<String> {
    let flash = if error {
        "<p><em>Usuário ou senha incorretos</em></p>"
    } else {
        ""
    };
    page(
        "Login",
        &format!(
            "{flash}<form method=\"post\" action=\"/login\">\n\
             <label>Usuário <input type=\"text\" name=\"username\" required></label><br>\n\
             <label>Senha <input type=\"password\" name=\"password\" required></label><br>\n\
             <button type=\"submit\">Entrar</button>\n</form>"
        ),
    )
}

pub fn stock_page(products: &[Product], notice: Option<&str>) -> Html<String> {
    let mut rows = String::new();
    for p in products {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td>\
             <td><a href=\"/retirada/{}\">Retirar</a></td></tr>\n",
            escape(&p.name),
            p.quantity,
            p.id
        ));
    }
    page(
        "Estoque",
        &format!(
            "{}{}<table border=\"1\">\n\
             <tr><th>Produto</th><th>Quantidade</th><th></th></tr>\n{rows}</table>",
            nav(),
            notice_line(notice)
        ),
    )
}

pub fn withdrawal_page(product: &Product, error: bool) -> Html<String> {
    let flash = if error {
        "<p><em>Quantidade inválida</em></p>"
    } else {
        ""
    };
    page(
        "Retirada",
        &format!(
            "{}{flash}<p>{} — {} em estoque</p>\n\
             <form method=\"post\" action=\"/retirada/{}\">\n\
             <label>Quantidade <input type=\"number\" name=\"quantidade\" min=\"1\" required></label>\n\
             <button type=\"submit\">Retirar</button>\n</form>",
            nav(),
            escape(&product.name),
            product.quantity,
            product.id
        ),
    )
}

pub fn history_page(entries: &[HistoryEntry]) -> Html<String> {
    let ts = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    let mut rows = String::new();
    for e in entries {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            e.created_at.format(&ts).unwrap_or_default(),
            escape(&e.user_name),
            escape(&e.product_name),
            e.quantity
        ));
    }
    page(
        "Histórico",
        &format!(
            "{}<table border=\"1\">\n\
             <tr><th>Data</th><th>Usuário</th><th>Produto</th><th>Quantidade</th></tr>\n\
             {rows}</table>",
            nav()
        ),
    )
}

pub fn register_page(error: bool) -> Html<String> {
    let flash = if error {
        "<p><em>Dados inválidos</em></p>"
    } else {
        ""
    };
    page(
        "Cadastrar produto",
        &format!(
            "{}{flash}<form method=\"post\" action=\"/cadastrar_produto\">\n\
             <label>Nome <input type=\"text\" name=\"nome\" required></label><br>\n\
             <label>Quantidade <input type=\"number\" name=\"quantidade\" min=\"0\" required></label><br>\n\
             <button type=\"submit\">Cadastrar</button>\n</form>",
            nav()
        ),
    )
}

pub fn not_found_page() -> Html<String> {
    page(
        "Não encontrado",
        "<p>Produto não encontrado.</p><p><a href=\"/estoque\">Voltar ao estoque</a></p>",
    )
}
