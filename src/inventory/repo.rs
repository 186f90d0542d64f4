use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
}

/// One stock deduction. Rows are append-only; nothing updates or deletes them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: OffsetDateTime,
}

/// Withdrawal joined with the acting user and product names for display.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub created_at: OffsetDateTime,
}

impl Product {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Duplicate names are allowed; there is deliberately no uniqueness rule.
    pub async fn create(db: &SqlitePool, name: &str, quantity: i64) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, quantity)
            VALUES (?, ?)
            RETURNING id, name, quantity
            "#,
        )
        .bind(name)
        .bind(quantity)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}

/// Applies a withdrawal: decrements the product's quantity-on-hand and
/// appends the history row in one transaction.
///
/// The decrement is conditional on `quantity >= ?`, so a concurrent
/// withdrawal that drained the stock first makes this one fail with
/// `InvalidQuantity` instead of driving the count negative.
pub async fn withdraw(
    db: &SqlitePool,
    user_id: i64,
    product_id: i64,
    quantity: i64,
) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::InvalidQuantity);
    }

    let mut tx = db.begin().await?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, quantity
        FROM products
        WHERE id = ?
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound)?;

    if quantity > product.quantity {
        return Err(AppError::InvalidQuantity);
    }

    let updated = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - ?
        WHERE id = ? AND quantity >= ?
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        // Lost the race against a concurrent withdrawal.
        return Err(AppError::InvalidQuantity);
    }

    sqlx::query(
        r#"
        INSERT INTO withdrawals (user_id, product_id, quantity, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(OffsetDateTime::now_utc())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Full withdrawal history, newest first.
pub async fn list_history(db: &SqlitePool) -> Result<Vec<HistoryEntry>, AppError> {
    let rows = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT w.id, u.name AS user_name, p.name AS product_name,
               w.quantity, w.created_at
        FROM withdrawals w
        JOIN users u ON u.id = w.user_id
        JOIN products p ON p.id = w.product_id
        ORDER BY w.created_at DESC, w.id DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
