use sqlx::SqlitePool;
use tracing::info;

use crate::auth::{password::hash_password, repo::User};

pub const ADMIN_USERNAME: &str = "admin";
const ADMIN_NAME: &str = "Administrador";
// Default credential carried over from the reference system; rotate it in
// any deployment that matters.
const ADMIN_DEFAULT_PASSWORD: &str = "admin123";

/// Runs once before the server accepts traffic: schema, then the seed user.
pub async fn run(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(db).await?;
    ensure_admin(db).await
}

/// Creates the default administrator unless one already exists. Idempotent;
/// the UNIQUE constraint on username backs this up.
pub async fn ensure_admin(db: &SqlitePool) -> anyhow::Result<()> {
    if User::find_by_username(db, ADMIN_USERNAME).await?.is_none() {
        let hash = hash_password(ADMIN_DEFAULT_PASSWORD)?;
        let admin = User::create(db, ADMIN_NAME, ADMIN_USERNAME, &hash).await?;
        info!(user_id = admin.id, "default administrator account created");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::state::test_pool;

    #[tokio::test]
    async fn seeds_admin_with_hashed_default_password() {
        let db = test_pool().await;
        ensure_admin(&db).await.expect("bootstrap");

        let admin = User::find_by_username(&db, ADMIN_USERNAME)
            .await
            .expect("find")
            .expect("seeded");
        assert_eq!(admin.name, "Administrador");
        assert_ne!(admin.password_hash, "admin123");
        assert!(verify_password("admin123", &admin.password_hash).expect("verify"));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let db = test_pool().await;
        ensure_admin(&db).await.expect("first run");
        ensure_admin(&db).await.expect("second run");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(ADMIN_USERNAME)
            .fetch_one(&db)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
