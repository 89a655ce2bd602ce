use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::info;

use crate::auth::password::hash_password;
use crate::config::AdminBootstrapConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

/// User record in the database. `pelanggan_id` links a USER account to the
/// single customer whose invoices it may see; ADMIN accounts carry none.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub pelanggan_id: Option<i64>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, pelanggan_id, is_active, created_at, updated_at";

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_password(db: &PgPool, id: i64, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = now()
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }
}

/// Stores a fresh single-use reset token. A user may hold several
/// outstanding tokens; each is redeemed independently.
pub async fn insert_reset_token(
    db: &PgPool,
    user_id: i64,
    token: &str,
    expires_at: OffsetDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (user_id, token, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Redeems a reset token and returns its user id. The conditional UPDATE is
/// the whole consumption step, so concurrent requests can redeem a given
/// token at most once; expired or already-consumed tokens yield `None`.
pub async fn consume_reset_token(db: &PgPool, token: &str) -> anyhow::Result<Option<i64>> {
    let user_id: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE password_reset_tokens
        SET consumed_at = now()
        WHERE token = $1 AND consumed_at IS NULL AND expires_at > now()
        RETURNING user_id
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;
    Ok(user_id.map(|(id,)| id))
}

/// Idempotent startup step: creates the configured admin account only when
/// its username is absent.
pub async fn ensure_default_admin(db: &PgPool, admin: &AdminBootstrapConfig) -> anyhow::Result<()> {
    if User::find_by_username(db, &admin.username).await?.is_some() {
        return Ok(());
    }
    let hash = hash_password(&admin.password)?;
    let user = User::create(db, &admin.username, &admin.email, &hash, Role::Admin).await?;
    info!(user_id = user.id, username = %user.username, "default admin created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_in_wire_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"USER\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn user_json_never_contains_password_hash() {
        let user = User {
            id: 1,
            username: "budi".into(),
            email: "budi@example.com".into(),
            password_hash: "secret-hash".into(),
            role: Role::User,
            pelanggan_id: Some(7),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("budi"));
    }
}
