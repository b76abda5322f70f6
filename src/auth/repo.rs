use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Never serialized directly; responses go
/// through `UserSnapshot` so the hash and token cannot leak.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub newsletter_subscribed: bool,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
    pub is_active: bool,
}

/// Insert payload; normalization (trim, lowercase, digit stripping) happens
/// before this is built.
#[derive(Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub verification_token: String,
    pub newsletter_subscribed: bool,
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone, password_hash, is_verified, \
     verification_token, newsletter_subscribed, created_at, last_login, is_active";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await
    }

    /// Duplicate pre-check for registration; matches either column.
    pub async fn find_by_email_or_phone(
        db: &PgPool,
        email: &str,
        phone: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR phone = $2");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(phone)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_verification_token(
        db: &PgPool,
        token: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE verification_token = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Single INSERT; a unique violation on email or phone is the loser of a
    /// registration race and is translated to a conflict by the caller.
    pub async fn create(db: &PgPool, new: &NewUser) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users \
                 (first_name, last_name, email, phone, password_hash, verification_token, newsletter_subscribed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.password_hash)
            .bind(&new.verification_token)
            .bind(new.newsletter_subscribed)
            .fetch_one(db)
            .await
    }

    /// Consume the verification token: flag the user and null the token so a
    /// second attempt with the same token finds nothing.
    pub async fn mark_verified(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_verified = TRUE, verification_token = NULL WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn touch_last_login(db: &PgPool, id: Uuid) -> Result<OffsetDateTime, sqlx::Error> {
        sqlx::query_scalar::<_, OffsetDateTime>(
            "UPDATE users SET last_login = now() WHERE id = $1 RETURNING last_login",
        )
        .bind(id)
        .fetch_one(db)
        .await
    }
}
