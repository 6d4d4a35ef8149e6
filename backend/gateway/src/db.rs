//! Database layer: pool setup, migrations and account queries.

use std::str::FromStr;

use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;
use trip_protocol::{TravelDna, TravelPace};

use crate::errors::{GatewayError, Result};

/// Provider tag for accounts created through the credential endpoints.
pub const EMAIL_PROVIDER: &str = "Email";

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    init_pool_with(database_url, 5).await
}

/// Same as [`init_pool`] with an explicit pool size. In-memory databases need `1`,
/// since every connection would otherwise get its own empty database.
pub async fn init_pool_with(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Make sure the file is created if it doesn't exist yet.
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────

/// An account row as stored in / read from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRecord {
    pub id: String,
    pub user_id: String,
    pub password_hash: String,
    pub provider: String,
    pub is_verified: bool,
    pub verification_document_name: Option<String>,
    pub verification_document_mime_type: Option<String>,
    pub verification_document_size: Option<f64>,
    pub verification_uploaded_at: Option<i64>,
    pub social_energy: Option<f64>,
    pub budget_range: Option<f64>,
    pub pace: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AccountRecord {
    /// The traveller's DNA, present once onboarding has been completed.
    pub fn travel_dna(&self) -> Result<Option<TravelDna>> {
        match (self.social_energy, self.budget_range, self.pace.as_deref()) {
            (Some(social_energy), Some(budget_range), Some(pace)) => {
                let pace = TravelPace::parse(pace).ok_or_else(|| {
                    GatewayError::CorruptRecord(format!("account {} has pace {pace:?}", self.id))
                })?;
                Ok(Some(TravelDna {
                    social_energy,
                    budget_range,
                    pace,
                }))
            }
            _ => Ok(None),
        }
    }
}

/// Verification document metadata. The document bytes are never stored.
#[derive(Debug, Clone)]
pub struct VerificationDocument {
    pub name: String,
    pub mime_type: String,
    pub size: f64,
}

const ACCOUNT_COLUMNS: &str = r#"
    id, user_id, password_hash, provider, is_verified,
    verification_document_name, verification_document_mime_type,
    verification_document_size, verification_uploaded_at,
    social_energy, budget_range, pace, created_at, updated_at
"#;

// ─────────────────────────────────────────────────────────
// Account writes
// ─────────────────────────────────────────────────────────

/// Insert a new email account and return its generated id.
///
/// A duplicate `user_id` surfaces as a unique-constraint [`sqlx::Error`];
/// see [`is_unique_violation`].
pub async fn insert_account(
    pool: &SqlitePool,
    user_id: &str,
    password_hash: &str,
) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO accounts (id, user_id, password_hash, provider, is_verified, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(password_hash)
    .bind(EMAIL_PROVIDER)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Mark an account verified and record the document metadata.
/// Returns `false` when no account has that id.
pub async fn mark_verified(
    pool: &SqlitePool,
    account_id: &str,
    document: &VerificationDocument,
) -> Result<bool> {
    let now = Utc::now().timestamp();
    let rows_affected = sqlx::query(
        r#"
        UPDATE accounts
        SET    is_verified = 1,
               verification_document_name = ?2,
               verification_document_mime_type = ?3,
               verification_document_size = ?4,
               verification_uploaded_at = ?5,
               updated_at = ?5
        WHERE  id = ?1
        "#,
    )
    .bind(account_id)
    .bind(&document.name)
    .bind(&document.mime_type)
    .bind(document.size)
    .bind(now)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

/// Store the traveller's onboarding DNA. Returns `false` when no account has that id.
pub async fn save_travel_dna(pool: &SqlitePool, account_id: &str, dna: &TravelDna) -> Result<bool> {
    let rows_affected = sqlx::query(
        r#"
        UPDATE accounts
        SET    social_energy = ?2, budget_range = ?3, pace = ?4, updated_at = ?5
        WHERE  id = ?1
        "#,
    )
    .bind(account_id)
    .bind(dna.social_energy)
    .bind(dna.budget_range)
    .bind(dna.pace.as_str())
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

// ─────────────────────────────────────────────────────────
// Account reads
// ─────────────────────────────────────────────────────────

pub async fn find_by_user_id(pool: &SqlitePool, user_id: &str) -> Result<Option<AccountRecord>> {
    let row = sqlx::query_as::<_, AccountRecord>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = ?1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, account_id: &str) -> Result<Option<AccountRecord>> {
    let row = sqlx::query_as::<_, AccountRecord>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"
    ))
    .bind(account_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// True when `err` is a SQLite unique-constraint failure.
pub fn is_unique_violation(err: &GatewayError) -> bool {
    match err {
        GatewayError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    init_pool_with("sqlite::memory:", 1)
        .await
        .expect("in-memory pool")
}
