//! Password accounts and bearer sessions stored next to the domain tables.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use fasal_core::identity::{IdentityProvider, Session, SessionCell, validate_credentials};
use fasal_core::types::FasalError;

use crate::{column, db_error, parse_timestamp, parse_uuid, timestamp};

/// Hash a plain password with argon2id.
fn hash_password(password: &str) -> Result<String, FasalError> {
    use argon2::Argon2;
    use password_hash::rand_core::OsRng;
    use password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| FasalError::AuthError(format!("Password hashing failed: {}", e)))
}

/// Verify a password against an argon2id hash.
fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, FasalError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FasalError::AuthError(format!("Password task failed: {}", e)))
}

/// [`IdentityProvider`] backed by the `auth_users` and `auth_sessions` tables.
#[derive(Clone)]
pub struct SqliteIdentityProvider {
    pool: SqlitePool,
    cell: std::sync::Arc<SessionCell>,
}

impl SqliteIdentityProvider {
    /// Expects a pool whose schema was created by [`crate::SqliteStore::connect`].
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cell: Default::default(),
        }
    }

    async fn open_session(&self, user_id: Uuid, email: String) -> Result<Session, FasalError> {
        let session = Session {
            user_id,
            email,
            token: Uuid::new_v4().to_string(),
            issued_at: Utc::now(),
        };
        sqlx::query("INSERT INTO auth_sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&session.token)
            .bind(user_id.to_string())
            .bind(timestamp(session.issued_at))
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("insert", e))?;

        self.cell.set(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, FasalError> {
        let email = validate_credentials(email, password)?;

        let existing = sqlx::query("SELECT id FROM auth_users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("query", e))?;
        if existing.is_some() {
            return Err(FasalError::invalid_input("email", &email, "error-email-taken", "SqliteIdentity"));
        }

        let password = password.to_string();
        let hash = run_blocking(move || hash_password(&password)).await??;
        let user_id = Uuid::new_v4();

        sqlx::query("INSERT INTO auth_users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id.to_string())
            .bind(&email)
            .bind(&hash)
            .bind(timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    FasalError::invalid_input("email", &email, "error-email-taken", "SqliteIdentity")
                }
                other => db_error("insert", other),
            })?;

        info!(%user_id, "Account created");
        self.open_session(user_id, email).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, FasalError> {
        let email = email.trim().to_lowercase();
        let row = sqlx::query("SELECT id, password_hash FROM auth_users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("query", e))?;

        let Some(row) = row else {
            warn!("Sign-in for unknown account");
            return Err(FasalError::AuthError("Invalid email or password".to_string()));
        };
        let user_id = parse_uuid(&row, "id")?;
        let hash: String = column(&row, "password_hash")?;

        let password = password.to_string();
        if !run_blocking(move || verify_password(&password, &hash)).await? {
            warn!(%user_id, "Sign-in with wrong password");
            return Err(FasalError::AuthError("Invalid email or password".to_string()));
        }

        info!(%user_id, "Signed in");
        self.open_session(user_id, email).await
    }

    async fn sign_out(&self) -> Result<(), FasalError> {
        if let Some(session) = self.cell.current() {
            sqlx::query("UPDATE auth_sessions SET revoked_at = ? WHERE token = ? AND revoked_at IS NULL")
                .bind(timestamp(Utc::now()))
                .bind(&session.token)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("update", e))?;
            info!(user_id = %session.user_id, "Signed out");
        }
        self.cell.set(None);
        Ok(())
    }

    async fn restore(&self, token: &str) -> Result<Option<Session>, FasalError> {
        let row = sqlx::query(
            r#"
            SELECT s.token, s.user_id, s.created_at, u.email
            FROM auth_sessions s JOIN auth_users u ON u.id = s.user_id
            WHERE s.token = ? AND s.revoked_at IS NULL
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("query", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session = Session {
            user_id: parse_uuid(&row, "user_id")?,
            email: column(&row, "email")?,
            token: column(&row, "token")?,
            issued_at: parse_timestamp(&row, "created_at")?,
        };
        self.cell.set(Some(session.clone()));
        Ok(Some(session))
    }

    fn current_session(&self) -> Option<Session> {
        self.cell.current()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.cell.subscribe()
    }
}
