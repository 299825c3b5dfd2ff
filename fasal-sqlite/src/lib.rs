//! SQLite persistence for Fasal Rakshak.
//!
//! [`SqliteStore`] implements [`FasalStore`] over the `profiles`,
//! `policies`, `claims` and `education_progress` tables, and
//! [`SqliteIdentityProvider`] keeps accounts and sessions in the same
//! database.
//!
//! # Example
//!
//! ```ignore
//! use fasal_sqlite::SqliteStore;
//!
//! let store = SqliteStore::connect("sqlite:fasal.db?mode=rwc").await?;
//! let policy = store.latest_active_policy(owner).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use fasal_core::models::{
    Claim, ClaimStatus, CreatePolicyRequest, NewClaim, NewProfile, Policy, PolicyStatus, Profile,
};
use fasal_core::store::FasalStore;
use fasal_core::types::{FasalError, InvalidInputDetails, Language};

mod identity;

pub use identity::SqliteIdentityProvider;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY NOT NULL,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        preferred_language TEXT NOT NULL DEFAULT 'hi',
        coins_earned INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS policies (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        state TEXT NOT NULL,
        district TEXT NOT NULL,
        crop TEXT NOT NULL,
        premium_amount INTEGER NOT NULL,
        coverage_amount INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'expired', 'claimed')),
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_policies_user ON policies (user_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS claims (
        id TEXT PRIMARY KEY NOT NULL,
        policy_id TEXT NOT NULL REFERENCES policies (id),
        user_id TEXT NOT NULL,
        trigger_event TEXT NOT NULL,
        trigger_date TEXT NOT NULL,
        payout_amount TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'triggered' CHECK (status IN ('triggered', 'processing', 'completed')),
        blockchain_tx_hash TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_claims_policy ON claims (policy_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_claims_user ON claims (user_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS education_progress (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        question_id TEXT NOT NULL,
        is_correct INTEGER NOT NULL,
        coins_earned INTEGER NOT NULL,
        completed_at TEXT NOT NULL,
        UNIQUE (user_id, question_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_users (
        id TEXT PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_sessions (
        token TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL REFERENCES auth_users (id),
        created_at TEXT NOT NULL,
        revoked_at TEXT
    )
    "#,
];

/// A SQLite-backed implementation of [`FasalStore`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects and brings the schema up to date.
    ///
    /// In-memory URLs get a single long-lived connection, since every
    /// SQLite connection to `:memory:` opens its own database.
    ///
    /// # Errors
    /// Returns `FasalError::StorageError` if connection or migration fails.
    pub async fn connect(url: &str) -> Result<Self, FasalError> {
        let mut options = SqlitePoolOptions::new();
        options = if url.contains(":memory:") {
            options.max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            options.max_connections(5)
        };

        let pool = options
            .connect(url)
            .await
            .map_err(|e| FasalError::StorageError(format!("SQLite connection error: {}", e)))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!(%url, "SQLite store ready");
        Ok(store)
    }

    /// Wraps an existing pool. Does not run migrations.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn run_migrations(&self) -> Result<(), FasalError> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| FasalError::StorageError(format!("SQLite migration error: {}", e)))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Identity provider sharing this store's database.
    pub fn identity(&self) -> SqliteIdentityProvider {
        SqliteIdentityProvider::new(self.pool.clone())
    }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn db_error(context: &str, e: sqlx::Error) -> FasalError {
    FasalError::StorageError(format!("SQLite {} error: {}", context, e))
}

fn make_parse_error(field: &str, value: &str, error: &str) -> FasalError {
    FasalError::InvalidInput(Box::new(InvalidInputDetails {
        field: field.to_string(),
        value: value.to_string(),
        reason_key: "error-parse".to_string(),
        args: Some(HashMap::from([("error".to_string(), error.to_string())])),
        source_label: Some("SqliteStore".to_string()),
    }))
}

pub(crate) fn column<T>(row: &SqliteRow, name: &str) -> Result<T, FasalError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| db_error("read", e))
}

pub(crate) fn parse_uuid(row: &SqliteRow, name: &str) -> Result<Uuid, FasalError> {
    let raw: String = column(row, name)?;
    Uuid::parse_str(&raw).map_err(|e| make_parse_error(name, &raw, &e.to_string()))
}

fn parse_date(row: &SqliteRow, name: &str) -> Result<NaiveDate, FasalError> {
    let raw: String = column(row, name)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| make_parse_error(name, &raw, &e.to_string()))
}

pub(crate) fn parse_timestamp(row: &SqliteRow, name: &str) -> Result<DateTime<Utc>, FasalError> {
    let raw: String = column(row, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| make_parse_error(name, &raw, &e.to_string()))
}

fn parse_amount(row: &SqliteRow, name: &str) -> Result<u64, FasalError> {
    let raw: i64 = column(row, name)?;
    u64::try_from(raw).map_err(|e| make_parse_error(name, &raw.to_string(), &e.to_string()))
}

fn to_db_amount(field: &str, amount: u64) -> Result<i64, FasalError> {
    i64::try_from(amount).map_err(|e| make_parse_error(field, &amount.to_string(), &e.to_string()))
}

fn parse_enum<T: FromStr>(row: &SqliteRow, name: &str) -> Result<T, FasalError> {
    let raw: String = column(row, name)?;
    T::from_str(&raw).map_err(|_| make_parse_error(name, &raw, "unknown value"))
}

fn policy_from_row(row: &SqliteRow) -> Result<Policy, FasalError> {
    Ok(Policy {
        id: parse_uuid(row, "id")?,
        user_id: parse_uuid(row, "user_id")?,
        state: column(row, "state")?,
        district: column(row, "district")?,
        crop: column(row, "crop")?,
        premium_amount: parse_amount(row, "premium_amount")?,
        coverage_amount: parse_amount(row, "coverage_amount")?,
        start_date: parse_date(row, "start_date")?,
        end_date: parse_date(row, "end_date")?,
        status: parse_enum::<PolicyStatus>(row, "status")?,
        created_at: parse_timestamp(row, "created_at")?,
    })
}

fn claim_from_row(row: &SqliteRow) -> Result<Claim, FasalError> {
    let payout_raw: String = column(row, "payout_amount")?;
    let payout_amount = Decimal::from_str_exact(&payout_raw)
        .map_err(|e| make_parse_error("payout_amount", &payout_raw, &e.to_string()))?;

    Ok(Claim {
        id: parse_uuid(row, "id")?,
        policy_id: parse_uuid(row, "policy_id")?,
        user_id: parse_uuid(row, "user_id")?,
        trigger_event: column(row, "trigger_event")?,
        trigger_date: parse_date(row, "trigger_date")?,
        payout_amount,
        status: parse_enum::<ClaimStatus>(row, "status")?,
        blockchain_tx_hash: column(row, "blockchain_tx_hash")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn profile_from_row(row: &SqliteRow) -> Result<Profile, FasalError> {
    let language_raw: String = column(row, "preferred_language")?;
    let preferred_language = Language::from_code(&language_raw)
        .ok_or_else(|| make_parse_error("preferred_language", &language_raw, "unsupported language"))?;
    Ok(Profile {
        id: parse_uuid(row, "id")?,
        full_name: column(row, "full_name")?,
        email: column(row, "email")?,
        preferred_language,
        coins_earned: parse_amount(row, "coins_earned")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

const POLICY_COLUMNS: &str =
    "id, user_id, state, district, crop, premium_amount, coverage_amount, start_date, end_date, status, created_at";
const CLAIM_COLUMNS: &str = "id, policy_id, user_id, trigger_event, trigger_date, payout_amount, status, blockchain_tx_hash, created_at, updated_at";

#[async_trait]
impl FasalStore for SqliteStore {
    async fn insert_policy(&self, request: CreatePolicyRequest) -> Result<Policy, FasalError> {
        let premium = to_db_amount("premium_amount", request.premium_amount)?;
        let coverage = to_db_amount("coverage_amount", request.coverage_amount)?;
        let policy = request.into_policy(Uuid::new_v4(), Utc::now());

        sqlx::query(
            r#"
            INSERT INTO policies (id, user_id, state, district, crop, premium_amount, coverage_amount,
                                  start_date, end_date, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(policy.id.to_string())
        .bind(policy.user_id.to_string())
        .bind(&policy.state)
        .bind(&policy.district)
        .bind(&policy.crop)
        .bind(premium)
        .bind(coverage)
        .bind(policy.start_date.format("%Y-%m-%d").to_string())
        .bind(policy.end_date.format("%Y-%m-%d").to_string())
        .bind(policy.status.to_string())
        .bind(timestamp(policy.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert", e))?;

        debug!(policy_id = %policy.id, owner = %policy.user_id, "Inserted policy");
        Ok(policy)
    }

    async fn latest_active_policy(&self, owner: Uuid) -> Result<Option<Policy>, FasalError> {
        let sql = format!(
            "SELECT {POLICY_COLUMNS} FROM policies WHERE user_id = ? AND status = 'active' \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(owner.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("query", e))?;
        row.as_ref().map(policy_from_row).transpose()
    }

    async fn policies_for_owner(&self, owner: Uuid) -> Result<Vec<Policy>, FasalError> {
        let sql = format!(
            "SELECT {POLICY_COLUMNS} FROM policies WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("query", e))?;
        rows.iter().map(policy_from_row).collect()
    }

    async fn insert_claim(&self, claim: NewClaim) -> Result<Claim, FasalError> {
        let now = Utc::now();
        let claim = Claim {
            id: Uuid::new_v4(),
            policy_id: claim.policy_id,
            user_id: claim.user_id,
            trigger_event: claim.trigger_event,
            trigger_date: claim.trigger_date,
            payout_amount: claim.payout_amount,
            status: claim.status,
            blockchain_tx_hash: claim.blockchain_tx_hash,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO claims (id, policy_id, user_id, trigger_event, trigger_date, payout_amount,
                                status, blockchain_tx_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(claim.id.to_string())
        .bind(claim.policy_id.to_string())
        .bind(claim.user_id.to_string())
        .bind(&claim.trigger_event)
        .bind(claim.trigger_date.format("%Y-%m-%d").to_string())
        .bind(claim.payout_amount.to_string())
        .bind(claim.status.to_string())
        .bind(&claim.blockchain_tx_hash)
        .bind(timestamp(claim.created_at))
        .bind(timestamp(claim.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert", e))?;

        Ok(claim)
    }

    async fn latest_claim_for_policy(&self, policy_id: Uuid) -> Result<Option<Claim>, FasalError> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE policy_id = ? ORDER BY created_at DESC, rowid DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(policy_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("query", e))?;
        row.as_ref().map(claim_from_row).transpose()
    }

    async fn claims_for_owner(&self, owner: Uuid) -> Result<Vec<Claim>, FasalError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE user_id = ? ORDER BY created_at DESC, rowid DESC");
        let rows = sqlx::query(&sql)
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("query", e))?;
        rows.iter().map(claim_from_row).collect()
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, FasalError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO profiles (id, full_name, email, preferred_language, coins_earned, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(profile.preferred_language.code())
        .bind(timestamp(now))
        .bind(timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert", e))?;

        Ok(Profile {
            id: profile.id,
            full_name: profile.full_name,
            email: profile.email,
            preferred_language: profile.preferred_language,
            coins_earned: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_profile(&self, owner: Uuid) -> Result<Option<Profile>, FasalError> {
        let row = sqlx::query(
            "SELECT id, full_name, email, preferred_language, coins_earned, created_at, updated_at \
             FROM profiles WHERE id = ?",
        )
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("query", e))?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn update_preferred_language(&self, owner: Uuid, language: Language) -> Result<(), FasalError> {
        let result = sqlx::query("UPDATE profiles SET preferred_language = ?, updated_at = ? WHERE id = ?")
            .bind(language.code())
            .bind(timestamp(Utc::now()))
            .bind(owner.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update", e))?;
        if result.rows_affected() == 0 {
            return Err(FasalError::NotFound(format!("profile {}", owner)));
        }
        Ok(())
    }

    async fn answered_questions(&self, owner: Uuid) -> Result<HashSet<String>, FasalError> {
        let rows = sqlx::query("SELECT question_id FROM education_progress WHERE user_id = ?")
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("query", e))?;
        rows.iter().map(|row| column::<String>(row, "question_id")).collect()
    }

    async fn award_first_correct(&self, owner: Uuid, question_id: &str, coins: u32) -> Result<bool, FasalError> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin().await.map_err(|e| db_error("transaction", e))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO education_progress (user_id, question_id, is_correct, coins_earned, completed_at)
            VALUES (?, ?, 1, ?, ?)
            ON CONFLICT (user_id, question_id) DO NOTHING
            "#,
        )
        .bind(owner.to_string())
        .bind(question_id)
        .bind(i64::from(coins))
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("insert", e))?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await.map_err(|e| db_error("rollback", e))?;
            return Ok(false);
        }

        let updated = sqlx::query("UPDATE profiles SET coins_earned = coins_earned + ?, updated_at = ? WHERE id = ?")
            .bind(i64::from(coins))
            .bind(&now)
            .bind(owner.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("update", e))?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await.map_err(|e| db_error("rollback", e))?;
            return Err(FasalError::NotFound(format!("profile {}", owner)));
        }

        tx.commit().await.map_err(|e| db_error("commit", e))?;
        debug!(%owner, %question_id, coins, "Quiz reward recorded");
        Ok(true)
    }
}
