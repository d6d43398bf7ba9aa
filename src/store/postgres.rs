//! PostgreSQL backend (schema in `sql/schema.sql`).

use crate::accounts::{Account, AccountStore, CreateOutcome, NewAccount, UniqueField};
use crate::sessions::{SessionRecord, SessionStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use std::time::Duration;
use tracing::{Instrument, info_span};
use uuid::Uuid;

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const ACCOUNT_COLUMNS: &str = r"
    id,
    email,
    username,
    display_name,
    password_hash,
    is_active,
    EXTRACT(EPOCH FROM date_joined)::bigint AS date_joined_unix,
    EXTRACT(EPOCH FROM last_login)::bigint AS last_login_unix
";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool to `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error naming the first statement that failed.
    pub async fn apply_schema(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire connection for schema setup")?;

        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }

        Ok(())
    }
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

fn query_span(operation: &'static str, statement: &str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        date_joined_unix: row.get("date_joined_unix"),
        last_login_unix: row.get("last_login_unix"),
    }
}

/// Map a unique violation to the column it hit.
fn unique_violation(err: &sqlx::Error) -> Option<UniqueField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    match db_err.constraint() {
        Some("accounts_email_key") => Some(UniqueField::Email),
        Some("accounts_username_key") => Some(UniqueField::Username),
        _ => None,
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup account by email")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup account by id")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn exists(&self, field: UniqueField, value: &str) -> Result<bool> {
        let query = match field {
            UniqueField::Email => "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1) AS exists",
            UniqueField::Username => {
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1) AS exists"
            }
        };
        let row = sqlx::query(query)
            .bind(value)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .with_context(|| format!("failed to check {} uniqueness", field.as_str()))?;

        Ok(row.get("exists"))
    }

    async fn create(&self, new: &NewAccount) -> Result<CreateOutcome> {
        let query = format!(
            r"
            INSERT INTO accounts
                (id, email, username, display_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "
        );
        let result = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(&new.email)
            .bind(&new.username)
            .bind(&new.display_name)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await;

        match result {
            Ok(row) => Ok(CreateOutcome::Created(account_from_row(&row))),
            Err(err) => match unique_violation(&err) {
                Some(field) => Ok(CreateOutcome::Conflict(field)),
                None => Err(err).context("failed to insert account"),
            },
        }
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        let query = "UPDATE accounts SET last_login = now() WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update last login")?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("Failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("Failed to ping database")
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(
        &self,
        token_hash: &[u8],
        account_id: Uuid,
        ttl_seconds: i64,
    ) -> Result<()> {
        let prune = "DELETE FROM sessions WHERE expires_at <= now()";
        sqlx::query(prune)
            .execute(&self.pool)
            .instrument(query_span("DELETE", prune))
            .await
            .context("failed to prune expired sessions")?;

        let query = r"
            INSERT INTO sessions (token_hash, account_id, expires_at)
            VALUES ($1, $2, now() + ($3::bigint * interval '1 second'))
        ";
        sqlx::query(query)
            .bind(token_hash)
            .bind(account_id)
            .bind(ttl_seconds)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert session")?;
        Ok(())
    }

    async fn lookup_session(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>> {
        let query = r"
            SELECT account_id, EXTRACT(EPOCH FROM created_at)::bigint AS created_at_unix
            FROM sessions
            WHERE token_hash = $1 AND expires_at > now()
        ";
        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup session")?;

        Ok(row.map(|row| SessionRecord {
            account_id: row.get("account_id"),
            created_at_unix: row.get("created_at_unix"),
        }))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<()> {
        let query = "DELETE FROM sessions WHERE token_hash = $1";
        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete session")?;
        Ok(())
    }
}
