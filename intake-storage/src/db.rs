//! SQLite submission repository
//!
//! Two tables: `submissions` (one wide row per completed intake) and `files`
//! (attachments, many-to-one). Every write of a commit happens inside one
//! transaction; a `SubmissionTx` dropped without `commit` rolls back.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use intake_core::{
    NewUploadedFile, Submission, SubmissionDetail, SubmissionFields, SubmissionId,
    SubmissionSummary, TermsAgreed, UploadedFile, SUBMISSION_COLUMNS,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info};

use crate::error::Result;

/// Schema bootstrap, safe to run on every start.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    business_name TEXT NOT NULL DEFAULT '',
    contact_name TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    website TEXT NOT NULL DEFAULT '',
    locations_count TEXT NOT NULL DEFAULT '',
    cuisine_type TEXT NOT NULL DEFAULT '',
    monthly_spend TEXT NOT NULL DEFAULT '',
    monthly_sales TEXT NOT NULL DEFAULT '',
    food_cost_pct TEXT NOT NULL DEFAULT '',
    inventory_frequency TEXT NOT NULL DEFAULT '',
    inventory_method TEXT NOT NULL DEFAULT '',
    systems_used TEXT NOT NULL DEFAULT '',
    vendors TEXT NOT NULL DEFAULT '',
    prime_vendor_pct TEXT NOT NULL DEFAULT '',
    goals TEXT NOT NULL DEFAULT '',
    tier TEXT NOT NULL DEFAULT '',
    terms_agreed TEXT NOT NULL DEFAULT 'no' CHECK (terms_agreed IN ('yes', 'no')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    submission_id INTEGER NOT NULL REFERENCES submissions(id),
    filename TEXT NOT NULL,
    stored_path TEXT NOT NULL UNIQUE,
    uploaded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_submission_id ON files(submission_id);
CREATE INDEX IF NOT EXISTS idx_submissions_created_at ON submissions(created_at);
"#;

const INSERT_SUBMISSION: &str = r#"
INSERT INTO submissions (
    business_name, contact_name, phone, email, address, website,
    locations_count, cuisine_type, monthly_spend, monthly_sales,
    food_cost_pct, inventory_frequency, inventory_method,
    systems_used, vendors, prime_vendor_pct, goals, tier, terms_agreed, created_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite database file
    pub path: PathBuf,
    /// Maximum pool size
    pub max_connections: u32,
    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("submissions.db"),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DbConfig {
    /// Create a database configuration from environment variables.
    ///
    /// - `INTAKE_DATABASE`: database file path (default: submissions.db)
    /// - `INTAKE_DB_POOL_SIZE`: maximum pooled connections (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            path: std::env::var("INTAKE_DATABASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            max_connections: std::env::var("INTAKE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            busy_timeout: defaults.busy_timeout,
        }
    }

    /// Configuration for a database file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Open the connection pool, creating the file when missing.
    pub async fn create_pool(&self) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(self.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await?;

        info!(path = %self.path.display(), "Connected to submissions database");
        Ok(pool)
    }
}

// ============================================================================
// REPOSITORY
// ============================================================================

/// Submission repository over a SQLite pool.
#[derive(Clone, Debug)]
pub struct SubmissionRepository {
    pool: SqlitePool,
}

impl SubmissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and bootstrap the schema.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let repo = Self::new(config.create_pool().await?);
        repo.bootstrap().await?;
        Ok(repo)
    }

    pub async fn bootstrap(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        debug!("Submission schema ready");
        Ok(())
    }

    /// Readiness probe.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Wait for in-flight queries and close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Start a commit transaction.
    pub async fn begin(&self) -> Result<SubmissionTx> {
        Ok(SubmissionTx {
            tx: self.pool.begin().await?,
        })
    }

    /// Insert a submission and its already-stored files in one transaction.
    pub async fn create(
        &self,
        fields: &SubmissionFields,
        files: &[NewUploadedFile],
        now: &str,
    ) -> Result<SubmissionId> {
        let mut tx = self.begin().await?;
        let id = tx.insert_submission(fields, now).await?;
        for file in files {
            tx.insert_file(id, file, now).await?;
        }
        tx.commit().await?;
        Ok(id)
    }

    /// Every submission with its attachment count, newest first.
    pub async fn list_with_file_counts(&self) -> Result<Vec<SubmissionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT s.*, COUNT(f.id) AS file_count
            FROM submissions s
            LEFT JOIN files f ON s.id = f.submission_id
            GROUP BY s.id
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SubmissionSummary {
                    submission: row_to_submission(row)?,
                    file_count: row.try_get("file_count")?,
                })
            })
            .collect()
    }

    pub async fn get(&self, id: SubmissionId) -> Result<Option<Submission>> {
        let row = sqlx::query("SELECT * FROM submissions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_submission).transpose()
    }

    pub async fn files_for(&self, id: SubmissionId) -> Result<Vec<UploadedFile>> {
        let rows = sqlx::query(
            "SELECT id, submission_id, filename, stored_path, uploaded_at FROM files WHERE submission_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_file).collect()
    }

    /// A submission together with its attachments.
    pub async fn get_detail(&self, id: SubmissionId) -> Result<Option<SubmissionDetail>> {
        let Some(submission) = self.get(id).await? else {
            return Ok(None);
        };
        let files = self.files_for(id).await?;
        Ok(Some(SubmissionDetail { submission, files }))
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// An open commit transaction.
pub struct SubmissionTx {
    tx: Transaction<'static, Sqlite>,
}

impl SubmissionTx {
    pub async fn insert_submission(
        &mut self,
        fields: &SubmissionFields,
        created_at: &str,
    ) -> Result<SubmissionId> {
        let mut query = sqlx::query(INSERT_SUBMISSION);
        for (_, value) in fields.text_columns() {
            query = query.bind(value);
        }
        let result = query
            .bind(fields.terms_agreed.as_str())
            .bind(created_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_file(
        &mut self,
        submission_id: SubmissionId,
        file: &NewUploadedFile,
        uploaded_at: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO files (submission_id, filename, stored_path, uploaded_at) VALUES (?, ?, ?, ?)",
        )
        .bind(submission_id)
        .bind(&file.filename)
        .bind(&file.stored_path)
        .bind(uploaded_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn row_to_submission(row: &SqliteRow) -> Result<Submission> {
    let mut values = BTreeMap::new();
    for column in SUBMISSION_COLUMNS {
        let value: Option<String> = row.try_get(*column)?;
        values.insert(column.to_string(), value.unwrap_or_default());
    }

    let terms = values
        .get("terms_agreed")
        .and_then(|v| TermsAgreed::from_str(v).ok())
        .unwrap_or_default();

    Ok(Submission {
        id: row.try_get("id")?,
        fields: SubmissionFields::from_lookup(&values, &["tier"], terms),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_file(row: &SqliteRow) -> Result<UploadedFile> {
    Ok(UploadedFile {
        id: row.try_get("id")?,
        submission_id: row.try_get("submission_id")?,
        filename: row.try_get("filename")?,
        stored_path: row.try_get("stored_path")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}
