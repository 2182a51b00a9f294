//! Relational store for scraped records
//!
//! SQLite (WAL mode) behind a small typed repository: every table is a
//! [`Record`] that knows its name, its natural-key columns and how to turn
//! itself into bindable values. The generic [`Store::upsert`] in `upsert.rs`
//! handles every table the same way.

mod upsert;

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{FromRow, Sqlite, SqlitePool};
use thiserror::Error;

pub use upsert::{UpsertMode, UpsertOutcome, Upserted};

use crate::models::{Crew, Genre, Movie, Studio, Theme, User};

/// Migration script, applied on every open (idempotent).
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors raised by the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A row vanished between the insert and the read-back
    #[error("Row for {table} disappeared during upsert")]
    MissingRow { table: &'static str },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A value bound into a statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Null,
}

/// A table row that can be upserted by natural key
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Sized {
    const TABLE: &'static str;

    /// Natural-key columns, a subset of `columns()`
    const KEY: &'static [&'static str];

    /// Every persisted column except the surrogate id, in insert order
    fn columns(&self) -> Vec<(&'static str, SqlValue)>;

    /// Values of the natural-key columns, in `KEY` order.
    fn natural_key(&self) -> Vec<(&'static str, SqlValue)> {
        let columns = self.columns();
        Self::KEY
            .iter()
            .filter_map(|key| columns.iter().find(|(name, _)| name == key).cloned())
            .collect()
    }
}

/// Records whose natural key is their absolute URL
pub trait UrlKeyed: Record {}

impl UrlKeyed for User {}
impl UrlKeyed for Movie {}
impl UrlKeyed for Crew {}
impl UrlKeyed for Genre {}
impl UrlKeyed for Theme {}
impl UrlKeyed for Studio {}

type QueryAs<'q, O> = sqlx::query::QueryAs<'q, Sqlite, O, SqliteArguments<'q>>;
type Query<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub(crate) fn bind_as<'q, O>(query: QueryAs<'q, O>, value: SqlValue) -> QueryAs<'q, O> {
    match value {
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Null => query.bind(None::<String>),
    }
}

pub(crate) fn bind<'q>(query: Query<'q>, value: SqlValue) -> Query<'q> {
    match value {
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Null => query.bind(None::<String>),
    }
}

/// `a IS ? AND b IS ?` over the natural key. `IS` makes NULL keys match.
pub(crate) fn key_predicate(key: &[&str]) -> String {
    key.iter()
        .map(|column| format!("{column} IS ?"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Connection pool over the crawl database
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database at `path` and provision the schema.
    ///
    /// # Errors
    ///
    /// IO errors creating the parent directory, or any SQLite error.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        tracing::info!(db_path = %path.display(), "Store opened");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Look up a URL-keyed record.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub async fn find_by_url<R: UrlKeyed>(&self, url: &str) -> StoreResult<Option<R>> {
        let sql = format!("SELECT * FROM {} WHERE url = ?", R::TABLE);
        let row = sqlx::query_as::<_, R>(&sql)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Rows currently stored for `R`.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub async fn count<R: Record>(&self) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Every row of `R`, in insertion order.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub async fn all<R: Record>(&self) -> StoreResult<Vec<R>> {
        let sql = format!("SELECT * FROM {} ORDER BY rowid", R::TABLE);
        let rows = sqlx::query_as::<_, R>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
