//! Generic upsert keyed on natural keys
//!
//! Each call runs in its own transaction: look the row up by natural key,
//! insert it when absent, and always hand back the stored row so callers
//! learn the surrogate id.

use tracing::{debug, info};

use super::{
    Record, SqlValue, Store, StoreError, StoreResult, bind, bind_as, key_predicate,
};

/// What happens when a row with the same natural key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpsertMode {
    /// Keep the stored row untouched
    #[default]
    FirstWriteWins,
    /// Replace every non-key column with the new values
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    AlreadyPresent,
    Updated,
}

/// The stored row after an upsert
#[derive(Debug, Clone)]
pub struct Upserted<R> {
    pub record: R,
    pub outcome: UpsertOutcome,
}

impl<R> Upserted<R> {
    #[must_use]
    pub fn inserted(&self) -> bool {
        self.outcome == UpsertOutcome::Inserted
    }

    pub fn into_inner(self) -> R {
        self.record
    }
}

fn key_label(key: &[(&'static str, SqlValue)]) -> String {
    key.iter()
        .map(|(column, value)| match value {
            SqlValue::Int(v) => format!("{column}={v}"),
            SqlValue::Real(v) => format!("{column}={v}"),
            SqlValue::Text(v) => format!("{column}={v}"),
            SqlValue::Bool(v) => format!("{column}={v}"),
            SqlValue::Null => format!("{column}=NULL"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Store {
    /// Insert `record` unless a row with the same natural key exists.
    ///
    /// # Errors
    ///
    /// Any SQLite error; the transaction is rolled back.
    pub async fn upsert<R: Record>(&self, record: &R, mode: UpsertMode) -> StoreResult<Upserted<R>> {
        let key = record.natural_key();
        let select_sql = format!(
            "SELECT * FROM {} WHERE {}",
            R::TABLE,
            key_predicate(R::KEY)
        );

        let mut tx = self.pool().begin().await?;

        let mut select = sqlx::query_as::<_, R>(&select_sql);
        for (_, value) in key.iter().cloned() {
            select = bind_as(select, value);
        }
        let existing = select.fetch_optional(&mut *tx).await?;

        let upserted = match (existing, mode) {
            (Some(stored), UpsertMode::FirstWriteWins) => {
                debug!(table = R::TABLE, key = %key_label(&key), "Record already present");
                Upserted {
                    record: stored,
                    outcome: UpsertOutcome::AlreadyPresent,
                }
            }
            (Some(_), UpsertMode::Overwrite) => {
                let updates: Vec<(&'static str, SqlValue)> = record
                    .columns()
                    .into_iter()
                    .filter(|(column, _)| !R::KEY.contains(column))
                    .collect();

                if !updates.is_empty() {
                    let update_sql = format!(
                        "UPDATE {} SET {} WHERE {}",
                        R::TABLE,
                        updates
                            .iter()
                            .map(|(column, _)| format!("{column} = ?"))
                            .collect::<Vec<_>>()
                            .join(", "),
                        key_predicate(R::KEY)
                    );
                    let mut update = sqlx::query(&update_sql);
                    for (_, value) in updates.into_iter().chain(key.iter().cloned()) {
                        update = bind(update, value);
                    }
                    update.execute(&mut *tx).await?;
                }

                let mut reread = sqlx::query_as::<_, R>(&select_sql);
                for (_, value) in key.iter().cloned() {
                    reread = bind_as(reread, value);
                }
                let stored = reread
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(StoreError::MissingRow { table: R::TABLE })?;

                info!(table = R::TABLE, key = %key_label(&key), "Record updated");
                Upserted {
                    record: stored,
                    outcome: UpsertOutcome::Updated,
                }
            }
            (None, _) => {
                let columns = record.columns();
                let insert_sql = format!(
                    "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT DO NOTHING RETURNING *",
                    R::TABLE,
                    columns
                        .iter()
                        .map(|(column, _)| *column)
                        .collect::<Vec<_>>()
                        .join(", "),
                    vec!["?"; columns.len()].join(", ")
                );

                let mut insert = sqlx::query_as::<_, R>(&insert_sql);
                for (_, value) in columns {
                    insert = bind_as(insert, value);
                }

                match insert.fetch_optional(&mut *tx).await? {
                    Some(stored) => {
                        info!(table = R::TABLE, key = %key_label(&key), "Record inserted");
                        Upserted {
                            record: stored,
                            outcome: UpsertOutcome::Inserted,
                        }
                    }
                    None => {
                        // Lost a race against another writer; read the winner.
                        let mut reread = sqlx::query_as::<_, R>(&select_sql);
                        for (_, value) in key.iter().cloned() {
                            reread = bind_as(reread, value);
                        }
                        let stored = reread
                            .fetch_optional(&mut *tx)
                            .await?
                            .ok_or(StoreError::MissingRow { table: R::TABLE })?;
                        debug!(table = R::TABLE, key = %key_label(&key), "Record already present");
                        Upserted {
                            record: stored,
                            outcome: UpsertOutcome::AlreadyPresent,
                        }
                    }
                }
            }
        };

        tx.commit().await?;
        Ok(upserted)
    }

    /// First-write-wins upsert returning only the stored row.
    ///
    /// # Errors
    ///
    /// See [`Store::upsert`].
    pub async fn insert_or_get<R: Record>(&self, record: &R) -> StoreResult<R> {
        Ok(self
            .upsert(record, UpsertMode::FirstWriteWins)
            .await?
            .into_inner())
    }
}
