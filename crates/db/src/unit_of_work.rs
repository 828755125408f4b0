//! Request-scoped unit of work over one pooled connection.
//!
//! Reads issued through [`UnitOfWork::movies`] see committed data only.
//! Inserts and updates are staged in memory and written together, inside a
//! single transaction, by [`UnitOfWork::commit`] or
//! [`UnitOfWork::commit_with_transaction`]. Dropping the unit of work returns
//! the connection to the pool and discards anything still staged.

use marquee_core::error::CoreError;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgConnection, PgPool, Postgres};

use crate::error::classify_sqlx_error;
use crate::models::movie::{Movie, NewMovie};
use crate::repositories::movie_repo::{self, MovieRepo};
use crate::retry::{with_retry, RetryPolicy};

/// A staged write.
#[derive(Debug, Clone)]
pub enum PendingChange {
    Insert(NewMovie),
    Update(Movie),
}

/// Rows written by a successful commit, in staging order.
#[derive(Debug, Default)]
pub struct CommitOutcome {
    pub inserted: Vec<Movie>,
    pub updated: Vec<Movie>,
}

impl CommitOutcome {
    pub fn rows_written(&self) -> usize {
        self.inserted.len() + self.updated.len()
    }
}

pub struct UnitOfWork {
    conn: PoolConnection<Postgres>,
    pending: Vec<PendingChange>,
}

impl UnitOfWork {
    /// Acquire a connection from `pool`, retrying transient faults.
    pub async fn begin(pool: &PgPool, retry: &RetryPolicy) -> Result<Self, CoreError> {
        let conn = with_retry(retry, "acquire connection", || pool.acquire())
            .await
            .map_err(|e| classify_sqlx_error(&e, "open a database connection"))?;
        Ok(Self {
            conn,
            pending: Vec::new(),
        })
    }

    /// Movie repository bound to this scope. Every repository handed out by
    /// the same unit of work shares its pending-change set.
    pub fn movies(&mut self) -> MovieRepo<'_> {
        MovieRepo::new(self)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Discard staged changes without writing anything.
    pub fn clear_context(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(discarded = self.pending.len(), "Cleared unit of work");
        }
        self.pending.clear();
    }

    pub(crate) fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    pub(crate) fn stage(&mut self, change: PendingChange) {
        self.pending.push(change);
    }

    /// Write all staged changes in one transaction.
    ///
    /// On failure the transaction is rolled back when it is dropped and the
    /// staged changes are kept, so nothing is persisted.
    pub async fn commit(&mut self) -> Result<CommitOutcome, CoreError> {
        if self.pending.is_empty() {
            return Ok(CommitOutcome::default());
        }

        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| classify_sqlx_error(&e, "begin transaction"))?;
        let outcome = apply_changes(&mut tx, &self.pending)
            .await
            .map_err(|e| classify_sqlx_error(&e, "save movies"))?;
        tx.commit()
            .await
            .map_err(|e| classify_sqlx_error(&e, "commit transaction"))?;

        self.pending.clear();
        tracing::debug!(rows = outcome.rows_written(), "Committed unit of work");
        Ok(outcome)
    }

    /// Like [`commit`](Self::commit), but rolls back explicitly and logs on
    /// every failure path instead of relying on drop.
    pub async fn commit_with_transaction(&mut self) -> Result<CommitOutcome, CoreError> {
        if self.pending.is_empty() {
            return Ok(CommitOutcome::default());
        }

        let pending = self.pending.len();
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| classify_sqlx_error(&e, "begin transaction"))?;

        let outcome = match apply_changes(&mut tx, &self.pending).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                tracing::warn!(pending, error = %err, "Rolled back unit of work");
                return Err(classify_sqlx_error(&err, "save movies"));
            }
        };

        if let Err(err) = tx.commit().await {
            tracing::warn!(pending, error = %err, "Commit failed, transaction rolled back");
            return Err(classify_sqlx_error(&err, "commit transaction"));
        }

        self.pending.clear();
        tracing::debug!(rows = outcome.rows_written(), "Committed unit of work");
        Ok(outcome)
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(
                discarded = self.pending.len(),
                "Unit of work dropped with uncommitted changes"
            );
        }
    }
}

async fn apply_changes(
    conn: &mut PgConnection,
    changes: &[PendingChange],
) -> Result<CommitOutcome, sqlx::Error> {
    let mut outcome = CommitOutcome::default();
    for change in changes {
        match change {
            PendingChange::Insert(movie) => {
                outcome
                    .inserted
                    .push(movie_repo::insert_row(&mut *conn, movie).await?);
            }
            PendingChange::Update(movie) => {
                outcome
                    .updated
                    .push(movie_repo::update_row(&mut *conn, movie).await?);
            }
        }
    }
    Ok(outcome)
}
