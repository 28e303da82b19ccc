// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The DB Gateway (§4.1): a connection pool plus `ExecBatch`/`Handle`.

use crate::error::GatewayError;
use crate::result::BatchResults;
use crate::statement::{Batch, Param};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Outcome of one dispatched batch.
pub type BatchOutcome = Result<BatchResults, GatewayError>;

/// `ExecBatch(statements, onData, onDone(results), onError(err)) → Handle` (§4.1), expressed
/// as a synchronous dispatch that returns a `Handle` for cancellation plus a `oneshot` the
/// caller awaits (or multiplexes into a `FuturesUnordered`/`select!` loop, §5, §9A) for the
/// terminal outcome in place of callbacks.
///
/// Implemented by both [`Gateway`] and the test-only fake, so the daemon crate depends on
/// this trait rather than a concrete transport.
pub trait Dispatch: Send + Sync {
    fn exec_batch(&self, batch: Batch) -> (Handle, oneshot::Receiver<BatchOutcome>);
}

/// Wraps the pool; every `exec_batch` call runs its statements inside one transaction on a
/// connection checked out from here (§4.1, "one connection per in-flight batch").
#[derive(Clone)]
pub struct Gateway {
    pool: PgPool,
}

impl Gateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(GatewayError::from)?;
        Ok(Self { pool })
    }
}

impl Dispatch for Gateway {
    fn exec_batch(&self, batch: Batch) -> (Handle, oneshot::Receiver<BatchOutcome>) {
        let pool = self.pool.clone();
        let committed = Arc::new(AtomicBool::new(false));
        let committed_for_task = committed.clone();
        let (tx, rx) = oneshot::channel();
        let join = tokio::spawn(async move {
            let outcome = run_batch(&pool, batch, &committed_for_task).await;
            let _ = tx.send(outcome);
        });
        (Handle { abort: join.abort_handle(), committed }, rx)
    }
}

async fn run_batch(
    pool: &PgPool,
    batch: Batch,
    committed: &AtomicBool,
) -> BatchOutcome {
    let mut tx = pool.begin().await.map_err(GatewayError::from)?;
    let mut results = BatchResults::with_capacity(batch.len());

    for (index, statement) in batch.into_iter().enumerate() {
        let mut query = sqlx::query(&statement.sql);
        for param in &statement.params {
            query = match param {
                Param::Text(s) => query.bind(s.clone()),
                Param::Uuid(u) => query.bind(*u),
            };
        }
        let rows = query.fetch_all(&mut *tx).await.map_err(|e| {
            tracing::warn!(index, error = %e, "statement failed, rolling back batch");
            GatewayError::StatementFailed { index, message: e.to_string() }
        })?;
        results.push(rows.into_iter().map(crate::result::from_pg_row).collect());
    }

    tx.commit().await.map_err(GatewayError::from)?;
    // Linearization point for `Handle::cancel` (§4.1): once the transaction has committed,
    // there is nothing left to roll back by aborting the task.
    committed.store(true, Ordering::SeqCst);
    Ok(results)
}

/// A cancellable, in-flight batch (§4.1, "Handle"). The only operation the reconciler ever
/// performs on a registry-held handle is `cancel`.
pub struct Handle {
    abort: tokio::task::AbortHandle,
    committed: Arc<AtomicBool>,
}

impl Handle {
    /// Test-only constructor letting `FakeGateway` hand out a real, abortable handle without
    /// a live connection pool behind it.
    #[doc(hidden)]
    pub fn from_parts(abort: tokio::task::AbortHandle, committed: Arc<AtomicBool>) -> Self {
        Self { abort, committed }
    }

    /// Attempts to abort the batch before it commits.
    ///
    /// Returns `Ok(())` if the batch had not yet committed (whether cancellation actually
    /// interrupted it or it had already finished harmlessly on its own — both are "safe to
    /// call after completion, no-op"). Returns `Err(reason)` if the transaction had already
    /// committed, matching the "already committed" refusal the reconciler reports upward.
    pub fn cancel(&self) -> Result<(), String> {
        if self.committed.load(Ordering::SeqCst) {
            return Err("already committed".to_string());
        }
        self.abort.abort();
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
