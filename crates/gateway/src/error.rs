// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway-scoped error type (§7, "Error type layering").

use thiserror::Error;

/// A structured error surfaced from a dispatched batch (§4.1, `onError`).
///
/// Fires when any statement's execution status is not "tuples ok", the batch fails to
/// dispatch, or the connection is lost.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    #[error("statement {index} failed: {message}")]
    StatementFailed { index: usize, message: String },

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("batch dispatch failed: {0}")]
    Dispatch(String),
}

impl GatewayError {
    /// Connection-exception callbacks escalate to `DoFatal` only while `state == Running`
    /// (§7); this distinguishes connection-tier failures from ordinary statement failures.
    pub fn is_connection_exception(&self) -> bool {
        matches!(self, GatewayError::ConnectionLost(_))
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                GatewayError::ConnectionLost(e.to_string())
            }
            _ => GatewayError::Dispatch(e.to_string()),
        }
    }
}
