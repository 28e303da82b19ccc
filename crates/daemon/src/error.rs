// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-concern error enums and the top-level `SchedulerError` that composes them (§7).

use thiserror::Error;
use ts_gateway::GatewayError;

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("login batch failed: {0}")]
    Login(#[from] GatewayError),
    #[error("get_sessions returned no usable session list")]
    NoSessions,
}

#[derive(Debug, Error, Clone)]
pub enum ReconcileError {
    #[error("authorize({session}) rejected: {message}")]
    NotAuthorized { session: String, message: String },
    #[error("batch dispatch failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// The only error type logged at `ERR` level (§7). Wraps the three concern-scoped enums via
/// `#[from]` rather than flattening them, matching the corpus's one-enum-per-concern
/// convention (§9A).
#[derive(Debug, Error, Clone)]
pub enum SchedulerError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl SchedulerError {
    /// Connection-exception callbacks escalate to `DoFatal` only while `state == Running`
    /// (§7); callers consult this to decide whether an error is fatal-tier.
    pub fn is_connection_exception(&self) -> bool {
        match self {
            SchedulerError::Gateway(e) => e.is_connection_exception(),
            SchedulerError::Auth(AuthError::Login(e)) => e.is_connection_exception(),
            SchedulerError::Reconcile(ReconcileError::Gateway(e)) => e.is_connection_exception(),
            _ => false,
        }
    }
}
