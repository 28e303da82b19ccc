// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth Manager protocol (§4.2): batch construction and result parsing, kept free of the
//! gateway/scheduler types so the parsing half is unit-testable without dispatching anything.

use crate::error::AuthError;
use ts_core::SessionId;
use ts_gateway::{stmt, Batch, ResultSet};

/// `login(clientId, secret, agent, host)` then `get_sessions(apibot, agent, host)`.
pub fn build_login_batch(client_id: &str, secret: &str, agent: &str, host: &str) -> Batch {
    let mut batch = stmt::login(client_id, secret, agent, host);
    batch.extend(stmt::get_sessions("apibot", agent, host));
    batch
}

/// Pulls the session list out of the batch's second result set (`get_sessions`).
///
/// Column name `get_sessions` matches the `[(get_sessions: session)]` row shape from §6.
pub fn parse_sessions(get_sessions_rows: &ResultSet) -> Result<Vec<SessionId>, AuthError> {
    if get_sessions_rows.is_empty() {
        return Err(AuthError::NoSessions);
    }
    let mut sessions = Vec::with_capacity(get_sessions_rows.len());
    for row in get_sessions_rows {
        let session = row
            .text("get_sessions")
            .map_err(|_| AuthError::NoSessions)?;
        sessions.push(SessionId::from(session));
    }
    Ok(sessions)
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
