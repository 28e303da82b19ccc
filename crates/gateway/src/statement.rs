// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Statement batches dispatched through the gateway (§4.1).

use uuid::Uuid;

/// A bound parameter for a statement. Kept as a closed enum rather than a trait object so a
/// batch can be built, cloned, and logged without touching `dyn Any`.
#[derive(Debug, Clone)]
pub enum Param {
    Text(String),
    Uuid(Uuid),
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Text(s)
    }
}

impl From<Uuid> for Param {
    fn from(u: Uuid) -> Self {
        Param::Uuid(u)
    }
}

/// One statement in a batch: SQL text plus its positional (`$1`, `$2`, ...) parameters.
///
/// `body` statements (a job's `execute_object_action` call and whatever SQL the job itself
/// carries) are dispatched with zero params — their text is the job's own, taken verbatim
/// from `api.job`, and is never parameter-substituted by the gateway.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), params: Vec::new() }
    }

    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// A batch is dispatched, transacted, and committed or rolled back as a unit (§4.1).
pub type Batch = Vec<Statement>;

/// Stored-procedure call sites named in §6. Kept in one place so the exact call shape used
/// by the auth manager and reconciler is grounded in a single spot rather than scattered
/// string literals.
pub mod stmt {
    use super::{Batch, Statement};
    use uuid::Uuid;

    pub fn login(client_id: &str, secret: &str, agent: &str, host: &str) -> Batch {
        vec![Statement::new("SELECT * FROM api.login($1, $2, $3, $4)")
            .bind(client_id)
            .bind(secret)
            .bind(agent)
            .bind(host)]
    }

    pub fn get_sessions(username: &str, agent: &str, host: &str) -> Batch {
        vec![Statement::new("SELECT * FROM api.get_sessions($1, $2, $3)")
            .bind(username)
            .bind(agent)
            .bind(host)]
    }

    pub fn authorize(session: &str) -> Batch {
        vec![Statement::new("SELECT * FROM api.authorize($1)").bind(session)]
    }

    pub fn signout(session: &str) -> Batch {
        vec![Statement::new("SELECT api.signout($1)").bind(session)]
    }

    /// `api.job('enabled')` style poll; `state` is the `state_code` filter text.
    pub fn job(state: &str) -> Batch {
        vec![Statement::new("SELECT * FROM api.job($1)").bind(state)]
    }

    pub fn execute_object_action(id: Uuid, action: &str) -> Statement {
        Statement::new("SELECT api.execute_object_action($1::uuid, $2)")
            .bind(id)
            .bind(action)
    }

    pub fn set_object_label(id: Uuid, label: &str) -> Statement {
        Statement::new("SELECT api.set_object_label($1::uuid, $2)")
            .bind(id)
            .bind(label)
    }

    /// The job's own body SQL, run verbatim as the last statement of a `DoRun` batch.
    pub fn body_verbatim(sql: &str) -> Statement {
        Statement::new(sql)
    }
}

#[cfg(test)]
#[path = "statement_tests.rs"]
mod tests;
