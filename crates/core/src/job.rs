// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine types (§3, "Job").

use crate::ids::JobId;
use serde::{Deserialize, Serialize};

/// Observed or terminal state of a job row.
///
/// Only `Enabled | Executed | Aborted | Failed | Canceled` are observable driver inputs from
/// `api.job('enabled')`; `Completed | Done` are terminal results the scheduler itself writes
/// and never observes as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Enabled,
    Executed,
    Completed,
    Done,
    Aborted,
    Failed,
    Canceled,
}

impl JobState {
    /// Parse a `state_code` column value. Unrecognized values are not driver inputs and are
    /// ignored by the reconciler (§4.4, "anything else → ignore"), so this returns `None`
    /// rather than an error.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "enabled" => JobState::Enabled,
            "executed" => JobState::Executed,
            "completed" => JobState::Completed,
            "done" => JobState::Done,
            "aborted" => JobState::Aborted,
            "failed" => JobState::Failed,
            "canceled" => JobState::Canceled,
            _ => return None,
        })
    }
}

crate::simple_display! {
    JobState {
        Enabled => "enabled",
        Executed => "executed",
        Completed => "completed",
        Done => "done",
        Aborted => "aborted",
        Failed => "failed",
        Canceled => "canceled",
    }
}

/// Classifies how a job's successful `DoRun` transitions (§3, "type_code").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCode(pub String);

impl TypeCode {
    pub const PERIODIC: &'static str = "periodic.job";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Whether a successful run of this job type terminates via `done` rather than `complete`.
    pub fn is_periodic(&self) -> bool {
        self.0 == Self::PERIODIC
    }
}

/// A job row as observed by the reconciler: id, type, state, and SQL payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub type_code: TypeCode,
    pub state: JobState,
    pub body: String,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
