// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted gateway double for daemon tests (§8, "Ambient test tooling").
//!
//! A test arranges canned [`BatchOutcome`]s and, separately, canned cancel verdicts, then
//! drives the daemon against `FakeGateway` instead of a live Postgres instance. No network,
//! no timing assumptions beyond what the test itself chooses to await.

use crate::gateway::{BatchOutcome, Dispatch};
use crate::statement::Batch;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::oneshot;

/// What `cancel()` should report the next time it is invoked on a handle this fake hands out.
#[derive(Debug, Clone)]
pub enum ScriptedCancel {
    Succeeds,
    RefusedBecause(String),
}

pub struct FakeGateway {
    /// Outcomes dispatched in FIFO order, one per `exec_batch` call.
    outcomes: Mutex<VecDeque<BatchOutcome>>,
    /// Cancel verdicts, also FIFO, consumed one per `Handle::cancel` call this fake issues.
    cancels: Mutex<VecDeque<ScriptedCancel>>,
    /// Every batch dispatched, in order, for post-hoc assertions.
    pub dispatched: Mutex<Vec<Batch>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            cancels: Mutex::new(VecDeque::new()),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    pub fn push_outcome(&self, outcome: BatchOutcome) {
        self.outcomes.lock().push_back(outcome);
    }

    pub fn push_cancel(&self, verdict: ScriptedCancel) {
        self.cancels.lock().push_back(verdict);
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatch for FakeGateway {
    fn exec_batch(&self, batch: Batch) -> (crate::gateway::Handle, oneshot::Receiver<BatchOutcome>) {
        self.dispatched.lock().push(batch);
        let (tx, rx) = oneshot::channel();
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        let _ = tx.send(outcome);

        let verdict = self.cancels.lock().pop_front();
        let handle = match verdict {
            Some(ScriptedCancel::RefusedBecause(reason)) => FakeHandle::refused(reason),
            Some(ScriptedCancel::Succeeds) | None => FakeHandle::succeeds(),
        };
        (handle.into_handle(), rx)
    }
}

/// Builds a real [`crate::gateway::Handle`] whose `cancel()` is pre-scripted: a live task is
/// spawned and immediately parked so its `AbortHandle` is genuine, and the `committed` flag
/// is set up-front to reproduce the desired verdict without involving a database.
struct FakeHandle {
    committed: bool,
}

impl FakeHandle {
    fn succeeds() -> Self {
        Self { committed: false }
    }

    fn refused(_reason: String) -> Self {
        // `Handle::cancel` only ever reports "already committed" as a refusal (§4.1); the
        // scripted reason is accepted for test-authoring ergonomics but the fake's one real
        // refusal path always surfaces that exact text.
        Self { committed: true }
    }

    fn into_handle(self) -> crate::gateway::Handle {
        let join = tokio::spawn(async {
            std::future::pending::<()>().await;
        });
        crate::gateway::Handle::from_parts(join.abort_handle(), Arc::new(AtomicBool::new(self.committed)))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
