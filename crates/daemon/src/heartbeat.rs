// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat/Clock decision (§4.5), split out as a pure function of the clock fields so the
//! 5-second auth bump and the reconcile gating can be tested without a timer.

use std::time::{Duration, Instant};
use ts_core::SchedulerState;

const AUTH_REISSUE_BUMP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickDecision {
    pub new_auth_deadline: Option<Instant>,
    pub should_auth: bool,
    pub new_check_deadline: Option<Instant>,
    pub should_reconcile: bool,
}

/// One timer fire (§4.5, "Invoked by a 1-second timer"):
/// 1. If `now >= auth_deadline`: push `auth_deadline = now + 5s`, invoke Auth.
/// 2. If `state == Running` and `now >= check_deadline`: push `check_deadline = now +
///    heartbeat_interval`, invoke Reconciler.
pub fn decide_tick(
    now: Instant,
    auth_deadline: Instant,
    check_deadline: Instant,
    state: SchedulerState,
    heartbeat_interval: Duration,
) -> TickDecision {
    let should_auth = now >= auth_deadline;
    let new_auth_deadline = should_auth.then(|| now + AUTH_REISSUE_BUMP);

    let should_reconcile = state.is_running() && now >= check_deadline;
    let new_check_deadline = should_reconcile.then(|| now + heartbeat_interval);

    TickDecision { new_auth_deadline, should_auth, new_check_deadline, should_reconcile }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
