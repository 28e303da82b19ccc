// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciler's decision table (§4.4) as a pure, synchronous function.
//!
//! Kept free of any gateway or registry type so the full `(state_code, registry-contains)`
//! matrix can be exercised with `proptest` (§8) without spinning up an event loop.

use ts_core::JobState;

/// What the reconciler does next for one observed `(id, state_code)` pair. Carries no job
/// payload (`type_code`/`body`/`id`) — those travel with the caller, which already has the
/// row in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `DoStart`: (re)issue the `execute` transition — covers `enabled`, and the `aborted`/
    /// `failed` retry paths.
    Start,
    Abort,
    Cancel,
    Fail(String),
    None,
}

/// `cancel_result` must be `Some` exactly when `state == Canceled && in_registry` — that is
/// the only branch of the table that ever needs to have called `Handle::cancel` (§4.4).
pub fn decide(state: JobState, in_registry: bool, cancel_result: Option<Result<(), String>>) -> Action {
    match state {
        JobState::Canceled => {
            if !in_registry {
                return Action::Abort;
            }
            match cancel_result {
                Some(Ok(())) => Action::Abort,
                Some(Err(reason)) => Action::Fail(reason),
                // Should not occur (caller is responsible for calling cancel first); fail
                // open toward the safer "abort" path rather than leaving the job stuck.
                None => Action::Abort,
            }
        }
        JobState::Executed => {
            if in_registry {
                Action::None
            } else {
                Action::Cancel
            }
        }
        JobState::Enabled | JobState::Aborted | JobState::Failed => Action::Start,
        JobState::Completed | JobState::Done => Action::None,
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
