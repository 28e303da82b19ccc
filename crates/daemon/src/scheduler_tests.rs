// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end seed scenarios (spec §8) driven against [`FakeGateway`] — no live database.

use super::*;
use crate::credential::FixedCredentialProvider;
use std::time::Duration;
use ts_core::{FakeClock, JobState};
use ts_gateway::{ColumnValue, FakeGateway, ResultRow, ScriptedCancel};
use uuid::Uuid;

fn new_scheduler() -> (Scheduler<FakeGateway, FakeClock>, std::sync::Arc<FakeGateway>, FakeClock) {
    let gateway = std::sync::Arc::new(FakeGateway::new());
    let clock = FakeClock::new();
    let credentials = std::sync::Arc::new(FixedCredentialProvider {
        client_id: "client".to_string(),
        secret: "secret".to_string(),
    });
    let sched = Scheduler::new(
        gateway.clone(),
        credentials,
        clock.clone(),
        "Task Scheduler".to_string(),
        "localhost".to_string(),
        Duration::from_millis(1000),
    );
    (sched, gateway, clock)
}

/// Pulls the last bound `Param::Text` out of a statement — used to read back the `action`
/// argument of `execute_object_action`/`set_object_label` calls, which are bound params, not
/// SQL text.
fn last_text_param(statement: &ts_gateway::Statement) -> &str {
    match statement.params.last() {
        Some(ts_gateway::Param::Text(s)) => s.as_str(),
        other => panic!("expected a trailing text param, found {other:?}"),
    }
}

#[tokio::test]
async fn happy_path_non_periodic_job_reaches_complete() {
    let (mut sched, gateway, _clock) = new_scheduler();
    let session = SessionId::from("S1");
    sched.sessions = vec![session.clone()];
    sched.state = SchedulerState::Running;

    let job = Job {
        id: JobId::from(Uuid::new_v4()),
        type_code: TypeCode::new("task.job"),
        state: JobState::Enabled,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, job);
    sched.drain().await;

    assert_eq!(sched.jobs_len(), 0);
    let dispatched = gateway.dispatched.lock();
    assert_eq!(dispatched.len(), 3, "execute; body; complete");
    assert_eq!(last_text_param(&dispatched[0][1]), "execute");
    assert_eq!(dispatched[1][1].sql, "SELECT 1");
    assert_eq!(last_text_param(&dispatched[2][1]), "complete");
}

#[tokio::test]
async fn periodic_job_reaches_done_instead_of_complete() {
    let (mut sched, gateway, _clock) = new_scheduler();
    let session = SessionId::from("S1");
    sched.sessions = vec![session.clone()];
    sched.state = SchedulerState::Running;

    let job = Job {
        id: JobId::from(Uuid::new_v4()),
        type_code: TypeCode::new("periodic.job"),
        state: JobState::Enabled,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, job);
    sched.drain().await;

    assert_eq!(sched.jobs_len(), 0);
    let dispatched = gateway.dispatched.lock();
    assert_eq!(dispatched.len(), 3);
    assert_eq!(last_text_param(&dispatched[0][1]), "execute");
    assert_eq!(last_text_param(&dispatched[2][1]), "done");
}

#[tokio::test]
async fn cancellation_mid_flight_succeeds_and_aborts() {
    let (mut sched, gateway, _clock) = new_scheduler();
    let session = SessionId::from("S1");
    sched.sessions = vec![session.clone()];
    sched.state = SchedulerState::Running;

    let id = JobId::from(Uuid::new_v4());
    let enabled = Job {
        id,
        type_code: TypeCode::new("task.job"),
        state: JobState::Enabled,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, enabled);

    // The DoRun batch (the job's body) never gets to report success — in production,
    // `Handle::cancel` aborts the connection future underneath it, which surfaces here as
    // the dispatch's oneshot channel closing without a value.
    gateway.push_outcome(Err(GatewayError::Dispatch("gateway task dropped before completion".into())));
    sched.poll_one().await; // DoStart completes -> dispatches DoRun, registers the handle.
    assert_eq!(sched.jobs_len(), 1);

    let canceled = Job {
        id,
        type_code: TypeCode::new("task.job"),
        state: JobState::Canceled,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, canceled);
    sched.drain().await;

    assert_eq!(sched.jobs_len(), 0);
    let dispatched = gateway.dispatched.lock();
    assert_eq!(dispatched.len(), 3, "execute; body; abort");
    assert_eq!(last_text_param(&dispatched[2][1]), "abort");
}

#[tokio::test]
async fn cancellation_refused_fails_with_reason() {
    let (mut sched, gateway, _clock) = new_scheduler();
    let session = SessionId::from("S1");
    sched.sessions = vec![session.clone()];
    sched.state = SchedulerState::Running;

    let id = JobId::from(Uuid::new_v4());
    let enabled = Job {
        id,
        type_code: TypeCode::new("task.job"),
        state: JobState::Enabled,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, enabled);

    // Scripted so the handle DoRun's dispatch hands out reports "already committed" the
    // moment the reconciler calls `cancel()` on it.
    gateway.push_cancel(ScriptedCancel::RefusedBecause("already committed".to_string()));
    gateway.push_outcome(Err(GatewayError::Dispatch("gateway task dropped before completion".into())));
    sched.poll_one().await;
    assert_eq!(sched.jobs_len(), 1);

    let canceled = Job {
        id,
        type_code: TypeCode::new("task.job"),
        state: JobState::Canceled,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, canceled);
    sched.drain().await;

    assert_eq!(sched.jobs_len(), 0);
    let dispatched = gateway.dispatched.lock();
    assert_eq!(dispatched.len(), 3, "execute; body; fail+label");
    let fail_batch = &dispatched[2];
    assert_eq!(fail_batch.len(), 3, "authorize; fail; set_object_label");
    assert_eq!(last_text_param(&fail_batch[1]), "fail");
    assert_eq!(last_text_param(&fail_batch[2]), "already committed");
}

#[tokio::test]
async fn orphan_executed_job_is_cancelled() {
    let (mut sched, gateway, _clock) = new_scheduler();
    let session = SessionId::from("S1");
    sched.sessions = vec![session.clone()];
    sched.state = SchedulerState::Running;

    let job = Job {
        id: JobId::from(Uuid::new_v4()),
        type_code: TypeCode::new("task.job"),
        state: JobState::Executed,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, job);
    sched.drain().await;

    assert_eq!(sched.jobs_len(), 0);
    let dispatched = gateway.dispatched.lock();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(last_text_param(&dispatched[0][1]), "cancel");
}

#[tokio::test]
async fn executed_job_already_in_registry_is_left_alone() {
    let (mut sched, _gateway, _clock) = new_scheduler();
    let session = SessionId::from("S1");
    sched.sessions = vec![session.clone()];
    sched.state = SchedulerState::Running;

    let id = JobId::from(Uuid::new_v4());
    let enabled = Job {
        id,
        type_code: TypeCode::new("task.job"),
        state: JobState::Enabled,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, enabled);
    sched.poll_one().await; // DoStart completes -> DoRun dispatched, handle registered.
    assert_eq!(sched.jobs_len(), 1);

    let executed = Job {
        id,
        type_code: TypeCode::new("task.job"),
        state: JobState::Executed,
        body: "SELECT 1".to_string(),
    };
    sched.reconcile_one(&session, executed);
    // No new batch dispatched by the `executed && in_registry` branch (§4.4, "leave alone").
    assert_eq!(sched.pending.len(), 1);
}

#[tokio::test]
async fn same_session_dispatch_is_serialized_fifo() {
    let (mut sched, gateway, _clock) = new_scheduler();
    let session = SessionId::from("S1");
    let id_a = JobId::from(Uuid::new_v4());
    let id_b = JobId::from(Uuid::new_v4());

    sched.dispatch_do_abort(session.clone(), id_a);
    sched.dispatch_do_abort(session.clone(), id_b);

    // The second batch for the same session must not reach the gateway while the first is
    // still in flight (§4.1, "FIFO per-session ordering"; §5, "single-slot queue").
    assert_eq!(gateway.dispatched.lock().len(), 1);

    sched.drain().await;

    let dispatched = gateway.dispatched.lock();
    assert_eq!(dispatched.len(), 2, "both aborts eventually dispatch, in submission order");
    assert_eq!(last_text_param(&dispatched[0][1]), "abort");
    assert_eq!(last_text_param(&dispatched[1][1]), "abort");
}

#[tokio::test]
async fn fatal_auth_failure_then_recovery() {
    let (mut sched, gateway, clock) = new_scheduler();
    let now0 = clock.now();

    gateway.push_outcome(Err(GatewayError::ConnectionLost("connection refused".to_string())));
    sched.tick();
    sched.drain().await;

    assert_eq!(sched.state(), SchedulerState::Stopped);
    assert_eq!(sched.auth_deadline(), now0 + Duration::from_secs(10));
    assert_eq!(sched.check_deadline(), now0 + Duration::from_secs(10));

    clock.advance(Duration::from_secs(10));
    let now1 = clock.now();

    let login_row = ResultRow::from_pairs([("session", ColumnValue::Text("LOGIN1".to_string()))]);
    let session_rows = vec![
        ResultRow::from_pairs([("get_sessions", ColumnValue::Text("S1".to_string()))]),
        ResultRow::from_pairs([("get_sessions", ColumnValue::Text("S2".to_string()))]),
    ];
    gateway.push_outcome(Ok(vec![vec![login_row], session_rows]));
    gateway.push_outcome(Ok(Vec::new())); // signout

    sched.tick();
    sched.drain().await;

    assert_eq!(sched.state(), SchedulerState::Running);
    assert_eq!(sched.sessions(), &[SessionId::from("S1"), SessionId::from("S2")]);
    assert_eq!(sched.auth_deadline(), now1 + Duration::from_secs(24 * 3600));
}

#[test]
fn reload_clears_sessions_jobs_and_deadlines() {
    let (mut sched, _gateway, clock) = new_scheduler();
    sched.sessions = vec![SessionId::from("S1")];
    sched.state = SchedulerState::Running;
    sched.auth_deadline = clock.now() + Duration::from_secs(3600);
    sched.check_deadline = clock.now() + Duration::from_secs(5);

    sched.reload();

    assert!(sched.sessions().is_empty());
    assert_eq!(sched.jobs_len(), 0);
    assert_eq!(sched.state(), SchedulerState::Stopped);
    assert_eq!(sched.auth_deadline(), clock.now());
    assert_eq!(sched.check_deadline(), clock.now());
}
