// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level scheduler (§2, components A–E): a single `!Send`-free struct owned and
//! mutated only from one loop task (§5) — no mutex, because no two callbacks run
//! concurrently.

use crate::auth;
use crate::credential::CredentialProvider;
use crate::error::{AuthError, ReconcileError};
use crate::heartbeat;
use crate::reconcile::{self, Action};
use crate::rows;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ts_core::{Clock, Job, JobId, JobRegistry, SchedulerState, SessionId, TypeCode};
use ts_gateway::{stmt, BatchOutcome, Dispatch, GatewayError, Handle};

const REAUTH_INTERVAL: Duration = Duration::from_secs(24 * 3600);
const FATAL_BACKOFF: Duration = Duration::from_secs(10);

/// What a dispatched batch's completion continues into (§4.4.1). Carries exactly the
/// context its callback needs; nothing is recovered by re-querying the database.
#[derive(Debug, Clone)]
enum Work {
    Auth,
    SignOut,
    ReconcileQuery { session: SessionId },
    DoStart { session: SessionId, id: JobId, type_code: TypeCode, body: String },
    DoRun { session: SessionId, id: JobId, type_code: TypeCode },
    DoComplete { id: JobId },
    DoDone { id: JobId },
    DoAbort { id: JobId },
    DoCancel { id: JobId },
    DoFail { id: JobId },
}

type PendingFuture = BoxFuture<'static, (Option<SessionId>, Work, BatchOutcome)>;

pub struct Scheduler<G: Dispatch, C: Clock> {
    gateway: Arc<G>,
    credentials: Arc<dyn CredentialProvider>,
    clock: C,
    agent: String,
    host: String,
    heartbeat_interval: Duration,

    sessions: Vec<SessionId>,
    jobs: JobRegistry<Handle>,
    state: SchedulerState,
    auth_deadline: Instant,
    check_deadline: Instant,

    pending: FuturesUnordered<PendingFuture>,

    /// Sessions with a batch currently dispatched to the gateway and not yet completed
    /// (§4.1, "FIFO per-session ordering"). A session in this set must not have a second
    /// batch dispatched until its in-flight one's callback has run.
    session_inflight: HashSet<SessionId>,
    /// Batches for a session that arrived while that session already had one in flight;
    /// drained one at a time as each predecessor's callback runs (§5, "single-slot queue").
    session_queue: HashMap<SessionId, VecDeque<(ts_gateway::Batch, Work)>>,
}

impl<G: Dispatch + 'static, C: Clock + 'static> Scheduler<G, C> {
    pub fn new(
        gateway: Arc<G>,
        credentials: Arc<dyn CredentialProvider>,
        clock: C,
        agent: String,
        host: String,
        heartbeat_interval: Duration,
    ) -> Self {
        let now = clock.now();
        Self {
            gateway,
            credentials,
            clock,
            agent,
            host,
            heartbeat_interval,
            sessions: Vec::new(),
            jobs: JobRegistry::new(),
            state: SchedulerState::Stopped,
            auth_deadline: now,
            check_deadline: now,
            pending: FuturesUnordered::new(),
            session_inflight: HashSet::new(),
            session_queue: HashMap::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn sessions(&self) -> &[SessionId] {
        &self.sessions
    }

    pub fn auth_deadline(&self) -> Instant {
        self.auth_deadline
    }

    pub fn check_deadline(&self) -> Instant {
        self.check_deadline
    }

    pub fn jobs_len(&self) -> usize {
        self.jobs.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// `SIGHUP` (§5): clears in-memory state, keeps the process alive.
    pub fn reload(&mut self) {
        self.sessions.clear();
        self.jobs.clear();
        self.session_inflight.clear();
        self.session_queue.clear();
        let now = self.clock.now();
        self.auth_deadline = now;
        self.check_deadline = now;
        self.state = SchedulerState::Stopped;
    }

    /// One timer fire (§4.5). Dispatches auth and/or reconcile batches as due; does not wait
    /// for their completions.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let decision = heartbeat::decide_tick(
            now,
            self.auth_deadline,
            self.check_deadline,
            self.state,
            self.heartbeat_interval,
        );
        if let Some(deadline) = decision.new_auth_deadline {
            self.auth_deadline = deadline;
        }
        if let Some(deadline) = decision.new_check_deadline {
            self.check_deadline = deadline;
        }
        if decision.should_auth {
            self.start_auth();
        }
        if decision.should_reconcile {
            self.start_reconcile();
        }
    }

    /// Awaits exactly one outstanding batch's completion and processes it. Callers combine
    /// this with their own timer/shutdown branches in a `tokio::select!` (main loop) or drive
    /// it directly in tests.
    pub async fn poll_one(&mut self) {
        if let Some((session, work, outcome)) = self.pending.next().await {
            self.handle_completion(session, work, outcome);
        }
    }

    /// Processes every batch outstanding right now, including any follow-on batches their
    /// completions dispatch, until nothing is left in flight. Used by tests to run a
    /// lifecycle chain (e.g. `DoStart` → `DoRun` → `DoComplete`) to quiescence without a real
    /// timer (§8).
    pub async fn drain(&mut self) {
        while let Some((session, work, outcome)) = self.pending.next().await {
            self.handle_completion(session, work, outcome);
        }
    }

    /// Submits a batch for dispatch, honoring per-session FIFO ordering (§4.1, §5): a batch
    /// for a session that already has one in flight is held in that session's single-slot
    /// queue rather than handed to the gateway, so two batches for the same session can never
    /// complete out of submission order. `session = None` (the login batch, the login
    /// session's signout) carries no per-session ordering requirement and dispatches at once.
    fn enqueue(&mut self, session: Option<SessionId>, batch: ts_gateway::Batch, work: Work) {
        match session {
            None => self.dispatch_now(None, batch, work),
            Some(session) => {
                if self.session_inflight.contains(&session) {
                    self.session_queue.entry(session).or_default().push_back((batch, work));
                } else {
                    self.session_inflight.insert(session.clone());
                    self.dispatch_now(Some(session), batch, work);
                }
            }
        }
    }

    fn dispatch_now(&mut self, session: Option<SessionId>, batch: ts_gateway::Batch, work: Work) {
        let (handle, rx) = self.gateway.exec_batch(batch);
        if let Work::DoRun { id, .. } = &work {
            self.jobs.put(*id, handle);
        }
        self.pending.push(Box::pin(async move {
            let outcome = rx.await.unwrap_or_else(|_| {
                Err(GatewayError::Dispatch("gateway task dropped before completion".into()))
            });
            (session, work, outcome)
        }));
    }

    /// Frees up a session's single in-flight slot after its batch's callback has run, then
    /// immediately dispatches the next batch queued behind it, if any (§4.1, "single-slot
    /// queue"). Must run before the completion is handed to its work-specific callback, since
    /// that callback may itself enqueue the session's next batch (e.g. `DoStart` → `DoRun`)
    /// and needs to see this session's slot in its post-release state.
    fn release_session(&mut self, session: Option<SessionId>) {
        let Some(session) = session else { return };
        self.session_inflight.remove(&session);
        let Some(queue) = self.session_queue.get_mut(&session) else { return };
        let Some((batch, work)) = queue.pop_front() else { return };
        if queue.is_empty() {
            self.session_queue.remove(&session);
        }
        self.session_inflight.insert(session.clone());
        self.dispatch_now(Some(session), batch, work);
    }

    fn start_auth(&mut self) {
        let client_id = self.credentials.client_id("service");
        let secret = self.credentials.secret("service");
        let batch = auth::build_login_batch(&client_id, &secret, &self.agent, &self.host);
        self.enqueue(None, batch, Work::Auth);
    }

    fn start_reconcile(&mut self) {
        for session in self.sessions.clone() {
            let mut batch = stmt::authorize(session.as_str());
            batch.extend(stmt::job("enabled"));
            self.enqueue(Some(session.clone()), batch, Work::ReconcileQuery { session });
        }
    }

    fn go_fatal(&mut self) {
        let now = self.clock.now();
        self.state = SchedulerState::Stopped;
        let deadline = now + FATAL_BACKOFF;
        self.auth_deadline = deadline;
        self.check_deadline = deadline;
        tracing::error!("ERR Continue after 10 seconds");
    }

    fn handle_completion(&mut self, session: Option<SessionId>, work: Work, outcome: BatchOutcome) {
        // Release this session's slot (and dispatch whatever was queued behind it) before
        // running the work-specific callback below — that callback may itself enqueue the
        // session's next batch (e.g. `DoStart` → `DoRun`) and must see the queue as it stands
        // once this batch has truly finished, not before (§4.1, "FIFO per-session ordering").
        self.release_session(session);
        match work {
            Work::Auth => self.on_auth_complete(outcome),
            Work::SignOut => {
                if let Err(e) = outcome {
                    tracing::warn!(error = %e, "signout of login session failed (non-fatal)");
                }
            }
            Work::ReconcileQuery { session } => self.on_reconcile_complete(session, outcome),
            Work::DoStart { session, id, type_code, body } => {
                self.on_do_start_complete(session, id, type_code, body, outcome)
            }
            Work::DoRun { id, type_code, session } => {
                self.on_do_run_complete(session, id, type_code, outcome)
            }
            Work::DoComplete { id } => self.on_transition_complete(id, outcome),
            Work::DoDone { id } => self.on_transition_complete(id, outcome),
            Work::DoAbort { id } => self.on_transition_complete(id, outcome),
            Work::DoCancel { id } => self.on_transition_complete(id, outcome),
            Work::DoFail { id } => self.on_transition_complete(id, outcome),
        }
    }

    fn on_auth_complete(&mut self, outcome: BatchOutcome) {
        let results = match outcome {
            Ok(r) => r,
            Err(_) => return self.go_fatal(),
        };
        let Some(session_rows) = results.first() else { return self.go_fatal() };
        let Some(sessions_rows) = results.get(1) else { return self.go_fatal() };

        match auth::parse_sessions(sessions_rows) {
            Ok(sessions) => {
                self.sessions = sessions;
                self.auth_deadline = self.clock.now() + REAUTH_INTERVAL;
                self.state = SchedulerState::Running;
                if let Some(row) = session_rows.first() {
                    if let Ok(session) = row.text("session") {
                        self.enqueue(None, stmt::signout(&session), Work::SignOut);
                    }
                }
            }
            Err(AuthError::NoSessions) | Err(_) => self.go_fatal(),
        }
    }

    fn on_reconcile_complete(&mut self, session: SessionId, outcome: BatchOutcome) {
        let results = match outcome {
            Ok(r) => r,
            Err(_) => return self.go_fatal(),
        };
        let Some(authorize_rows) = results.first() else { return self.go_fatal() };
        let Some(job_rows) = results.get(1) else { return self.go_fatal() };

        let authorized = authorize_rows.first().map(rows::authorized);
        match authorized {
            Some(Ok(true)) => {}
            Some(Ok(false)) => {
                let err = ReconcileError::NotAuthorized {
                    session: session.to_string(),
                    message: "authorize rejected".to_string(),
                };
                tracing::warn!(%session, error = %err, "reconcile authorize rejected");
                return self.go_fatal();
            }
            _ => return self.go_fatal(),
        }

        for row in job_rows {
            let Ok(Some(job)) = rows::parse_job_row(row) else { continue };
            self.reconcile_one(&session, job);
        }
    }

    fn reconcile_one(&mut self, session: &SessionId, job: Job) {
        let in_registry = self.jobs.contains(&job.id);
        let cancel_result = if job.state == ts_core::JobState::Canceled && in_registry {
            self.jobs.get(&job.id).map(|h| h.cancel())
        } else {
            None
        };

        match reconcile::decide(job.state, in_registry, cancel_result) {
            Action::Start => {
                self.dispatch_do_start(session.clone(), job.id, job.type_code, job.body);
            }
            Action::Abort => self.dispatch_do_abort(session.clone(), job.id),
            Action::Cancel => self.dispatch_do_cancel(session.clone(), job.id),
            Action::Fail(reason) => self.dispatch_do_fail(session.clone(), job.id, reason),
            Action::None => {}
        }
    }

    fn dispatch_do_start(&mut self, session: SessionId, id: JobId, type_code: TypeCode, body: String) {
        let mut batch = stmt::authorize(session.as_str());
        batch.push(stmt::execute_object_action(id.as_uuid(), "execute"));
        self.enqueue(Some(session.clone()), batch, Work::DoStart { session, id, type_code, body });
    }

    fn dispatch_do_run(&mut self, session: SessionId, id: JobId, type_code: TypeCode, body: String) {
        let mut batch = stmt::authorize(session.as_str());
        batch.push(stmt::body_verbatim(&body));
        self.enqueue(Some(session.clone()), batch, Work::DoRun { session, id, type_code });
    }

    fn dispatch_do_complete(&mut self, session: SessionId, id: JobId) {
        let mut batch = stmt::authorize(session.as_str());
        batch.push(stmt::execute_object_action(id.as_uuid(), "complete"));
        self.enqueue(Some(session.clone()), batch, Work::DoComplete { id });
    }

    fn dispatch_do_done(&mut self, session: SessionId, id: JobId) {
        let mut batch = stmt::authorize(session.as_str());
        batch.push(stmt::execute_object_action(id.as_uuid(), "done"));
        self.enqueue(Some(session.clone()), batch, Work::DoDone { id });
    }

    fn dispatch_do_abort(&mut self, session: SessionId, id: JobId) {
        let mut batch = stmt::authorize(session.as_str());
        batch.push(stmt::execute_object_action(id.as_uuid(), "abort"));
        self.enqueue(Some(session.clone()), batch, Work::DoAbort { id });
    }

    fn dispatch_do_cancel(&mut self, session: SessionId, id: JobId) {
        let mut batch = stmt::authorize(session.as_str());
        batch.push(stmt::execute_object_action(id.as_uuid(), "cancel"));
        self.enqueue(Some(session.clone()), batch, Work::DoCancel { id });
    }

    fn dispatch_do_fail(&mut self, session: SessionId, id: JobId, reason: String) {
        let mut batch = stmt::authorize(session.as_str());
        batch.push(stmt::execute_object_action(id.as_uuid(), "fail"));
        batch.push(stmt::set_object_label(id.as_uuid(), &reason));
        self.enqueue(Some(session.clone()), batch, Work::DoFail { id });
    }

    fn on_do_start_complete(
        &mut self,
        session: SessionId,
        id: JobId,
        type_code: TypeCode,
        body: String,
        outcome: BatchOutcome,
    ) {
        match outcome {
            Ok(_) => self.dispatch_do_run(session, id, type_code, body),
            Err(e) => {
                self.jobs.delete(&id);
                tracing::warn!(%id, error = %e, "DoStart failed");
                if e.is_connection_exception() && self.state.is_running() {
                    self.go_fatal();
                }
            }
        }
    }

    fn on_do_run_complete(&mut self, session: SessionId, id: JobId, type_code: TypeCode, outcome: BatchOutcome) {
        // Errors inside DoRun's body execution are non-fatal (§7): they never escalate the
        // scheduler to Stopped, regardless of error tier — the job's own failure is reported
        // via the lifecycle (by staying unreported here; the next reconcile tick will retry
        // or observe whatever terminal state the database now holds).
        self.jobs.delete(&id);
        match outcome {
            Ok(_) => {
                if type_code.is_periodic() {
                    self.dispatch_do_done(session, id);
                } else {
                    self.dispatch_do_complete(session, id);
                }
            }
            Err(e) => tracing::warn!(%id, error = %e, "DoRun body failed (non-fatal)"),
        }
    }

    fn on_transition_complete(&mut self, id: JobId, outcome: BatchOutcome) {
        self.jobs.delete(&id);
        if let Err(e) = outcome {
            tracing::warn!(%id, error = %e, "lifecycle transition failed");
            if e.is_connection_exception() && self.state.is_running() {
                self.go_fatal();
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
