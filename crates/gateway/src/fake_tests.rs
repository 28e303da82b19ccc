// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::statement::stmt;

#[tokio::test]
async fn replays_scripted_outcomes_in_fifo_order() {
    let fake = FakeGateway::new();
    fake.push_outcome(Ok(Vec::new()));
    fake.push_outcome(Err(crate::error::GatewayError::Dispatch("boom".into())));

    let (_h1, rx1) = fake.exec_batch(stmt::job("enabled"));
    assert!(rx1.await.unwrap().is_ok());

    let (_h2, rx2) = fake.exec_batch(stmt::job("enabled"));
    assert!(rx2.await.unwrap().is_err());

    assert_eq!(fake.dispatched.lock().len(), 2);
}

#[tokio::test]
async fn defaults_to_empty_ok_outcome_when_nothing_scripted() {
    let fake = FakeGateway::new();
    let (_h, rx) = fake.exec_batch(stmt::job("enabled"));
    assert!(rx.await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn scripted_refusal_surfaces_as_already_committed() {
    let fake = FakeGateway::new();
    fake.push_cancel(ScriptedCancel::RefusedBecause("already committed".into()));
    let (handle, _rx) = fake.exec_batch(stmt::job("enabled"));

    assert_eq!(handle.cancel(), Err("already committed".to_string()));
}

#[tokio::test]
async fn scripted_success_allows_cancel() {
    let fake = FakeGateway::new();
    fake.push_cancel(ScriptedCancel::Succeeds);
    let (handle, _rx) = fake.exec_batch(stmt::job("enabled"));

    assert_eq!(handle.cancel(), Ok(()));
}
