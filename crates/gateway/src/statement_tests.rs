// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::stmt;
use uuid::Uuid;

#[test]
fn login_batch_binds_four_params_in_order() {
    let batch = stmt::login("client", "secret", "agent", "host");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].params.len(), 4);
    assert!(batch[0].sql.contains("api.login"));
}

#[test]
fn body_verbatim_carries_no_params() {
    let s = stmt::body_verbatim("UPDATE t SET x = 1");
    assert!(s.params.is_empty());
    assert_eq!(s.sql, "UPDATE t SET x = 1");
}

#[test]
fn execute_object_action_binds_uuid_then_text() {
    let id = Uuid::new_v4();
    let s = stmt::execute_object_action(id, "enabled");
    assert_eq!(s.params.len(), 2);
}
