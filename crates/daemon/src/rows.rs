// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses `api.job` result rows into `ts_core::Job` values (§6: `(id, typecode, statecode,
//! body, ...)`). Kept here rather than in `ts-core` since it depends on the gateway's row
//! type, and `ts-core` must stay gateway-agnostic (§4.3).

use crate::error::ReconcileError;
use ts_core::{Job, JobId, JobState, TypeCode};
use ts_gateway::{GatewayError, ResultRow};

pub fn parse_job_row(row: &ResultRow) -> Result<Option<Job>, ReconcileError> {
    let id = row.uuid("id").map_err(to_reconcile_error)?;
    let type_code = row.text("typecode").map_err(to_reconcile_error)?;
    let state_code = row.text("statecode").map_err(to_reconcile_error)?;
    let body = row.text("body").map_err(to_reconcile_error)?;

    let Some(state) = JobState::parse(&state_code) else {
        // Unrecognized state_code: not a driver input, ignore (§4.4, "anything else").
        return Ok(None);
    };

    Ok(Some(Job { id: JobId::from(id), type_code: TypeCode::new(type_code), state, body }))
}

fn to_reconcile_error(e: GatewayError) -> ReconcileError {
    ReconcileError::Gateway(e)
}

pub fn authorized(row: &ResultRow) -> Result<bool, GatewayError> {
    match row.text("authorized") {
        Ok(s) => Ok(s == "t" || s == "true"),
        Err(_) => row.bool("authorized"),
    }
}

#[cfg(test)]
#[path = "rows_tests.rs"]
mod tests;
