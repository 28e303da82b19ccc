// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ts-gateway: the database gateway (§4.1) — a pooled, transactional, cancellable way to
//! dispatch ordered batches of stored-procedure calls to the api schema.

mod error;
mod fake;
mod gateway;
mod result;
mod statement;

pub use error::GatewayError;
pub use fake::{FakeGateway, ScriptedCancel};
pub use gateway::{BatchOutcome, Dispatch, Gateway, Handle};
pub use result::{BatchResults, ColumnValue, ResultRow, ResultSet};
pub use statement::{stmt, Batch, Param, Statement};
