// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-statement result sets returned by a completed batch (§4.1, `onDone(results)`).
//!
//! Rows are decoded into an owned, column-name-keyed value eagerly, rather than wrapping the
//! driver's row type directly — the driver row borrows its decode state and has no public
//! constructor, which would make it impossible for `FakeGateway` (§8) to hand back synthetic
//! rows in tests without a live connection.

use crate::error::GatewayError;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Uuid(Uuid),
    Bool(bool),
    Null,
}

/// One returned row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    columns: HashMap<String, ColumnValue>,
}

impl ResultRow {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (&'static str, ColumnValue)>) -> Self {
        Self { columns: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect() }
    }

    pub fn text(&self, column: &str) -> Result<String, GatewayError> {
        match self.columns.get(column) {
            Some(ColumnValue::Text(s)) => Ok(s.clone()),
            Some(other) => Err(GatewayError::Dispatch(format!(
                "column {column}: expected text, found {other:?}"
            ))),
            None => Err(GatewayError::Dispatch(format!("column {column}: missing"))),
        }
    }

    pub fn uuid(&self, column: &str) -> Result<Uuid, GatewayError> {
        match self.columns.get(column) {
            Some(ColumnValue::Uuid(u)) => Ok(*u),
            Some(other) => Err(GatewayError::Dispatch(format!(
                "column {column}: expected uuid, found {other:?}"
            ))),
            None => Err(GatewayError::Dispatch(format!("column {column}: missing"))),
        }
    }

    pub fn bool(&self, column: &str) -> Result<bool, GatewayError> {
        match self.columns.get(column) {
            Some(ColumnValue::Bool(b)) => Ok(*b),
            Some(other) => Err(GatewayError::Dispatch(format!(
                "column {column}: expected bool, found {other:?}"
            ))),
            None => Err(GatewayError::Dispatch(format!("column {column}: missing"))),
        }
    }
}

/// Decodes a driver row generically by column type name, so the gateway doesn't need to know
/// each stored procedure's result shape ahead of time.
pub(crate) fn from_pg_row(row: sqlx::postgres::PgRow) -> ResultRow {
    use sqlx::{Column, Row, TypeInfo};

    let mut columns = HashMap::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "UUID" => row
                .try_get::<Option<Uuid>, _>(index)
                .ok()
                .flatten()
                .map(ColumnValue::Uuid),
            "BOOL" => row
                .try_get::<Option<bool>, _>(index)
                .ok()
                .flatten()
                .map(ColumnValue::Bool),
            _ => row
                .try_get::<Option<String>, _>(index)
                .ok()
                .flatten()
                .map(ColumnValue::Text),
        };
        columns.insert(column.name().to_string(), value.unwrap_or(ColumnValue::Null));
    }
    ResultRow { columns }
}

/// Rows returned by one statement within a batch.
pub type ResultSet = Vec<ResultRow>;

/// Ordered per-statement result sets for a whole batch, in dispatch order.
pub type BatchResults = Vec<ResultSet>;

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
