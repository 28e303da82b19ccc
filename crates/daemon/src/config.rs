// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-sourced daemon configuration (§6, §9A).

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HEARTBEAT_MS: u64 = 1000;
const MIN_HEARTBEAT_MS: u64 = 100;
const DEFAULT_POOL_MIN: u32 = 1;
const DEFAULT_AGENT: &str = "Task Scheduler";

/// Parsed once at process start; never mutated afterward (§3, "Ambient data").
///
/// `TS_USER`/`TS_GROUP` are accepted on the command line for configuration-surface
/// compatibility but deliberately have no field here — privilege drop is a documented
/// Non-goal (§1) and they are never read back.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub heartbeat_interval: Duration,
    pub database_url: Option<String>,
    pub database_pool_min: u32,
    pub agent: String,
    pub host: String,
    pub log_path: PathBuf,
}

impl DaemonConfig {
    /// Never panics: unset or unparseable values fall back to documented defaults. Only the
    /// live-database binary entry point requires `database_url` to actually be present —
    /// tests construct the scheduler directly without calling `load`.
    pub fn load() -> Self {
        Self {
            heartbeat_interval: heartbeat_interval(),
            database_url: std::env::var("TS_DATABASE_URL").ok(),
            database_pool_min: database_pool_min(),
            agent: std::env::var("TS_AGENT").unwrap_or_else(|_| DEFAULT_AGENT.to_string()),
            host: host(),
            log_path: log_path(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_MS),
            database_url: None,
            database_pool_min: DEFAULT_POOL_MIN,
            agent: DEFAULT_AGENT.to_string(),
            host: host(),
            log_path: default_log_path(),
        }
    }
}

fn heartbeat_interval() -> Duration {
    let ms = std::env::var("TS_HEARTBEAT_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_HEARTBEAT_MS);
    Duration::from_millis(ms.max(MIN_HEARTBEAT_MS))
}

fn database_pool_min() -> u32 {
    std::env::var("TS_DATABASE_POOL_MIN")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_POOL_MIN)
}

fn host() -> String {
    std::env::var("TS_HOST").unwrap_or_else(|_| {
        hostname_fallback()
    })
}

fn hostname_fallback() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

fn log_path() -> PathBuf {
    std::env::var("TS_LOG_PATH").map(PathBuf::from).unwrap_or_else(|_| default_log_path())
}

fn default_log_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".local/state/taskscheduler/daemon.log")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
