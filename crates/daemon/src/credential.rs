// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution for the Auth Manager (§6, §9A).
//!
//! Kept as a trait — rather than inlined `std::env::var` calls in the auth manager — so
//! tests can substitute a fixed pair instead of depending on the process environment.

/// `ClientId(appName)`, `Secret(appName)` (§6); `appName` is always `"service"` in this
/// daemon but the parameter is kept so a future multi-app credential source isn't a breaking
/// change to the trait.
pub trait CredentialProvider: Send + Sync {
    fn client_id(&self, app_name: &str) -> String;
    fn secret(&self, app_name: &str) -> String;
}

/// Default implementation: `TS_CLIENT_ID` / `TS_CLIENT_SECRET` from the environment.
#[derive(Debug, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn client_id(&self, _app_name: &str) -> String {
        std::env::var("TS_CLIENT_ID").unwrap_or_default()
    }

    fn secret(&self, _app_name: &str) -> String {
        std::env::var("TS_CLIENT_SECRET").unwrap_or_default()
    }
}

/// Fixed pair, for tests.
#[derive(Debug, Clone)]
pub struct FixedCredentialProvider {
    pub client_id: String,
    pub secret: String,
}

impl CredentialProvider for FixedCredentialProvider {
    fn client_id(&self, _app_name: &str) -> String {
        self.client_id.clone()
    }

    fn secret(&self, _app_name: &str) -> String {
        self.secret.clone()
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
