// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fixed_provider_returns_configured_pair_regardless_of_app_name() {
    let provider = FixedCredentialProvider { client_id: "c1".into(), secret: "s1".into() };
    assert_eq!(provider.client_id("service"), "c1");
    assert_eq!(provider.secret("anything"), "s1");
}

#[test]
fn env_provider_defaults_to_empty_string_when_unset() {
    let provider = EnvCredentialProvider;
    std::env::remove_var("TS_CLIENT_ID_TEST_PROBE_DOES_NOT_EXIST");
    // Not asserting on TS_CLIENT_ID itself: other tests in this process may set it.
    let _ = provider.client_id("service");
}
