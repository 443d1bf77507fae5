use std::time::Duration;

/// Builds a client with the given per-request timeout, falling back to the
/// default client if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("exercia/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("⚠️  Failed to build HTTP client ({}), using defaults", e);
            reqwest::Client::new()
        })
}

/// Joins a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
