//! Credentials passed to the request client at construction time.

/// Base URL used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.billingo.hu/v3";

/// API key plus optional base URL override.
///
/// Read-only once handed to a `RequestClient`. An empty API key counts as
/// absent, as does an empty base URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Credentials with no API key. Every request fails with
    /// `BillingoError::Configuration`.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_empty(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = non_empty(base_url.into());
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Explicit override if set, otherwise `DEFAULT_BASE_URL`. Never ends
    /// with a slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
