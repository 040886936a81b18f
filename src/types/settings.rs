use serde::{Deserialize, Serialize};

/// Top-level client settings, persisted as JSON at the platform config path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub backend: BackendSettings,
    pub general: GeneralSettings,
}

/// Connection settings for the hosted backend platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the backend project, e.g. `https://xyz.example.dev`.
    pub project_url: String,
    /// Public API key sent with every request.
    pub api_key: String,
    /// Third-party OAuth provider the backend signs users in through.
    pub oauth_provider: String,
    /// Per-request timeout for REST calls (the live feed is exempt).
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Default tracing filter, overridable via the environment.
    pub log_filter: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            general: GeneralSettings::default(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            project_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            oauth_provider: "github".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_filter: "livemark=info".to_string(),
        }
    }
}
