use std::env;
use std::time::Duration;

/// Default upstream endpoint for the EPS tracking API.
const DEFAULT_BASE_URL: &str = "http://api.epspl.co.in/api/Client/TrackingDetail";

/// Default bound on each upstream call, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Storefront domains allowed to call the proxy from a browser.
const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "https://deepikachadha.com",
    "https://kapdadori.com",
    "https://www.deepikachadhaofficial.com",
];

/// Application settings, read from the environment once at startup and passed
/// into the client and server explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    /// EPS API token credential.
    pub token: String,
    /// EPS API user id credential.
    pub user_id: String,
    /// EPS API password credential.
    pub password: String,
    /// Upstream endpoint for tracking lookups.
    pub base_url: String,
    /// Bound on each upstream call.
    pub request_timeout: Duration,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// Fallback log filter when RUST_LOG is unset.
    pub log_level: String,
    /// Listen port for the HTTP front.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            user_id: String::new(),
            password: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            log_level: "info".to_string(),
            port: 8000,
        }
    }
}

impl Settings {
    /// Read settings from the environment, falling back to the defaults for
    /// anything unset or unparseable.
    ///
    /// Variables: `TOKEN`, `USER_ID`, `PASSWORD`, `EPS_BASE_URL`,
    /// `REQUEST_TIMEOUT` (seconds), `CORS_ORIGINS` (comma-separated),
    /// `LOG_LEVEL`, `PORT`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(token) = env::var("TOKEN") {
            settings.token = token;
        }
        if let Ok(user_id) = env::var("USER_ID") {
            settings.user_id = user_id;
        }
        if let Ok(password) = env::var("PASSWORD") {
            settings.password = password;
        }
        if let Ok(base_url) = env::var("EPS_BASE_URL") {
            settings.base_url = base_url;
        }
        if let Some(secs) = env::var("REQUEST_TIMEOUT").ok().and_then(|v| v.parse().ok()) {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            settings.cors_origins = parse_origins(&origins);
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            settings.log_level = level;
        }
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            settings.port = port;
        }

        settings
    }

    /// Names of credential variables that are missing or empty.
    ///
    /// Missing credentials do not prevent startup; they are logged at startup
    /// and surfaced through `/health` as `env_configured: false`.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.token.is_empty() {
            missing.push("TOKEN");
        }
        if self.user_id.is_empty() {
            missing.push("USER_ID");
        }
        if self.password.is_empty() {
            missing.push("PASSWORD");
        }
        missing
    }
}

/// Split a comma-separated origin list, dropping blank entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
