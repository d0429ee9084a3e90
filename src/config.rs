use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "healthportal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gateway address used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Dashboard reconciliation poll period.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// TCP connect timeout. Requests themselves are unbounded unless configured.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,healthportal=debug"
}

/// Runtime configuration for the portal client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Gateway base URL, without trailing slash.
    pub base_url: String,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    /// `None` leaves requests without an overall deadline.
    pub request_timeout: Option<Duration>,
    /// Attach an `Idempotency-Key` header to mutating calls.
    pub idempotency_keys: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: None,
            idempotency_keys: true,
        }
    }
}

impl PortalConfig {
    /// Config pointing at `base_url`, defaults elsewhere.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `HEALTHPORTAL_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup (tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("HEALTHPORTAL_BASE_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Some(secs) = parse_secs(&lookup, "HEALTHPORTAL_POLL_SECS") {
            if secs > 0 {
                config.poll_interval = Duration::from_secs(secs);
            } else {
                tracing::warn!("HEALTHPORTAL_POLL_SECS must be positive, keeping default");
            }
        }
        if let Some(secs) = parse_secs(&lookup, "HEALTHPORTAL_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs(&lookup, "HEALTHPORTAL_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(raw) = lookup("HEALTHPORTAL_IDEMPOTENCY_KEYS") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.idempotency_keys = true,
                "0" | "false" | "no" | "off" => config.idempotency_keys = false,
                other => tracing::warn!(value = other, "Unrecognized HEALTHPORTAL_IDEMPOTENCY_KEYS"),
            }
        }

        config
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable duration");
            None
        }
    }
}
