// Client session runtime defaults and env/YAML configuration.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_REVALIDATE_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_LOGOUT_SETTLE: Duration = Duration::from_millis(500);
pub const DEFAULT_COOKIE_DAYS: i64 = 7;
/// Browsers cap cookie lifetimes at 400 days.
pub const MAX_COOKIE_DAYS: i64 = 400;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub revalidate_interval: Duration,
    pub logout_settle: Duration,
    pub cookie_days: i64,
    pub request_timeout: Duration,
    /// Durable storage file; in-memory storage when unset.
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            revalidate_interval: DEFAULT_REVALIDATE_INTERVAL,
            logout_settle: DEFAULT_LOGOUT_SETTLE,
            cookie_days: DEFAULT_COOKIE_DAYS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            storage_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct ClientConfigOverride {
    api_url: Option<String>,
    revalidate_interval_secs: Option<u64>,
    logout_settle_ms: Option<u64>,
    cookie_days: Option<i64>,
    request_timeout_ms: Option<u64>,
    storage_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Env defaults, then the YAML file at `config_path` (or
    /// `PATHEXPLORER_CLIENT_CONFIG`) on top.
    pub fn from_env_or_yaml(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::from_env();
        let override_path = config_path
            .map(|value| value.to_string())
            .or_else(|| std::env::var("PATHEXPLORER_CLIENT_CONFIG").ok());
        if let Some(path) = override_path.as_deref() {
            let contents =
                fs::read_to_string(path).with_context(|| format!("read client config: {path}"))?;
            let override_cfg: ClientConfigOverride =
                serde_yaml::from_str(&contents).context("parse client config yaml")?;
            override_cfg.apply(&mut config);
        }
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("PATHEXPLORER_API_URL")
            && !value.trim().is_empty()
        {
            config.api_url = value.trim().trim_end_matches('/').to_string();
        }
        if let Some(value) = read_u64_env("PATHEXPLORER_REVALIDATE_SECS") {
            config.revalidate_interval = Duration::from_secs(value);
        }
        if let Some(value) = read_u64_env("PATHEXPLORER_LOGOUT_SETTLE_MS") {
            config.logout_settle = Duration::from_millis(value);
        }
        if let Some(value) = read_u64_env("PATHEXPLORER_COOKIE_DAYS") {
            config.cookie_days = i64::try_from(value)
                .unwrap_or(MAX_COOKIE_DAYS)
                .min(MAX_COOKIE_DAYS);
        }
        if let Some(value) = read_u64_env("PATHEXPLORER_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(value);
        }
        if let Ok(value) = std::env::var("PATHEXPLORER_STORAGE_PATH")
            && !value.trim().is_empty()
        {
            config.storage_path = Some(PathBuf::from(value));
        }
        config
    }
}

impl ClientConfigOverride {
    fn apply(self, config: &mut ClientConfig) {
        if let Some(value) = self.api_url
            && !value.trim().is_empty()
        {
            config.api_url = value.trim().trim_end_matches('/').to_string();
        }
        if let Some(value) = self.revalidate_interval_secs
            && value > 0
        {
            config.revalidate_interval = Duration::from_secs(value);
        }
        if let Some(value) = self.logout_settle_ms {
            config.logout_settle = Duration::from_millis(value);
        }
        if let Some(value) = self.cookie_days
            && value > 0
        {
            config.cookie_days = value.min(MAX_COOKIE_DAYS);
        }
        if let Some(value) = self.request_timeout_ms
            && value > 0
        {
            config.request_timeout = Duration::from_millis(value);
        }
        if let Some(value) = self.storage_path {
            config.storage_path = Some(value);
        }
    }
}

fn read_u64_env(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const KEYS: &[&str] = &[
        "PATHEXPLORER_API_URL",
        "PATHEXPLORER_REVALIDATE_SECS",
        "PATHEXPLORER_LOGOUT_SETTLE_MS",
        "PATHEXPLORER_COOKIE_DAYS",
        "PATHEXPLORER_REQUEST_TIMEOUT_MS",
        "PATHEXPLORER_STORAGE_PATH",
        "PATHEXPLORER_CLIENT_CONFIG",
    ];

    fn clear_env() {
        for key in KEYS {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    struct EnvGuard;

    impl EnvGuard {
        fn fresh() -> Self {
            clear_env();
            EnvGuard
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            clear_env();
        }
    }

    #[test]
    #[serial]
    fn defaults_without_env() {
        let _guard = EnvGuard::fresh();
        let config = ClientConfig::from_env();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.revalidate_interval, Duration::from_secs(60));
        assert_eq!(config.logout_settle, Duration::from_millis(500));
        assert_eq!(config.cookie_days, 7);
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        let _guard = EnvGuard::fresh();
        unsafe {
            std::env::set_var("PATHEXPLORER_API_URL", "https://api.example.test/api/");
            std::env::set_var("PATHEXPLORER_REVALIDATE_SECS", "15");
            std::env::set_var("PATHEXPLORER_COOKIE_DAYS", "0");
            std::env::set_var("PATHEXPLORER_STORAGE_PATH", "/tmp/session.json");
        }
        let config = ClientConfig::from_env();
        assert_eq!(config.api_url, "https://api.example.test/api");
        assert_eq!(config.revalidate_interval, Duration::from_secs(15));
        assert_eq!(config.cookie_days, DEFAULT_COOKIE_DAYS);
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/session.json")));
    }

    #[test]
    #[serial]
    fn oversized_cookie_days_are_capped() -> Result<()> {
        let _guard = EnvGuard::fresh();
        unsafe {
            std::env::set_var("PATHEXPLORER_COOKIE_DAYS", u64::MAX.to_string());
        }
        assert_eq!(ClientConfig::from_env().cookie_days, MAX_COOKIE_DAYS);

        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "cookie_days: {}", i64::MAX)?;
        let path = file.path().to_string_lossy().to_string();
        let config = ClientConfig::from_env_or_yaml(Some(&path))?;
        assert_eq!(config.cookie_days, MAX_COOKIE_DAYS);
        Ok(())
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() -> Result<()> {
        let _guard = EnvGuard::fresh();
        unsafe {
            std::env::set_var("PATHEXPLORER_REVALIDATE_SECS", "15");
        }
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "api_url: http://127.0.0.1:9000/api\nrevalidate_interval_secs: 30\nlogout_settle_ms: 0"
        )?;
        let path = file.path().to_string_lossy().to_string();
        let config = ClientConfig::from_env_or_yaml(Some(&path))?;
        assert_eq!(config.api_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.revalidate_interval, Duration::from_secs(30));
        assert_eq!(config.logout_settle, Duration::ZERO);
        Ok(())
    }

    #[test]
    #[serial]
    fn missing_yaml_file_is_an_error() {
        let _guard = EnvGuard::fresh();
        let err = ClientConfig::from_env_or_yaml(Some("/nonexistent/client.yaml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("read client config"));
    }
}
