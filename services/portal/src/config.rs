use anyhow::{Context, Result, bail};
use pathexplorer_authz::{GatePolicy, GateProfile, PermissionTable, RoleAllowList};
use pathexplorer_client::MAX_COOKIE_DAYS;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9100";
pub const DEFAULT_DEMO_SECRET: &str = "pathexplorer-demo-secret";

/// Where logins and profile updates are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityBackend {
    Remote,
    Demo,
}

impl IdentityBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityBackend::Remote => "remote",
            IdentityBackend::Demo => "demo",
        }
    }
}

// Portal configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub api_url: String,
    pub backend: IdentityBackend,
    pub gate_profile: GateProfile,
    pub cookie_days: i64,
    pub demo_secret: String,
    /// YAML permission table replacing the built-in one.
    pub permissions_path: Option<String>,
    /// YAML allow-lists checked against the table at startup.
    pub allowlists_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortalConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    api_url: Option<String>,
    backend: Option<IdentityBackend>,
    gate_profile: Option<GateProfile>,
    cookie_days: Option<i64>,
    demo_secret: Option<String>,
    permissions_path: Option<String>,
    allowlists_path: Option<String>,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("PATHEXPLORER_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse PATHEXPLORER_BIND")?;
        let metrics_bind = std::env::var("PATHEXPLORER_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse PATHEXPLORER_METRICS_BIND")?;
        let api_url = std::env::var("PATHEXPLORER_API_URL")
            .unwrap_or_else(|_| pathexplorer_client::ClientConfig::default().api_url);
        let backend = match std::env::var("PATHEXPLORER_BACKEND") {
            Ok(value) => parse_backend(&value)?,
            Err(_) => IdentityBackend::Remote,
        };
        let gate_profile = match std::env::var("PATHEXPLORER_GATE_PROFILE") {
            Ok(value) => value
                .parse()
                .with_context(|| "parse PATHEXPLORER_GATE_PROFILE")?,
            Err(_) => GateProfile::Standard,
        };
        let cookie_days = match std::env::var("PATHEXPLORER_COOKIE_DAYS") {
            Ok(value) => value
                .trim()
                .parse()
                .with_context(|| "parse PATHEXPLORER_COOKIE_DAYS")?,
            Err(_) => pathexplorer_client::ClientConfig::default().cookie_days,
        };
        let demo_secret = std::env::var("PATHEXPLORER_DEMO_SECRET")
            .unwrap_or_else(|_| DEFAULT_DEMO_SECRET.to_string());
        let config = Self {
            bind_addr,
            metrics_bind,
            api_url,
            backend,
            gate_profile,
            cookie_days,
            demo_secret,
            permissions_path: std::env::var("PATHEXPLORER_PERMISSIONS").ok(),
            allowlists_path: std::env::var("PATHEXPLORER_ALLOWLISTS").ok(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("PATHEXPLORER_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read PATHEXPLORER_CONFIG: {path}"))?;
            let override_cfg: PortalConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse portal config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.api_url {
                config.api_url = value;
            }
            if let Some(value) = override_cfg.backend {
                config.backend = value;
            }
            if let Some(value) = override_cfg.gate_profile {
                config.gate_profile = value;
            }
            if let Some(value) = override_cfg.cookie_days {
                config.cookie_days = value;
            }
            if let Some(value) = override_cfg.demo_secret {
                config.demo_secret = value;
            }
            if let Some(value) = override_cfg.permissions_path {
                config.permissions_path = Some(value);
            }
            if let Some(value) = override_cfg.allowlists_path {
                config.allowlists_path = Some(value);
            }
            config.validate()?;
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cookie_days <= 0 {
            bail!("cookie lifetime must be at least one day");
        }
        if self.cookie_days > MAX_COOKIE_DAYS {
            bail!("cookie lifetime must not exceed {MAX_COOKIE_DAYS} days");
        }
        if self.backend == IdentityBackend::Demo && self.demo_secret.is_empty() {
            bail!("demo backend needs a signing secret");
        }
        Ok(())
    }

    /// Demo backend signing with the secret shipped in the source.
    pub fn uses_public_demo_secret(&self) -> bool {
        self.backend == IdentityBackend::Demo && self.demo_secret == DEFAULT_DEMO_SECRET
    }

    /// Build the gate policy, refusing to start when the route table and the
    /// allow-lists disagree.
    ///
    /// The built-in table is checked against the dashboard's historical
    /// allow-lists; a custom table is only checked when allow-lists are
    /// configured next to it.
    pub fn load_policy(&self) -> Result<GatePolicy> {
        let table = match &self.permissions_path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("read permission table: {path}"))?;
                PermissionTable::from_yaml_str(&contents)
                    .with_context(|| format!("parse permission table: {path}"))?
            }
            None => PermissionTable::canonical(),
        };
        let lists = match &self.allowlists_path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("read allow-lists: {path}"))?;
                Some(
                    RoleAllowList::from_yaml_str(&contents)
                        .with_context(|| format!("parse allow-lists: {path}"))?,
                )
            }
            None if self.permissions_path.is_none() => Some(RoleAllowList::legacy()),
            None => None,
        };
        if let Some(lists) = lists {
            table
                .ensure_consistent_with(&lists)
                .context("route policy conflict")?;
        }
        Ok(GatePolicy::new(table, self.gate_profile))
    }
}

fn parse_backend(value: &str) -> Result<IdentityBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "remote" => Ok(IdentityBackend::Remote),
        "demo" => Ok(IdentityBackend::Demo),
        other => bail!("unknown PATHEXPLORER_BACKEND: {other}"),
    }
}
