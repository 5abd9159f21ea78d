//! PathExplorer portal entry point.
//!
//! # Purpose
//! Loads configuration, builds the gate policy and identity backend, then
//! serves the portal and the metrics endpoint until shutdown.
use anyhow::Context;
use pathexplorer_client::{ApiClient, AuthBackend, ClientConfig, DemoAuthBackend, HttpAuthBackend};
use portal::app::{AppState, build_router};
use portal::config::{IdentityBackend, PortalConfig};
use portal::observability;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PortalConfig::from_env_or_yaml().context("portal config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: PortalConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("pathexplorer-portal")?;
    let state = build_state(&config)?;
    tracing::info!(
        backend = state.backend_name,
        gate_profile = state.policy.profile().as_str(),
        "gate policy loaded"
    );
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);
    let addr = config.bind_addr;
    tracing::info!(%addr, "portal listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

fn build_state(config: &PortalConfig) -> anyhow::Result<AppState> {
    let policy = config.load_policy()?;
    let backend: Arc<dyn AuthBackend> = match config.backend {
        IdentityBackend::Demo => {
            tracing::warn!("demo identity backend active; built-in accounts have published passwords");
            if config.uses_public_demo_secret() {
                tracing::warn!("demo tokens are signed with the default secret; set PATHEXPLORER_DEMO_SECRET");
            }
            Arc::new(DemoAuthBackend::new(config.demo_secret.as_bytes()))
        }
        IdentityBackend::Remote => {
            let client_config = ClientConfig {
                api_url: config.api_url.clone(),
                cookie_days: config.cookie_days,
                ..ClientConfig::default()
            };
            let api = ApiClient::new(&client_config).context("identity backend client")?;
            Arc::new(HttpAuthBackend::new(Arc::new(api)))
        }
    };
    Ok(AppState {
        policy: Arc::new(policy),
        backend,
        backend_name: config.backend.as_str(),
        cookie_days: config.cookie_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathexplorer_authz::GateProfile;
    use serial_test::serial;

    fn config(backend: IdentityBackend) -> PortalConfig {
        PortalConfig {
            bind_addr: "127.0.0.1:0".parse().expect("bind"),
            metrics_bind: "127.0.0.1:0".parse().expect("metrics"),
            api_url: "http://127.0.0.1:1/api".to_string(),
            backend,
            gate_profile: GateProfile::Standard,
            cookie_days: 7,
            demo_secret: "main-tests".to_string(),
            permissions_path: None,
            allowlists_path: None,
        }
    }

    #[test]
    fn build_state_demo_backend() {
        let state = build_state(&config(IdentityBackend::Demo)).expect("state");
        assert_eq!(state.backend_name, "demo");
        assert_eq!(state.policy.profile(), GateProfile::Standard);
    }

    #[test]
    fn build_state_remote_backend_uses_restricted_profile() {
        let mut config = config(IdentityBackend::Remote);
        config.gate_profile = GateProfile::RestrictedAccess;
        let state = build_state(&config).expect("state");
        assert_eq!(state.backend_name, "remote");
        assert_eq!(state.policy.denied_redirect(), "/restricted-access");
    }

    #[test]
    fn build_state_rejects_missing_permission_file() {
        let mut config = config(IdentityBackend::Demo);
        config.permissions_path = Some("/nonexistent/permissions.yaml".to_string());
        let err = build_state(&config).err().expect("missing file");
        assert!(format!("{err:#}").contains("read permission table"));
    }

    #[tokio::test]
    #[serial]
    async fn run_with_shutdown_starts_and_stops() {
        run_with_shutdown(config(IdentityBackend::Demo), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        })
        .await
        .expect("run should stop cleanly");
    }
}
