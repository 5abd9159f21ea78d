//! Client session runtime for the PathExplorer dashboard.
//!
//! # Purpose
//! Owns the client side of authentication: persisting the credential pair,
//! talking to the identity backend, publishing the reactive session state,
//! and enforcing the render-time gate.
//!
//! # How it fits
//! An application root builds one [`SessionManager`], calls
//! [`SessionManager::init`], then keeps the [`MountedSession`] guard from
//! [`SessionManager::mount`] alive for as long as it is on screen. Views read
//! [`AuthState`] snapshots and ask a [`RenderGate`] whether to render.
//!
//! # Examples
//! ```rust,no_run
//! use pathexplorer_client::{ChannelNavigator, ClientConfig, SessionManager};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env_or_yaml(None)?;
//! let (navigator, mut redirects) = ChannelNavigator::new();
//! let session = Arc::new(SessionManager::remote(&config, Arc::new(navigator))?);
//! session.init().await;
//! let _mounted = session.mount();
//! session.login("ana.garcia@accenture.com", "employee123").await?;
//! while let Some(target) = redirects.recv().await {
//!     println!("rebuild views at {target}");
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod backend;
mod config;
mod cookies;
mod errors;
mod manager;
mod navigator;
mod render_gate;
mod session_store;
mod storage;
mod user;

pub use api::{ApiClient, ApiEnvelope, SessionEvent};
pub use backend::{
    AuthBackend, DEFAULT_DEMO_TOKEN_TTL, DemoAccount, DemoAuthBackend, HttpAuthBackend,
    demo_accounts,
};
pub use config::{ClientConfig, DEFAULT_COOKIE_DAYS, MAX_COOKIE_DAYS};
pub use cookies::{
    CookieJar, TOKEN_COOKIE, USER_COOKIE, cookie_lifetime_days, removal_cookie, session_cookie,
};
pub use errors::{ClientError, ClientResult};
pub use manager::{AuthState, MountedSession, SessionManager};
pub use navigator::{ChannelNavigator, Navigator};
pub use render_gate::{RenderGate, RenderVerdict};
pub use session_store::{Restored, Session, SessionStore, TOKEN_KEY, USER_KEY};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use user::{ProfileUpdate, UserRecord};
