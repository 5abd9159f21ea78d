//! Render-time gate: re-checks a page against the session after mount.
use crate::{AuthState, Navigator};
use pathexplorer_authz::{GateKind, GatePolicy, evaluate, record_decision};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderVerdict {
    /// Session state is still being restored; show a loading indicator.
    Loading,
    Render,
    Redirect(&'static str),
}

#[derive(Debug, Clone)]
pub struct RenderGate {
    policy: Arc<GatePolicy>,
}

impl RenderGate {
    pub fn new(policy: Arc<GatePolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Decide from the reactive session state. Uses the same evaluation as
    /// the request-time gate.
    pub fn check(&self, state: &AuthState, path: &str) -> RenderVerdict {
        if state.is_loading && !self.policy.table().is_public(path) {
            return RenderVerdict::Loading;
        }
        let role = state.role();
        let decision = evaluate(&self.policy, path, role);
        record_decision(GateKind::Render, path, role, decision);
        match decision.redirect_target(&self.policy) {
            Some(target) => RenderVerdict::Redirect(target),
            None => RenderVerdict::Render,
        }
    }

    /// [`check`](Self::check), then hand any redirect to `navigator`.
    pub fn enforce(&self, state: &AuthState, path: &str, navigator: &dyn Navigator) -> RenderVerdict {
        let verdict = self.check(state, path);
        if let RenderVerdict::Redirect(target) = verdict {
            navigator.hard_redirect(target);
        }
        verdict
    }
}
