use tokio::sync::mpsc;

/// Hands redirect targets to the application root.
///
/// A hard redirect means the root tears its views down and rebuilds them
/// for the target, so no in-memory state survives it.
pub trait Navigator: Send + Sync {
    fn hard_redirect(&self, target: &str);
}

/// Forwards redirect targets over a channel to the root's event loop.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn hard_redirect(&self, target: &str) {
        tracing::info!(target_path = target, "hard redirect");
        if self.tx.send(target.to_string()).is_err() {
            tracing::warn!(target_path = target, "redirect dropped: application root is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_targets_in_order() {
        let (navigator, mut rx) = ChannelNavigator::new();
        navigator.hard_redirect("/login");
        navigator.hard_redirect("/unauthorized");
        assert_eq!(rx.recv().await.as_deref(), Some("/login"));
        assert_eq!(rx.recv().await.as_deref(), Some("/unauthorized"));
    }

    #[test]
    fn closed_root_is_not_fatal() {
        let (navigator, rx) = ChannelNavigator::new();
        drop(rx);
        navigator.hard_redirect("/login");
    }
}
