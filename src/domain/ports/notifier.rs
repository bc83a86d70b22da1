//! Notifier port: formats digests/failures to the chat transport sidecar
//! (out of scope; this is the narrow interface the core calls through).

use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, channel: &str, message: &str);
}

/// No-op notifier for configurations without a chat transport wired up.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, channel: &str, message: &str) {
        tracing::info!(channel, message, "notify (no transport configured)");
    }
}
