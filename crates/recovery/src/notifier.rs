//! Notification seam for recovery veto emails.
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors generated delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The delivery channel rejected the message.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery channel for recovery veto notifications.
///
/// Implementations must treat the cancel URL as a secret; it embeds
/// the one-time veto token and must never be logged or stored.
#[async_trait]
pub trait RecoveryNotifier: Send + Sync {
    /// Notify an owner that a recovery request was opened against
    /// their account, with the link that cancels it.
    async fn send_recovery_veto_email(
        &self,
        owner_email: &str,
        cancel_url: &Url,
    ) -> std::result::Result<(), NotificationError>;
}

/// Notifier that records deliveries to the tracing log.
///
/// Stand-in for a real mail channel in development deployments. Logs
/// the recipient only, never the cancel URL.
pub struct TracingNotifier;

#[async_trait]
impl RecoveryNotifier for TracingNotifier {
    async fn send_recovery_veto_email(
        &self,
        owner_email: &str,
        _cancel_url: &Url,
    ) -> std::result::Result<(), NotificationError> {
        tracing::info!(
            recipient = %owner_email,
            "recovery::veto_email",
        );
        Ok(())
    }
}
