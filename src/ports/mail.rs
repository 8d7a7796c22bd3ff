use async_trait::async_trait;

/// Outbound mail channel. Delivery is best-effort: callers log failures and
/// never propagate them to the write that triggered the mail.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MailError(pub String);
