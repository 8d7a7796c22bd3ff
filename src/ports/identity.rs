use async_trait::async_trait;

/// Credential authority. Profile data never lives here; the provider only
/// maps an email/secret pair to a stable user id.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Creates credentials for a new account and returns its user id.
    async fn register(&self, email: &str, secret: &str) -> Result<String, IdentityError>;

    /// Verifies credentials and returns the user id they belong to.
    async fn sign_in(&self, email: &str, secret: &str) -> Result<String, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("this email is already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity provider error: {0}")]
    Backend(String),
}
