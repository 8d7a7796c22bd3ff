pub mod memory;

pub use memory::MemoryStore;

use crate::ports;
use crate::ports::identity::IdentityError;
use crate::ports::mail::MailError;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use rand::rngs::OsRng;
use time::OffsetDateTime;

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ports::Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Credential registry backed by process memory. Secrets are stored as
/// argon2 hashes and the returned account id doubles as the user id.
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
}

#[derive(Debug, Clone)]
struct Account {
    id: String,
    secret_hash: String,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ports::IdentityProvider for MemoryIdentity {
    async fn register(&self, email: &str, secret: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        let secret_hash = Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|err| IdentityError::Backend(err.to_string()))?
            .to_string();

        let mut accounts = self.accounts.lock().expect("accounts lock");
        if accounts.contains_key(email) {
            return Err(IdentityError::EmailTaken);
        }
        let id = crate::ports::store::auto_id();
        accounts.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                secret_hash,
            },
        );
        Ok(id)
    }

    async fn sign_in(&self, email: &str, secret: &str) -> Result<String, IdentityError> {
        let account = {
            let accounts = self.accounts.lock().expect("accounts lock");
            accounts
                .get(email)
                .cloned()
                .ok_or(IdentityError::InvalidCredentials)?
        };
        let parsed = PasswordHash::new(&account.secret_hash)
            .map_err(|err| IdentityError::Backend(err.to_string()))?;
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .map_err(|_| IdentityError::InvalidCredentials)?;
        Ok(account.id)
    }
}

/// Mailer that records deliveries in the log instead of sending them.
/// Stands in for an SMTP adapter in development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl ports::Mailer for LogMailer {
    async fn send(&self, to: &[String], subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::info!(recipients = to.len(), subject, "mail delivered to log");
        Ok(())
    }
}
