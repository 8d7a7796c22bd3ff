pub mod identity;
pub mod mail;
pub mod store;
pub mod time;

pub use identity::IdentityProvider;
pub use mail::Mailer;
pub use store::DocumentStore;
pub use time::Clock;
