//! External service integrations.

pub mod auth;
pub mod notifier;

pub use auth::HostedAuthClient;
pub use notifier::InboxNotifier;
