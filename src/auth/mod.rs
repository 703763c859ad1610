//! Authentication - email/password sign-in against a remote identity provider.
//!
//! The provider owns the real session; this module only tracks whether a user is signed
//! in and the last error to show. Provider error codes are translated through a fixed
//! message table.

/// Identity provider trait and the REST implementation
pub mod provider;
/// Session state, credential checks and error messages
pub mod session;

pub use provider::{AuthUser, IdentityProvider, ProviderError, RestIdentityProvider};
pub use session::{AuthSession, AuthSessions, AuthState};
