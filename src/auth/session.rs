//! Session state held on behalf of a user.
//!
//! [`AuthSession`] publishes its [`AuthState`] through a `watch` channel so views can
//! react to sign-in and sign-out. Failures never escalate: they end up as the state's
//! error text and as an [`Error::Auth`] carrying the same message.

use crate::{
    auth::provider::{AuthUser, IdentityProvider, ProviderError},
    errors::{Error, Result},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};

// Literal pattern; compiled by the email validation tests.
#[allow(clippy::expect_used)]
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Minimum password length accepted before calling the provider.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Shown for any provider code not in the table.
pub const FALLBACK_MESSAGE: &str = "Authentication failed. Please try again.";
/// Shown when the provider cannot be reached.
pub const NETWORK_MESSAGE: &str = "Could not reach the sign-in service. Please try again later.";

const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
const SHORT_PASSWORD_MESSAGE: &str = "Password should be at least 6 characters.";

/// Translates a provider error code into the message shown to the user.
#[must_use]
pub fn message_for_code(code: &str) -> &'static str {
    match code {
        "EMAIL_NOT_FOUND" => "No account found with this email.",
        "INVALID_PASSWORD" => "Incorrect password.",
        "INVALID_LOGIN_CREDENTIALS" => "Incorrect email or password.",
        "EMAIL_EXISTS" => "An account with this email already exists.",
        "WEAK_PASSWORD" => SHORT_PASSWORD_MESSAGE,
        "USER_DISABLED" => "This account has been disabled.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Please try again later.",
        "INVALID_EMAIL" => INVALID_EMAIL_MESSAGE,
        _ => FALLBACK_MESSAGE,
    }
}

fn message_for(error: &ProviderError) -> &'static str {
    match error {
        ProviderError::Rejected { code } => message_for_code(code),
        ProviderError::Transport(_) => NETWORK_MESSAGE,
    }
}

/// Checks email format and password length before any network call.
pub fn validate_credentials(email: &str, password: &str) -> std::result::Result<(), &'static str> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(INVALID_EMAIL_MESSAGE);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(SHORT_PASSWORD_MESSAGE);
    }
    Ok(())
}

/// What the presentation layer knows about the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// The signed-in user, if any
    pub user: Option<AuthUser>,
    /// Message from the last failed attempt
    pub error: Option<String>,
    /// True while a provider call is running
    pub in_flight: bool,
}

impl AuthState {
    /// True when a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    SignIn,
    SignUp,
}

/// One user's session against an identity provider.
#[derive(Debug)]
pub struct AuthSession<P> {
    provider: P,
    state: watch::Sender<AuthState>,
}

impl<P: IdentityProvider> AuthSession<P> {
    /// Creates a signed-out session.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: watch::Sender::new(AuthState::default()),
        }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Signs in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.authenticate(Action::SignIn, email, password).await
    }

    /// Creates an account and signs it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.authenticate(Action::SignUp, email, password).await
    }

    /// Forgets the signed-in user.
    pub fn sign_out(&self) {
        self.state.send_replace(AuthState::default());
        info!("Signed out");
    }

    async fn authenticate(&self, action: Action, email: &str, password: &str) -> Result<AuthUser> {
        if let Err(message) = validate_credentials(email, password) {
            return Err(self.fail(message));
        }

        self.state.send_modify(|state| {
            state.in_flight = true;
            state.error = None;
        });

        let email = email.trim();
        let outcome = match action {
            Action::SignIn => self.provider.sign_in(email, password).await,
            Action::SignUp => self.provider.sign_up(email, password).await,
        };

        match outcome {
            Ok(user) => {
                info!("{action:?} succeeded for {}", user.email);
                self.state.send_replace(AuthState {
                    user: Some(user.clone()),
                    error: None,
                    in_flight: false,
                });
                Ok(user)
            }
            Err(error) => {
                warn!("{action:?} failed: {error:?}");
                Err(self.fail(message_for(&error)))
            }
        }
    }

    fn fail(&self, message: &str) -> Error {
        self.state.send_modify(|state| {
            state.in_flight = false;
            state.error = Some(message.to_string());
        });
        Error::Auth {
            message: message.to_string(),
        }
    }
}

/// Sessions keyed by chat user id, created on first use.
#[derive(Debug)]
pub struct AuthSessions<P> {
    provider: P,
    sessions: Mutex<HashMap<u64, Arc<AuthSession<P>>>>,
}

impl<P: IdentityProvider + Clone> AuthSessions<P> {
    /// Creates an empty registry that hands `provider` to every new session.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The session for `user_id`, created signed-out if it does not exist yet.
    pub fn session(&self, user_id: u64) -> Arc<AuthSession<P>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            sessions
                .entry(user_id)
                .or_insert_with(|| Arc::new(AuthSession::new(self.provider.clone()))),
        )
    }

    /// True if `user_id` has a signed-in session.
    pub fn is_signed_in(&self, user_id: u64) -> bool {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(&user_id)
            .is_some_and(|session| session.state().is_authenticated())
    }
}
