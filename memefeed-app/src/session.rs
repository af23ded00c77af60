//! The signed-in user, passed around explicitly instead of living in global
//! state.
//!
//! A [`SessionContext`] wraps the hosted authentication provider and
//! publishes every change of the current user to its subscribers.

use memefeed_common::model::{
    Id, ModelValidationError, Timestamp,
    auth::{Credentials, Email, OAuthProvider, Password, Registration},
    user::{Role, User, UserMarker},
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};
use url::Url;

const OAUTH_CALLBACK_PATH: &str = "/auth/callback";

/// Identity as reported by the authentication provider.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthUser {
    pub id: Id<UserMarker>,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<Url>,
    pub created_at: Timestamp,
}

impl From<AuthUser> for User {
    fn from(value: AuthUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
            name: value.name,
            image: value.avatar_url,
            role: Role::User,
            created_at: value.created_at,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),
    #[error("Authentication provider is unavailable: {0}")]
    Unavailable(String),
}

/// The hosted authentication provider.
pub trait AuthProvider: Send + Sync {
    fn current_session(&self)
    -> impl Future<Output = Result<Option<AuthUser>, AuthError>> + Send;

    fn sign_in_with_email(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthUser, AuthError>> + Send;

    fn sign_up_with_email(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthUser, AuthError>> + Send;

    /// Starts an OAuth flow and returns the URL the user has to visit.
    fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &Url,
    ) -> impl Future<Output = Result<Url, AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Changes pushed by the provider outside of any call we made.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    TokenRefreshed(AuthUser),
    UserUpdated(AuthUser),
    SignedOut,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum AuthState {
    #[default]
    Loading,
    SignedOut,
    SignedIn(User),
}

impl AuthState {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            AuthState::Loading | AuthState::SignedOut => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Could not build OAuth redirect: {0}")]
    Redirect(#[from] url::ParseError),
}

impl SessionError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(err) => err.to_string(),
            SessionError::Auth(AuthError::Rejected(message)) => message.clone(),
            SessionError::Auth(AuthError::Unavailable(_)) | SessionError::Redirect(_) => {
                "An unexpected error occurred".to_owned()
            }
        }
    }
}

pub struct SessionContext<A> {
    provider: A,
    state: watch::Sender<AuthState>,
}

/// A live view of the session. Dropping it, or calling
/// [`SessionSubscription::unsubscribe`], stops delivery.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: watch::Receiver<AuthState>,
}

impl SessionSubscription {
    #[must_use]
    pub fn current(&self) -> AuthState {
        self.receiver.borrow().clone()
    }

    /// Waits for the next change. `None` once the context is gone.
    pub async fn changed(&mut self) -> Option<AuthState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}

impl<A: AuthProvider> SessionContext<A> {
    #[must_use]
    pub fn new(provider: A) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self { provider, state }
    }

    /// Resolves the initial state from the provider's stored session.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        match self.provider.current_session().await {
            Ok(Some(user)) => {
                self.publish(AuthState::SignedIn(user.into()));
                Ok(())
            }
            Ok(None) => {
                self.publish(AuthState::SignedOut);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Error getting session");
                self.publish(AuthState::SignedOut);
                Err(err.into())
            }
        }
    }

    pub fn apply(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user)
            | AuthEvent::TokenRefreshed(user)
            | AuthEvent::UserUpdated(user) => self.publish(AuthState::SignedIn(user.into())),
            AuthEvent::SignedOut => self.publish(AuthState::SignedOut),
        }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.state.subscribe(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    pub async fn sign_in_with_email(&self, email: &str, password: String) -> Result<User, SessionError> {
        let credentials = credentials(email, password)?;
        let user: User = self.provider.sign_in_with_email(&credentials).await?.into();

        info!(user_id = %user.id, "Signed in");
        self.publish(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    pub async fn sign_up_with_email(
        &self,
        email: &str,
        password: String,
        name: Option<String>,
    ) -> Result<User, SessionError> {
        let registration = Registration {
            credentials: credentials(email, password)?,
            name: name.filter(|name| !name.trim().is_empty()),
        };
        let user: User = self.provider.sign_up_with_email(&registration).await?.into();

        info!(user_id = %user.id, "Account created");
        self.publish(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    /// `origin` is the site's own base URL; the provider sends the user back to
    /// its OAuth callback route.
    pub async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        origin: &Url,
    ) -> Result<Url, SessionError> {
        let redirect_to = origin.join(OAUTH_CALLBACK_PATH)?;
        let authorize_url = self
            .provider
            .sign_in_with_oauth(provider, &redirect_to)
            .await?;

        debug!(?provider, %authorize_url, "Started OAuth sign-in");
        Ok(authorize_url)
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.provider.sign_out().await?;
        self.publish(AuthState::SignedOut);
        Ok(())
    }

    fn publish(&self, state: AuthState) {
        self.state.send_replace(state);
    }
}

fn credentials(email: &str, password: String) -> Result<Credentials, ModelValidationError> {
    Ok(Credentials {
        email: Email::new(email.trim().to_owned())?,
        password: Password::new(password)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::session::{
        AuthError, AuthEvent, AuthProvider, AuthState, AuthUser, SessionContext, SessionError,
    };
    use memefeed_common::model::{
        Id, Timestamp,
        auth::{Credentials, OAuthProvider, Registration},
    };
    use std::sync::Mutex;
    use time::macros::utc_datetime;
    use url::Url;

    pub(crate) fn auth_user(name: &str) -> AuthUser {
        AuthUser {
            id: Id::generate(),
            email: format!("{name}@example.com"),
            name: Some(name.to_owned()),
            avatar_url: None,
            created_at: Timestamp::new(utc_datetime!(2026-01-01 00:00)),
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeAuth {
        pub(crate) stored: Option<AuthUser>,
        pub(crate) fail_session: bool,
        pub(crate) last_redirect: Mutex<Option<Url>>,
    }

    impl AuthProvider for FakeAuth {
        async fn current_session(&self) -> Result<Option<AuthUser>, AuthError> {
            if self.fail_session {
                Err(AuthError::Unavailable("timeout".into()))
            } else {
                Ok(self.stored.clone())
            }
        }

        async fn sign_in_with_email(&self, credentials: &Credentials) -> Result<AuthUser, AuthError> {
            if credentials.password.expose() == "correct horse" {
                Ok(auth_user("codemaster"))
            } else {
                Err(AuthError::Rejected("Invalid login credentials".into()))
            }
        }

        async fn sign_up_with_email(&self, registration: &Registration) -> Result<AuthUser, AuthError> {
            let mut user = auth_user("newcomer");
            user.email = registration.credentials.email.get().to_owned();
            user.name.clone_from(&registration.name);
            Ok(user)
        }

        async fn sign_in_with_oauth(
            &self,
            provider: OAuthProvider,
            redirect_to: &Url,
        ) -> Result<Url, AuthError> {
            *self.last_redirect.lock().unwrap() = Some(redirect_to.clone());
            Ok(Url::parse(&format!("https://auth.example.com/{provider:?}")).unwrap())
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn initialize_uses_stored_session() {
        let session = SessionContext::new(FakeAuth {
            stored: Some(auth_user("devlife")),
            ..FakeAuth::default()
        });
        assert!(session.state().is_loading());

        session.initialize().await.unwrap();
        let user = session.current_user().unwrap();
        assert_eq!(user.name.as_deref(), Some("devlife"));
    }

    #[tokio::test]
    async fn initialize_failure_signs_out() {
        let session = SessionContext::new(FakeAuth {
            fail_session: true,
            ..FakeAuth::default()
        });

        assert!(session.initialize().await.is_err());
        assert_eq!(session.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn subscribers_see_changes_until_they_unsubscribe() {
        let session = SessionContext::new(FakeAuth::default());
        let mut subscription = session.subscribe();
        assert_eq!(session.subscriber_count(), 1);

        session.apply(AuthEvent::SignedIn(auth_user("testingqueen")));
        let state = subscription.changed().await.unwrap();
        assert_eq!(state.user().unwrap().email, "testingqueen@example.com");

        session.apply(AuthEvent::SignedOut);
        assert_eq!(subscription.changed().await, Some(AuthState::SignedOut));

        subscription.unsubscribe();
        assert_eq!(session.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn credentials_are_validated_before_the_provider() {
        let session = SessionContext::new(FakeAuth::default());

        let err = session
            .sign_in_with_email("not-an-email", "correct horse".into())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));

        let err = session
            .sign_in_with_email("a@example.com", "short".into())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Password must be at least 8 characters");
        assert_eq!(session.state(), AuthState::Loading);
    }

    #[tokio::test]
    async fn sign_in_and_out() {
        let session = SessionContext::new(FakeAuth::default());

        let err = session
            .sign_in_with_email("a@example.com", "wrong password".into())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid login credentials");

        session
            .sign_in_with_email("a@example.com", "correct horse".into())
            .await
            .unwrap();
        assert!(session.current_user().is_some());

        session.sign_out().await.unwrap();
        assert_eq!(session.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn sign_up_drops_blank_names() {
        let session = SessionContext::new(FakeAuth::default());

        let user = session
            .sign_up_with_email("fresh@example.com", "long enough".into(), Some("  ".into()))
            .await
            .unwrap();

        assert_eq!(user.email, "fresh@example.com");
        assert_eq!(user.name, None);
    }

    #[tokio::test]
    async fn oauth_redirects_to_callback() {
        let session = SessionContext::new(FakeAuth::default());
        let origin = Url::parse("https://memes.example.com/top?x=1").unwrap();

        let url = session
            .sign_in_with_oauth(OAuthProvider::Google, &origin)
            .await
            .unwrap();

        assert_eq!(url.as_str(), "https://auth.example.com/Google");
        assert_eq!(
            session.provider.last_redirect.lock().unwrap().as_ref().unwrap().as_str(),
            "https://memes.example.com/auth/callback"
        );
    }
}
