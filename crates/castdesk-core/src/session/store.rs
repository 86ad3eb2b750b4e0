use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::claims::{self, Claims};
use super::validate::validate_registration;
use crate::api::ApiClient;
use crate::clock::Clock;
use crate::error::AuthError;
use crate::storage::{TokenStore, mask_token};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const SESSION_EXPIRED: &str = "Session expired";
pub const SAVE_FAILED: &str = "Failed to save session";

/// Snapshot of the authentication state.
///
/// `is_authenticated` holds exactly when `token` is present and its expiry
/// claim is strictly in the future as of the last transition.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub claims: Option<Claims>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

impl Session {
    fn authenticated(token: String, claims: Claims) -> Self {
        Self {
            token: Some(token),
            claims: Some(claims),
            is_authenticated: true,
            is_loading: false,
            last_error: None,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_deref().map(mask_token))
            .field("claims", &self.claims)
            .field("is_authenticated", &self.is_authenticated)
            .field("is_loading", &self.is_loading)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Result of reading the persisted token at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// A valid token was found; the session is authenticated.
    Restored,
    /// The stored token had expired and was purged.
    Expired,
    /// The stored token could not be decoded and was purged.
    Malformed,
    /// Nothing was stored.
    Absent,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "AUsername")]
    username: &'a str,
    #[serde(rename = "APassword")]
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    #[serde(rename = "AEmail")]
    email: &'a str,
    #[serde(rename = "AUsername")]
    username: &'a str,
    #[serde(rename = "APassword")]
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Process-wide session state container.
///
/// Cloning yields another handle to the same session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    session: Mutex<Session>,
    token_present: watch::Sender<bool>,
}

impl SessionStore {
    /// Creates an unauthenticated store. Call [`SessionStore::hydrate`] to
    /// pick up a persisted token.
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        let (token_present, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                api,
                tokens,
                clock,
                session: Mutex::new(Session::default()),
                token_present,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> u64 {
        self.inner.clock.now_secs()
    }

    fn publish(&self, session: &Session) {
        self.inner.token_present.send_replace(session.has_token());
    }

    fn purge_persisted(&self) {
        if let Err(e) = self.inner.tokens.clear() {
            warn!("failed to clear stored token: {e:#}");
        }
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated
    }

    /// Watch channel reporting whether a token is present.
    pub fn subscribe_token(&self) -> watch::Receiver<bool> {
        self.inner.token_present.subscribe()
    }

    /// Loads the persisted token, keeping it only if it is still valid.
    pub fn hydrate(&self) -> Hydration {
        let stored = match self.inner.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("failed to read stored token: {e:#}");
                None
            }
        };

        let mut session = self.lock();
        let outcome = match stored {
            None => {
                *session = Session::default();
                Hydration::Absent
            }
            Some(token) => match claims::decode(&token) {
                None => {
                    warn!("stored token is malformed; discarding");
                    self.purge_persisted();
                    *session = Session::default();
                    Hydration::Malformed
                }
                Some(claims) if claims.is_expired(self.now()) => {
                    info!("stored token has expired; discarding");
                    self.purge_persisted();
                    *session = Session::default();
                    Hydration::Expired
                }
                Some(claims) => {
                    debug!(token = %mask_token(&token), "session restored");
                    *session = Session::authenticated(token, claims);
                    Hydration::Restored
                }
            },
        };
        self.publish(&session);
        outcome
    }

    /// Exchanges credentials for a token and authenticates.
    ///
    /// A failure records `last_error` and leaves any existing session as is.
    ///
    /// # Errors
    /// Returns an error if the request fails, the server rejects the
    /// credentials, the token cannot be decoded or persisted.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        {
            let mut session = self.lock();
            session.is_loading = true;
            session.last_error = None;
        }
        info!(username, "login requested");

        let result = self
            .inner
            .api
            .post_public::<_, LoginResponse>("/login", &LoginRequest { username, password })
            .await;

        let mut session = self.lock();
        session.is_loading = false;

        let token = match result {
            Ok(response) => response.token,
            Err(source) => {
                let err = AuthError::Api {
                    message: source.user_message(LOGIN_FAILED),
                    source,
                };
                warn!(username, "login failed: {err}");
                session.last_error = Some(err.message().to_string());
                return Err(err);
            }
        };

        let claims = match claims::decode(&token) {
            Some(claims) if !claims.is_expired(self.now()) => claims,
            _ => {
                warn!(username, "login returned an unusable token");
                session.last_error = Some(LOGIN_FAILED.to_string());
                return Err(AuthError::MalformedToken {
                    message: LOGIN_FAILED.to_string(),
                });
            }
        };

        if let Err(e) = self.inner.tokens.save(&token) {
            warn!("failed to persist token: {e:#}");
            session.last_error = Some(SAVE_FAILED.to_string());
            return Err(AuthError::Storage {
                message: SAVE_FAILED.to_string(),
            });
        }

        info!(username, exp = ?claims.exp, "login succeeded");
        *session = Session::authenticated(token, claims);
        self.publish(&session);
        Ok(session.clone())
    }

    /// Creates an account. Does not authenticate the caller.
    ///
    /// # Errors
    /// Returns a validation error without any request when a field fails
    /// its pre-check, else an error if the server rejects the account.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if let Err(err) = validate_registration(email, username, password) {
            debug!(field = err.field, "registration rejected locally");
            self.lock().last_error = Some(err.message.clone());
            return Err(err.into());
        }

        {
            let mut session = self.lock();
            session.is_loading = true;
            session.last_error = None;
        }

        let result = self
            .inner
            .api
            .post_public::<_, Value>(
                "/register",
                &RegisterRequest {
                    email,
                    username,
                    password,
                },
            )
            .await;

        let mut session = self.lock();
        session.is_loading = false;
        match result {
            Ok(_) => {
                info!(username, "account registered");
                Ok(())
            }
            Err(source) => {
                let err = AuthError::Api {
                    message: source.user_message(REGISTRATION_FAILED),
                    source,
                };
                warn!(username, "registration failed: {err}");
                session.last_error = Some(err.message().to_string());
                Err(err)
            }
        }
    }

    /// Clears the persisted token and every session field. Idempotent.
    pub fn logout(&self) {
        self.purge_persisted();
        let mut session = self.lock();
        if session.has_token() {
            info!("logged out");
        }
        *session = Session::default();
        self.publish(&session);
    }

    /// Clears the session with `last_error = "Session expired"` when the
    /// token's expiry has passed or cannot be read. No-op without a token.
    ///
    /// Returns true when the session was cleared by this call.
    pub fn check_expiry(&self) -> bool {
        let mut session = self.lock();
        let Some(token) = session.token.as_deref() else {
            return false;
        };
        let now = self.now();
        if !claims::decode(token).is_none_or(|c| c.is_expired(now)) {
            return false;
        }

        info!("session expired");
        self.purge_persisted();
        *session = Session {
            last_error: Some(SESSION_EXPIRED.to_string()),
            ..Session::default()
        };
        self.publish(&session);
        true
    }

    pub fn clear_error(&self) {
        self.lock().last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::clock::ManualClock;
    use crate::session::claims::encode_unsigned;
    use crate::storage::MemoryTokenStore;

    const NOW: u64 = 1_700_000_000;

    fn store_with(token: Option<&str>) -> (SessionStore, Arc<MemoryTokenStore>, ManualClock) {
        let tokens = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let clock = ManualClock::new(NOW);
        let token_store = Arc::clone(&tokens) as Arc<dyn TokenStore>;
        let api = ApiClient::new(
            "http://127.0.0.1:9",
            Duration::from_secs(1),
            Arc::clone(&token_store),
        )
        .unwrap();
        let store = SessionStore::new(api, token_store, Arc::new(clock.clone()));
        (store, tokens, clock)
    }

    fn token_expiring_at(exp: u64) -> String {
        encode_unsigned(&json!({ "exp": exp, "username": "ops" }))
    }

    #[test]
    fn test_hydrate_restores_valid_token() {
        let token = token_expiring_at(NOW + 60);
        let (store, _, _) = store_with(Some(&token));
        assert_eq!(store.hydrate(), Hydration::Restored);
        let session = store.snapshot();
        assert!(session.is_authenticated);
        assert_eq!(session.token.as_deref(), Some(token.as_str()));
        assert_eq!(session.claims.unwrap().username.as_deref(), Some("ops"));
        assert!(*store.subscribe_token().borrow());
    }

    #[test]
    fn test_hydrate_purges_expired_and_malformed_tokens() {
        let (store, tokens, _) = store_with(Some(&token_expiring_at(NOW)));
        assert_eq!(store.hydrate(), Hydration::Expired);
        assert!(!store.is_authenticated());
        assert_eq!(tokens.load().unwrap(), None);

        let (store, tokens, _) = store_with(Some("garbage"));
        assert_eq!(store.hydrate(), Hydration::Malformed);
        assert!(!store.is_authenticated());
        assert_eq!(tokens.load().unwrap(), None);

        let (store, _, _) = store_with(None);
        assert_eq!(store.hydrate(), Hydration::Absent);
        assert_eq!(store.snapshot(), Session::default());
    }

    #[test]
    fn test_check_expiry_is_idempotent() {
        let (store, tokens, clock) = store_with(Some(&token_expiring_at(NOW + 10)));
        store.hydrate();
        assert!(!store.check_expiry());
        assert!(store.is_authenticated());

        clock.advance(10);
        assert!(store.check_expiry());
        let once = store.snapshot();
        assert!(!store.check_expiry());
        assert_eq!(store.snapshot(), once);
        assert_eq!(once.last_error.as_deref(), Some(SESSION_EXPIRED));
        assert_eq!(once.token, None);
        assert_eq!(tokens.load().unwrap(), None);
        assert!(!*store.subscribe_token().borrow());
    }

    #[test]
    fn test_check_expiry_without_session_is_noop() {
        let (store, _, _) = store_with(None);
        assert!(!store.check_expiry());
        assert_eq!(store.snapshot(), Session::default());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (store, tokens, _) = store_with(Some(&token_expiring_at(NOW + 60)));
        store.hydrate();
        store.logout();
        store.logout();
        assert_eq!(store.snapshot(), Session::default());
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_register_validation_skips_network() {
        let (store, _, _) = store_with(None);
        let err = store.register("nope", "ops", "hunter22").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref v) if v.field == "email"));
        assert_eq!(store.snapshot().last_error.as_deref(), Some(err.message()));
        assert!(!store.snapshot().is_loading);
    }

    #[test]
    fn test_debug_masks_token() {
        let session = Session {
            token: Some("eyJhbGciOiJIUzI1NiJ9.secret.sig".to_string()),
            ..Session::default()
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
    }
}
