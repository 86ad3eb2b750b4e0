//! Route guard: admits protected content only for an authenticated session
//! and keeps re-checking token expiry while mounted.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::session::{Session, SessionStore};

pub const LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// An authentication request is in flight; neither admit nor redirect.
    Wait,
    Admit,
    Redirect { to: &'static str },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn decide(session: &Session) -> GuardDecision {
        if session.is_loading {
            GuardDecision::Wait
        } else if session.is_authenticated {
            GuardDecision::Admit
        } else {
            GuardDecision::Redirect { to: LOGIN_ROUTE }
        }
    }

    /// Starts the periodic expiry watch.
    ///
    /// When a token is present, `check_expiry` runs immediately and then every
    /// `interval`. The watch ends when the handle is unmounted or dropped, or
    /// once the session no longer holds a token. Must be called from within a
    /// tokio runtime.
    pub fn mount(session: &SessionStore, interval: Duration) -> GuardHandle {
        let cancel = CancellationToken::new();
        if !session.snapshot().has_token() {
            return GuardHandle { cancel, task: None };
        }

        let store = session.clone();
        let mut token_present = session.subscribe_token();
        let stop = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = stop.cancelled() => {
                        debug!("expiry watch unmounted");
                        break;
                    }
                    changed = token_present.changed() => {
                        if changed.is_err() || !*token_present.borrow() {
                            debug!("token gone; expiry watch stopped");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if store.check_expiry() {
                            break;
                        }
                    }
                }
            }
        });
        GuardHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Mounted guard. Dropping it stops the expiry watch.
#[derive(Debug)]
pub struct GuardHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl GuardHandle {
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub fn is_watching(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Waits for the expiry watch to end.
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("expiry watch ended abnormally: {e}");
        }
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::ApiClient;
    use crate::clock::ManualClock;
    use crate::session::SESSION_EXPIRED;
    use crate::session::claims::encode_unsigned;
    use crate::storage::{MemoryTokenStore, TokenStore};

    const NOW: u64 = 1_700_000_000;

    fn hydrated(exp: u64) -> (SessionStore, ManualClock) {
        let token = encode_unsigned(&json!({ "exp": exp }));
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token));
        let clock = ManualClock::new(NOW);
        let api =
            ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1), Arc::clone(&tokens))
                .unwrap();
        let store = SessionStore::new(api, tokens, Arc::new(clock.clone()));
        store.hydrate();
        (store, clock)
    }

    #[test]
    fn test_decide() {
        let mut session = Session::default();
        assert_eq!(
            RouteGuard::decide(&session),
            GuardDecision::Redirect { to: LOGIN_ROUTE }
        );
        session.is_loading = true;
        assert_eq!(RouteGuard::decide(&session), GuardDecision::Wait);
        session.is_loading = false;
        session.is_authenticated = true;
        assert_eq!(RouteGuard::decide(&session), GuardDecision::Admit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_check_clears_expired_session() {
        let (store, clock) = hydrated(NOW + 400);
        let mut guard = RouteGuard::mount(&store, Duration::from_secs(300));
        assert!(guard.is_watching());

        time::sleep(Duration::from_secs(1)).await;
        assert!(store.is_authenticated());

        clock.advance(400);
        time::timeout(Duration::from_secs(600), guard.finished())
            .await
            .unwrap();

        let session = store.snapshot();
        assert!(!session.is_authenticated);
        assert_eq!(session.last_error.as_deref(), Some(SESSION_EXPIRED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_checks_immediately() {
        let (store, clock) = hydrated(NOW + 10);
        clock.advance(10);
        let mut guard = RouteGuard::mount(&store, Duration::from_secs(300));
        time::timeout(Duration::from_secs(1), guard.finished())
            .await
            .unwrap();
        assert_eq!(store.snapshot().last_error.as_deref(), Some(SESSION_EXPIRED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_stops_watch() {
        let (store, _) = hydrated(NOW + 3600);
        let mut guard = RouteGuard::mount(&store, Duration::from_secs(300));
        time::sleep(Duration::from_secs(1)).await;
        store.logout();
        time::timeout(Duration::from_secs(1), guard.finished())
            .await
            .unwrap();
        assert!(!guard.is_watching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_watch() {
        let (store, _) = hydrated(NOW + 3600);
        let mut guard = RouteGuard::mount(&store, Duration::from_secs(300));
        guard.unmount();
        time::timeout(Duration::from_secs(1), guard.finished())
            .await
            .unwrap();
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_no_token_no_watch() {
        let (store, _) = hydrated(NOW + 3600);
        store.logout();
        let guard = RouteGuard::mount(&store, Duration::from_secs(300));
        assert!(!guard.is_watching());
    }
}
