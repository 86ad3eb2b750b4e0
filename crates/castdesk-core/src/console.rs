//! Application context bundling every store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::ApiClient;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::entities::{Admins, Broadcasts, Customers, Templates};
use crate::guard::{GuardDecision, GuardHandle, RouteGuard};
use crate::session::{Hydration, SessionStore};
use crate::slice::Slice;
use crate::storage::{FileTokenStore, TokenStore};
use crate::ui::UiStore;

/// Explicit state container passed to every command.
#[derive(Debug, Clone)]
pub struct Console {
    pub api: ApiClient,
    pub session: SessionStore,
    pub customers: Slice<Customers>,
    pub broadcasts: Slice<Broadcasts>,
    pub templates: Slice<Templates>,
    pub admins: Slice<Admins>,
    pub ui: UiStore,
    expiry_check_interval: Duration,
}

impl Console {
    /// Builds the console with injected token storage and clock.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &Config, tokens: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let api = ApiClient::from_config(config, Arc::clone(&tokens))
            .context("Failed to set up the API client")?;
        Ok(Self {
            session: SessionStore::new(api.clone(), tokens, clock),
            customers: Slice::new(api.clone()),
            broadcasts: Slice::new(api.clone()),
            templates: Slice::new(api.clone()),
            admins: Slice::new(api.clone()),
            ui: UiStore::new(),
            expiry_check_interval: config.expiry_check_interval(),
            api,
        })
    }

    /// Builds the console against the on-disk token store and wall clock.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config,
            Arc::new(FileTokenStore::default_location()),
            Arc::new(SystemClock),
        )
    }

    pub fn hydrate(&self) -> Hydration {
        self.session.hydrate()
    }

    pub fn decide(&self) -> GuardDecision {
        RouteGuard::decide(&self.session.snapshot())
    }

    /// Mounts the route guard with the configured check interval.
    pub fn mount_guard(&self) -> GuardHandle {
        RouteGuard::mount(&self.session, self.expiry_check_interval)
    }

    pub fn expiry_check_interval(&self) -> Duration {
        self.expiry_check_interval
    }
}
