//! Ephemeral view state: notifications, modals, sidebar, theme.
//!
//! Nothing here is persisted; a fresh process starts from defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);
pub const BROADCAST_NAME_MODAL: &str = "broadcastNameModal";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
    /// Auto-dismiss delay. `None` keeps the notification until removed.
    pub duration: Option<Duration>,
    pub created_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity: Severity::default(),
            message: message.into(),
            duration: Some(DEFAULT_NOTIFICATION_DURATION),
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.duration
            .is_some_and(|d| now.saturating_duration_since(self.created_at) >= d)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub global_loading: bool,
    pub notifications: Vec<Notification>,
    pub modals: BTreeMap<String, bool>,
    pub sidebar_collapsed: bool,
    pub theme: Theme,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            global_loading: false,
            notifications: Vec::new(),
            modals: BTreeMap::from([(BROADCAST_NAME_MODAL.to_string(), false)]),
            sidebar_collapsed: false,
            theme: Theme::default(),
        }
    }
}

impl UiState {
    pub fn set_global_loading(&mut self, loading: bool) {
        self.global_loading = loading;
    }

    pub fn add_notification(&mut self, notification: Notification) -> Uuid {
        let id = notification.id;
        self.notifications.push(notification);
        id
    }

    pub fn remove_notification(&mut self, id: Uuid) {
        self.notifications.retain(|n| n.id != id);
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    /// Drops notifications whose auto-dismiss delay has passed at `now`.
    pub fn prune_expired(&mut self, now: Instant) -> usize {
        let before = self.notifications.len();
        self.notifications.retain(|n| !n.is_expired(now));
        before - self.notifications.len()
    }

    pub fn open_modal(&mut self, name: &str) {
        self.modals.insert(name.to_string(), true);
    }

    pub fn close_modal(&mut self, name: &str) {
        self.modals.insert(name.to_string(), false);
    }

    pub fn close_all_modals(&mut self) {
        self.modals.values_mut().for_each(|open| *open = false);
    }

    pub fn is_modal_open(&self, name: &str) -> bool {
        self.modals.get(name).copied().unwrap_or(false)
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
    }

    pub fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.sidebar_collapsed = collapsed;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }
}

/// Shared handle to the UI state.
#[derive(Debug, Clone, Default)]
pub struct UiStore {
    state: Arc<Mutex<UiState>>,
}

impl UiStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut UiState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn snapshot(&self) -> UiState {
        self.update(|s| s.clone())
    }

    pub fn notify(&self, severity: Severity, message: impl Into<String>) -> Uuid {
        self.update(|s| s.add_notification(Notification::new(message).with_severity(severity)))
    }

    /// Removes and returns every pending notification.
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.update(|s| mem::take(&mut s.notifications))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_defaults() {
        let n = Notification::new("Saved");
        assert_eq!(n.severity, Severity::Info);
        assert_eq!(n.duration, Some(DEFAULT_NOTIFICATION_DURATION));
    }

    #[test]
    fn test_prune_expired_honours_each_duration() {
        let mut ui = UiState::default();
        let short = Notification::new("short").with_duration(Some(Duration::from_millis(100)));
        let base = short.created_at;
        let long = Notification {
            created_at: base,
            ..Notification::new("long")
        };
        let sticky = Notification {
            created_at: base,
            ..Notification::new("sticky").with_duration(None)
        };
        ui.add_notification(short);
        let long_id = ui.add_notification(long);
        ui.add_notification(sticky);

        assert_eq!(ui.prune_expired(base + Duration::from_millis(99)), 0);
        assert_eq!(ui.prune_expired(base + Duration::from_millis(100)), 1);
        assert_eq!(ui.prune_expired(base + Duration::from_secs(60)), 1);
        assert_eq!(ui.notifications.len(), 1);
        assert_ne!(ui.notifications[0].id, long_id);
    }

    #[test]
    fn test_modals() {
        let mut ui = UiState::default();
        assert!(!ui.is_modal_open(BROADCAST_NAME_MODAL));
        ui.open_modal(BROADCAST_NAME_MODAL);
        ui.open_modal("confirmDelete");
        assert!(ui.is_modal_open("confirmDelete"));
        ui.close_all_modals();
        assert!(!ui.is_modal_open(BROADCAST_NAME_MODAL));
        assert!(!ui.is_modal_open("confirmDelete"));
        assert_eq!(ui.modals.len(), 2);
    }

    #[test]
    fn test_theme_and_sidebar() {
        let mut ui = UiState::default();
        ui.toggle_theme();
        assert_eq!(ui.theme, Theme::Dark);
        ui.toggle_theme();
        assert_eq!(ui.theme, Theme::Light);
        ui.toggle_sidebar();
        assert!(ui.sidebar_collapsed);
        ui.set_sidebar_collapsed(false);
        assert!(!ui.sidebar_collapsed);
    }

    #[test]
    fn test_store_drain() {
        let store = UiStore::new();
        let id = store.notify(Severity::Success, "Customer created");
        store.update(|s| s.remove_notification(Uuid::nil()));
        let drained = store.drain_notifications();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, id);
        assert!(store.snapshot().notifications.is_empty());
    }
}
