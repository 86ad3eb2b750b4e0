//! Core castdesk library (API client, session, resource slices, UI state).

pub mod api;
pub mod clock;
pub mod config;
pub mod console;
pub mod dates;
pub mod entities;
pub mod error;
pub mod guard;
pub mod session;
pub mod slice;
pub mod storage;
pub mod ui;

pub use console::Console;
