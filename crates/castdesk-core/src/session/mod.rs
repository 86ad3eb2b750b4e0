//! Session store: token, decoded claims and authentication flag.
//!
//! Hydrated from the token store at startup, mutated by login, logout and
//! periodic expiry checks.

pub mod claims;
mod store;
pub mod validate;

pub use claims::Claims;
pub use store::{
    Hydration, LOGIN_FAILED, REGISTRATION_FAILED, SAVE_FAILED, SESSION_EXPIRED, Session,
    SessionStore,
};
