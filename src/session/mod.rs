//! Cookie-backed sessions.
//!
//! # Data Flow
//! ```text
//! login handler → SessionStore::create → issue_cookie (Set-Cookie)
//! later request → LoadSession reads cookie → Session in extensions
//! logout handler → SessionStore::destroy → clear_cookie
//! ```
//!
//! # Design Decisions
//! - Identifiers are random v4 UUIDs; nothing else is stored client-side
//! - The store is shared through an `Arc` and never global

pub mod load;
pub mod store;

pub use load::LoadSession;
pub use store::{Session, SessionStore};
