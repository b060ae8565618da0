//! Authentication module
//!
//! This module provides the client-side session lifecycle:
//! - User, role and token types
//! - Pluggable persistence for the session
//! - Login, registration, logout and token refresh

pub mod models;
pub mod session;
pub mod store;

pub use models::{AuthState, RegisterRequest, Role, Session, TokenPair, UserProfile};
pub use session::{LOGIN_PATH, REFRESH_PATH, REGISTER_PATH, SessionManager};
#[cfg(feature = "native")]
pub use store::FileStore;
#[cfg(feature = "web")]
pub use store::LocalStorageStore;
pub use store::{MemoryStore, SessionStore, StoreError};
