//! Client core: session handling, the authenticated request pipeline and
//! typed access to the backend collections

pub mod api;
pub mod auth;
pub mod config;
pub mod resources;
pub mod validation;

pub use api::{ApiClient, ApiError, ApiRequest};
pub use auth::{AuthState, Role, SessionManager, UserProfile};
pub use config::Config;
