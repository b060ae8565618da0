//! Session and user types shared by the session manager and the request pipeline

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Role of the signed-in user. Decides which routes are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[display("ADMIN")]
    Admin,
    #[display("TEACHER")]
    Teacher,
    #[default]
    #[display("STUDENT")]
    Student,
}

impl Role {
    /// Admins and teachers may manage students and teachers
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }
}

/// User information returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(alias = "fullName", default)]
    pub full_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl UserProfile {
    pub fn new(id: i64, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            role,
            email: None,
            username: None,
            first_name: None,
            last_name: None,
            phone_number: None,
        }
    }
}

/// Token pair as issued by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// The authenticated session: identity plus the active token pair
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn new(user: UserProfile, tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
            user,
        }
    }
}

/// Authentication state as seen by views and the route guard
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// Persisted session not read yet
    #[default]
    Loading,
    /// Nobody is signed in
    Unauthenticated,
    /// A session is active
    Authenticated(UserProfile),
    /// The session was dropped after a failed token refresh; the user must sign in again
    Expired,
}

impl AuthState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

/// Login request
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form, sent as-is to the backend once it passes validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub role: Role,
}

/// Body of the login and register responses: `{data:{user, tokens}}`
#[derive(Debug, Deserialize)]
pub(crate) struct AuthEnvelope {
    pub data: AuthPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthPayload {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
}
