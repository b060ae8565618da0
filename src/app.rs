//! Application routes and access control
//!
//! Mirrors the portal's page table: which pages exist, who may open them and
//! where a visitor is sent otherwise.

use derive_more::Display;

use crate::core::auth::{AuthState, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Route {
    #[display("Login")]
    Login,
    #[display("Register")]
    Register,
    #[display("Dashboard")]
    Dashboard,
    #[display("Students")]
    Students,
    #[display("Teachers")]
    Teachers,
    #[display("Courses")]
    Courses,
}

const STAFF: &[Role] = &[Role::Admin, Role::Teacher];

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Login,
        Route::Register,
        Route::Dashboard,
        Route::Students,
        Route::Teachers,
        Route::Courses,
    ];

    /// Resolve a location path. Unknown paths land on the dashboard.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/students" => Route::Students,
            "/teachers" => Route::Teachers,
            "/courses" => Route::Courses,
            _ => Route::Dashboard,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/",
            Route::Students => "/students",
            Route::Teachers => "/teachers",
            Route::Courses => "/courses",
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// Roles allowed on this page; empty means any signed-in user
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Route::Students | Route::Teachers => STAFF,
            _ => &[],
        }
    }

    pub fn allows(self, role: Role) -> bool {
        let roles = self.allowed_roles();
        roles.is_empty() || roles.contains(&role)
    }
}

/// Outcome of visiting a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session restore still running
    Loading,
    Render,
    Redirect(Route),
}

pub fn guard(state: &AuthState, route: Route) -> RouteDecision {
    if route.is_public() {
        return RouteDecision::Render;
    }
    match state {
        AuthState::Loading => RouteDecision::Loading,
        AuthState::Unauthenticated | AuthState::Expired => RouteDecision::Redirect(Route::Login),
        AuthState::Authenticated(user) if !route.allows(user.role) => {
            RouteDecision::Redirect(Route::Dashboard)
        }
        AuthState::Authenticated(_) => RouteDecision::Render,
    }
}

/// Navigation bar entries for a signed-in user
pub fn nav_links(role: Role) -> Vec<Route> {
    [Route::Dashboard, Route::Students, Route::Teachers, Route::Courses]
        .into_iter()
        .filter(|route| route.allows(role))
        .collect()
}
