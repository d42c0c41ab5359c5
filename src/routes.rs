//! Which screens a user may open.
//!
//! A static table of path patterns and the role each requires. Patterns use
//! `:name` segments for parameters (`/papers/:id`).

use crate::api::types::{Role, User};

/// Outcome of resolving a path for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Not signed in, or the path is unknown.
    RedirectToLogin,
    /// Signed in but on a path for another role; go to this home screen.
    RedirectHome(&'static str),
}

struct Route {
    pattern: &'static str,
    /// `None` for public routes.
    role: Option<Role>,
}

const ROUTES: &[Route] = &[
    Route { pattern: "/login", role: None },
    Route { pattern: "/register", role: None },
    Route { pattern: "/accept-invite/:token", role: None },
    Route { pattern: "/admin", role: Some(Role::Admin) },
    Route { pattern: "/admin/users", role: Some(Role::Admin) },
    Route { pattern: "/admin/users/create", role: Some(Role::Admin) },
    Route { pattern: "/admin/users/:userId", role: Some(Role::Admin) },
    Route { pattern: "/admin/papers", role: Some(Role::Admin) },
    Route { pattern: "/admin/papers/:paperId", role: Some(Role::Admin) },
    Route { pattern: "/admin/papers/:paperId/versions/:versionNo", role: Some(Role::Admin) },
    Route { pattern: "/admin/papers/:paperId/deadline", role: Some(Role::Admin) },
    Route { pattern: "/dashboard", role: Some(Role::Researcher) },
    Route { pattern: "/papers", role: Some(Role::Researcher) },
    Route { pattern: "/papers/create", role: Some(Role::Researcher) },
    Route { pattern: "/papers/:id", role: Some(Role::Researcher) },
    Route { pattern: "/papers/:id/submit", role: Some(Role::Researcher) },
];

/// Landing screen for a role.
pub fn home_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Researcher => "/dashboard",
    }
}

fn matches(pattern: &str, path: &str) -> bool {
    let mut want = pattern.split('/').filter(|s| !s.is_empty());
    let mut got = path.split('/').filter(|s| !s.is_empty());
    loop {
        match (want.next(), got.next()) {
            (None, None) => return true,
            (Some(w), Some(g)) if w.starts_with(':') || w == g => {}
            _ => return false,
        }
    }
}

/// Decide what happens when `user` (or nobody) navigates to `path`.
///
/// `/` sends a signed-in user home; unknown paths go to the login screen.
pub fn resolve(path: &str, user: Option<&User>) -> RouteDecision {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if path.trim_matches('/').is_empty() {
        return match user {
            Some(user) => RouteDecision::RedirectHome(home_for(user.role)),
            None => RouteDecision::RedirectToLogin,
        };
    }

    let Some(route) = ROUTES.iter().find(|r| matches(r.pattern, path)) else {
        return RouteDecision::RedirectToLogin;
    };
    match (route.role, user) {
        (None, _) => RouteDecision::Allow,
        (Some(_), None) => RouteDecision::RedirectToLogin,
        (Some(required), Some(user)) if required == user.role => RouteDecision::Allow,
        (Some(_), Some(user)) => RouteDecision::RedirectHome(home_for(user.role)),
    }
}

/// `Ok` when `user` may open `path`, otherwise a message saying why not.
pub fn authorize(path: &str, user: Option<&User>) -> Result<(), String> {
    match resolve(path, user) {
        RouteDecision::Allow => Ok(()),
        RouteDecision::RedirectToLogin => Err(format!("{} requires signing in", path)),
        RouteDecision::RedirectHome(home) => Err(format!(
            "{} is not available to {} accounts (home is {})",
            path,
            user.map(|u| u.role.as_str()).unwrap_or("anonymous"),
            home
        )),
    }
}
