use serde::Serialize;

/// The three pages of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Signup,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/",
        }
    }

    /// Any path other than the two auth pages maps to the dashboard.
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/login" => Self::Login,
            "/signup" => Self::Signup,
            _ => Self::Dashboard,
        }
    }
}

/// Where a request for `requested` lands. The dashboard is only reachable
/// with a signed-in user.
pub fn resolve_route(requested: &str, authenticated: bool) -> Route {
    match Route::from_path(requested) {
        Route::Dashboard if !authenticated => Route::Login,
        route => route,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_requires_sign_in() {
        assert_eq!(resolve_route("/", false), Route::Login);
        assert_eq!(resolve_route("/", true), Route::Dashboard);
        assert_eq!(resolve_route("/tokens/whatever", false), Route::Login);
    }

    #[test]
    fn auth_pages_are_always_reachable() {
        assert_eq!(resolve_route("/signup", false), Route::Signup);
        assert_eq!(resolve_route("/login/", true), Route::Login);
        assert_eq!(Route::Login.path(), "/login");
    }
}
