//! Route guard for the dashboard and login paths.

/// Cookie that marks a signed-in browser.
pub const AUTH_COOKIE: &str = "auth_token";

/// Where unauthenticated dashboard requests are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// Where authenticated login-page requests are sent.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Outcome of the guard for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the request through.
    Continue,
    /// Redirect to the given path.
    Redirect(&'static str),
}

/// Decides what to do with a request for `path`.
///
/// Dashboard paths need the auth cookie; login paths are skipped once it
/// is present. Everything else passes.
pub fn evaluate(path: &str, has_token: bool) -> GuardDecision {
    if path.starts_with(DASHBOARD_PATH) && !has_token {
        return GuardDecision::Redirect(LOGIN_PATH);
    }
    if path.starts_with("/auth") && has_token {
        return GuardDecision::Redirect(DASHBOARD_PATH);
    }
    GuardDecision::Continue
}

/// Extracts the auth cookie value from a `Cookie` header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(AUTH_COOKIE)?.strip_prefix('='))
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_requires_token() {
        assert_eq!(evaluate("/dashboard/rides", false), GuardDecision::Redirect(LOGIN_PATH));
        assert_eq!(evaluate("/dashboard/rides", true), GuardDecision::Continue);
    }

    #[test]
    fn test_login_skipped_when_signed_in() {
        assert_eq!(evaluate("/auth/login", true), GuardDecision::Redirect(DASHBOARD_PATH));
        assert_eq!(evaluate("/auth/login", false), GuardDecision::Continue);
    }

    #[test]
    fn test_other_paths_pass() {
        assert_eq!(evaluate("/health", false), GuardDecision::Continue);
    }

    #[test]
    fn test_cookie_parsing() {
        assert_eq!(token_from_cookie_header("a=1; auth_token=xyz; b=2"), Some("xyz"));
        assert_eq!(token_from_cookie_header("auth_token_old=1"), None);
        assert_eq!(token_from_cookie_header("auth_token="), None);
    }
}
