//! Route access decisions.
//!
//! Everything the decision needs is passed in: who the current user is,
//! whether the identity provider is still resolving, and what kind of route
//! is being entered. No session state is read from anywhere else.

use serde::Serialize;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Reachable by anyone, signed in or not.
    Public,
    /// Requires a signed-in user.
    Protected,
    /// Sign-in and registration views; pointless once signed in.
    Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "to", rename_all = "lowercase")]
pub enum RouteDecision {
    Allow,
    /// Identity is still loading; wait before deciding.
    Pending,
    Redirect(&'static str),
}

impl RouteDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[must_use]
pub const fn decide<U>(
    current_user: Option<&U>,
    is_loading: bool,
    access: RouteAccess,
) -> RouteDecision {
    match (access, is_loading, current_user) {
        (RouteAccess::Public, _, _) => RouteDecision::Allow,
        (_, true, _) => RouteDecision::Pending,
        (RouteAccess::Protected, false, None) => RouteDecision::Redirect(LOGIN_ROUTE),
        (RouteAccess::Entry, false, Some(_)) => RouteDecision::Redirect(HOME_ROUTE),
        (RouteAccess::Protected, false, Some(_)) | (RouteAccess::Entry, false, None) => {
            RouteDecision::Allow
        }
    }
}
