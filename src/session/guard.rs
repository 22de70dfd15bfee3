use super::projection::SessionView;
use crate::error::Error;

/// Authorization level a route prefix demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    Admin,
}

/// Outcome of guarding one request on a protected path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No usable session: redirect to sign-in.
    Unauthenticated,
    Authenticated,
    AuthenticatedAdmin,
    /// Signed in, but missing the admin role: redirect to the unauthorized page.
    Denied,
}

impl GuardState {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Authenticated | Self::AuthenticatedAdmin)
    }
}

/// Role check for handlers that need admin beyond what the route table says.
///
/// # Errors
///
/// [`Error::Unauthorized`] when the session lacks the admin role.
pub fn require_admin(session: &SessionView) -> Result<(), Error> {
    if session.roles.is_admin() {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    prefix: String,
    access: Access,
}

impl RoutePolicy {
    #[must_use]
    pub fn new(prefix: impl Into<String>, access: Access) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_owned();
        Self { prefix, access }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn access(&self) -> Access {
        self.access
    }

    /// Prefix match on segment boundaries: `/admin` covers `/admin` and
    /// `/admin/x`, not `/administrator`.
    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.is_empty(),
            None => false,
        }
    }
}

/// Immutable prefix → access table consulted by the route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    policies: Vec<RoutePolicy>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            RoutePolicy::new("/dashboard", Access::Authenticated),
            RoutePolicy::new("/documents", Access::Authenticated),
            RoutePolicy::new("/admin", Access::Admin),
            RoutePolicy::new("/api/protected", Access::Authenticated),
        ])
    }
}

impl RouteTable {
    #[must_use]
    pub fn new(policies: Vec<RoutePolicy>) -> Self {
        Self { policies }
    }

    #[must_use]
    pub fn policies(&self) -> &[RoutePolicy] {
        &self.policies
    }

    /// Most specific policy covering `path`, if any.
    #[must_use]
    pub fn policy_for(&self, path: &str) -> Option<&RoutePolicy> {
        self.policies
            .iter()
            .filter(|p| p.matches(path))
            .max_by_key(|p| p.prefix.len())
    }

    /// `None` means the path is unguarded and passes regardless of session.
    #[must_use]
    pub fn evaluate(&self, path: &str, session: Option<&SessionView>) -> Option<GuardState> {
        let policy = self.policy_for(path)?;

        let Some(session) = session.filter(|s| s.is_signed_in()) else {
            return Some(GuardState::Unauthenticated);
        };

        let state = match (policy.access, require_admin(session)) {
            (Access::Admin, Err(_)) => GuardState::Denied,
            (_, Ok(())) => GuardState::AuthenticatedAdmin,
            (Access::Authenticated, Err(_)) => GuardState::Authenticated,
        };
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::artifact::SessionError;
    use crate::types::PrincipalId;

    fn view(roles: &[&str]) -> SessionView {
        SessionView {
            id: PrincipalId::from("u-1"),
            roles: roles.iter().copied().collect(),
            access_token: "acc".into(),
            error: None,
        }
    }

    #[test]
    fn admin_route_requires_admin_role() {
        let table = RouteTable::default();
        assert_eq!(
            table.evaluate("/admin/x", Some(&view(&["user"]))),
            Some(GuardState::Denied)
        );
        assert_eq!(
            table.evaluate("/admin/x", Some(&view(&["admin"]))),
            Some(GuardState::AuthenticatedAdmin)
        );
    }

    #[test]
    fn unmatched_path_bypasses() {
        let table = RouteTable::default();
        assert_eq!(table.evaluate("/public", None), None);
        assert_eq!(table.evaluate("/public", Some(&view(&["user"]))), None);
        assert_eq!(table.evaluate("/", None), None);
    }

    #[test]
    fn protected_path_without_session() {
        let table = RouteTable::default();
        for path in ["/dashboard", "/documents/42", "/admin", "/api/protected/items"] {
            assert_eq!(
                table.evaluate(path, None),
                Some(GuardState::Unauthenticated),
                "{path}"
            );
        }
    }

    #[test]
    fn errored_session_counts_as_signed_out() {
        let mut v = view(&["admin"]);
        v.error = Some(SessionError::RefreshFailed);
        assert_eq!(
            RouteTable::default().evaluate("/dashboard", Some(&v)),
            Some(GuardState::Unauthenticated)
        );
    }

    #[test]
    fn plain_user_allowed_on_authenticated_routes() {
        let state = RouteTable::default()
            .evaluate("/documents/create", Some(&view(&["user"])))
            .unwrap();
        assert_eq!(state, GuardState::Authenticated);
        assert!(state.is_allowed());
    }

    #[test]
    fn prefix_respects_segment_boundary() {
        let table = RouteTable::default();
        assert!(table.policy_for("/dashboards").is_none());
        assert!(table.policy_for("/administrator").is_none());
        assert!(table.policy_for("/dashboard/").is_some());
    }

    #[test]
    fn longest_prefix_wins() {
        let table = RouteTable::new(vec![
            RoutePolicy::new("/documents", Access::Authenticated),
            RoutePolicy::new("/documents/audit/", Access::Admin),
        ]);
        assert_eq!(
            table.policy_for("/documents/audit/7").map(RoutePolicy::access),
            Some(Access::Admin)
        );
        assert_eq!(
            table.policy_for("/documents/7").map(RoutePolicy::access),
            Some(Access::Authenticated)
        );
    }

    #[test]
    fn require_admin_reports_unauthorized() {
        assert!(require_admin(&view(&["admin"])).is_ok());
        assert!(matches!(
            require_admin(&view(&["user"])),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn root_policy_guards_everything() {
        let table = RouteTable::new(vec![RoutePolicy::new("/", Access::Authenticated)]);
        assert!(table.policy_for("/anything").is_some());
    }
}
