//! Server-side session state.
//!
//! A session is either disconnected or connected to exactly one active
//! tenant out of the tenants covered by the grant. Transitions build a
//! complete new [`Session`] value; callers replace the stored session in
//! one step, so a failed request never leaves a half-written session.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::token::{self, AccessTokenClaims, IdTokenClaims};
use crate::types::{Tenant, TokenSet};

/// Per-client session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Disconnected,
    Connected(Connection),
}

/// An established grant with an active tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredConnection")]
pub struct Connection {
    token_set: TokenSet,
    id_token: Option<IdTokenClaims>,
    access_token: AccessTokenClaims,
    tenants: Vec<Tenant>,
    // Index into `tenants`; always in bounds.
    active: usize,
    display_name: Option<String>,
}

/// Wire form of [`Connection`], checked before it becomes one.
#[derive(Deserialize)]
struct StoredConnection {
    token_set: TokenSet,
    id_token: Option<IdTokenClaims>,
    access_token: AccessTokenClaims,
    tenants: Vec<Tenant>,
    active: usize,
    display_name: Option<String>,
}

impl TryFrom<StoredConnection> for Connection {
    type Error = String;

    fn try_from(stored: StoredConnection) -> Result<Self, Self::Error> {
        if stored.active >= stored.tenants.len() {
            return Err(format!(
                "active tenant {} out of range for {} tenant(s)",
                stored.active,
                stored.tenants.len()
            ));
        }

        Ok(Self {
            token_set: stored.token_set,
            id_token: stored.id_token,
            access_token: stored.access_token,
            tenants: stored.tenants,
            active: stored.active,
            display_name: stored.display_name,
        })
    }
}

impl Session {
    /// Builds the session for a fresh or refreshed grant.
    ///
    /// The first tenant becomes active. An empty tenant list yields
    /// [`Session::Disconnected`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Token`] if the access token (or the ID token, when
    /// present) cannot be decoded.
    pub fn establish(token_set: TokenSet, tenants: Vec<Tenant>) -> Result<Self, Error> {
        let id_token = token_set
            .id_token
            .as_deref()
            .map(token::decode_id_token)
            .transpose()?;
        let access_token = token::decode_access_token(&token_set.access_token)?;

        if tenants.is_empty() {
            return Ok(Self::Disconnected);
        }

        Ok(Self::Connected(Connection {
            token_set,
            id_token,
            access_token,
            tenants,
            active: 0,
            display_name: None,
        }))
    }

    #[must_use]
    pub fn connection(&self) -> Option<&Connection> {
        match self {
            Self::Connected(conn) => Some(conn),
            Self::Disconnected => None,
        }
    }

    #[must_use]
    pub fn active_tenant(&self) -> Option<&Tenant> {
        self.connection().map(Connection::active_tenant)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

impl Connection {
    #[must_use]
    pub fn active_tenant(&self) -> &Tenant {
        &self.tenants[self.active]
    }

    #[must_use]
    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    #[must_use]
    pub fn token_set(&self) -> &TokenSet {
        &self.token_set
    }

    #[must_use]
    pub fn id_token(&self) -> Option<&IdTokenClaims> {
        self.id_token.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> &AccessTokenClaims {
        &self.access_token
    }

    /// Organisation name fetched for the active tenant, if any yet.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Best name to show for the active tenant: the fetched organisation
    /// name, else the name the connection was listed with.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.display_name()
            .or(self.active_tenant().tenant_name.as_deref())
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tests::jwt;

    fn access_jwt(event: &str) -> String {
        jwt(&serde_json::json!({
            "client_id": "client-1",
            "authentication_event_id": event,
            "scope": ["openid", "offline_access"]
        }))
    }

    fn id_jwt() -> String {
        jwt(&serde_json::json!({ "sub": "user-1", "email": "user@example.com" }))
    }

    #[test]
    fn establish_picks_first_tenant() {
        let tenants = vec![Tenant::new("c1", "t1"), Tenant::new("c2", "t2")];
        let token_set = TokenSet::new(access_jwt("e1")).with_id_token(id_jwt());

        let session = Session::establish(token_set.clone(), tenants.clone()).unwrap();
        let conn = session.connection().unwrap();

        assert_eq!(conn.active_tenant(), &tenants[0]);
        assert_eq!(conn.tenants(), tenants.as_slice());
        assert_eq!(conn.token_set(), &token_set);
        assert_eq!(conn.id_token().unwrap().sub, "user-1");
        assert_eq!(
            conn.access_token().authentication_event_id.as_deref(),
            Some("e1")
        );
        assert!(conn.display_name().is_none());
    }

    #[test]
    fn establish_without_id_token() {
        let session =
            Session::establish(TokenSet::new(access_jwt("e1")), vec![Tenant::new("c1", "t1")])
                .unwrap();
        assert!(session.connection().unwrap().id_token().is_none());
    }

    #[test]
    fn establish_with_no_tenants_is_disconnected() {
        let session = Session::establish(TokenSet::new(access_jwt("e1")), Vec::new()).unwrap();
        assert_eq!(session, Session::Disconnected);
        assert!(session.active_tenant().is_none());
    }

    #[test]
    fn establish_rejects_undecodable_tokens() {
        let err = Session::establish(TokenSet::new("opaque"), vec![Tenant::new("c1", "t1")]);
        assert!(matches!(err, Err(Error::Token(_))));

        let err = Session::establish(
            TokenSet::new(access_jwt("e1")).with_id_token("broken"),
            vec![Tenant::new("c1", "t1")],
        );
        assert!(matches!(err, Err(Error::Token(_))));
    }

    #[test]
    fn label_prefers_display_name() {
        let tenant = Tenant::new("c1", "t1").with_tenant_name("Listed Name");
        let session = Session::establish(TokenSet::new(access_jwt("e1")), vec![tenant]).unwrap();
        let Session::Connected(conn) = session else {
            panic!("expected connected session");
        };

        assert_eq!(conn.label(), Some("Listed Name"));
        let conn = conn.with_display_name("Fetched Name");
        assert_eq!(conn.label(), Some("Fetched Name"));
    }

    #[test]
    fn session_serde_is_tagged() {
        let json = serde_json::to_value(Session::Disconnected).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "disconnected" }));

        let session =
            Session::establish(TokenSet::new(access_jwt("e1")), vec![Tenant::new("c1", "t1")])
                .unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn stored_connection_without_active_tenant_is_rejected() {
        let session = Session::establish(
            TokenSet::new(access_jwt("e1")),
            vec![Tenant::new("c1", "t1"), Tenant::new("c2", "t2")],
        )
        .unwrap();
        let valid = serde_json::to_value(&session).unwrap();

        let mut no_tenants = valid.clone();
        no_tenants["tenants"] = serde_json::json!([]);
        let err = serde_json::from_value::<Session>(no_tenants).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");

        let mut past_end = valid;
        past_end["active"] = serde_json::json!(2);
        assert!(serde_json::from_value::<Session>(past_end).is_err());
    }
}
