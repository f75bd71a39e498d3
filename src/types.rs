use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of a connection (one tenant granted to the app).
///
/// This is the `id` returned by the connections endpoint and the value
/// passed when disconnecting. It is not the tenant id used for API calls.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

/// Tenant identifier sent as the `xero-tenant-id` header on API calls.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct TenantId(pub String);

/// Server-side session identifier, carried in the encrypted session cookie.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct SessionId(pub Ulid);

impl SessionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

/// A tenant (organisation) covered by the current grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Tenant {
    pub id: ConnectionId,
    pub tenant_id: TenantId,
    #[serde(default)]
    pub tenant_type: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub auth_event_id: Option<String>,
    #[serde(default)]
    pub created_date_utc: Option<String>,
    #[serde(default)]
    pub updated_date_utc: Option<String>,
}

impl Tenant {
    /// Create a tenant with only the two identifiers set.
    #[must_use]
    pub fn new(id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            id: ConnectionId(id.into()),
            tenant_id: TenantId(tenant_id.into()),
            tenant_type: None,
            tenant_name: None,
            auth_event_id: None,
            created_date_utc: None,
            updated_date_utc: None,
        }
    }

    #[must_use]
    pub fn with_tenant_name(mut self, name: impl Into<String>) -> Self {
        self.tenant_name = Some(name.into());
        self
    }
}

/// Tokens issued for one grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Unix timestamp (seconds) after which the access token is no longer valid.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl TokenSet {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            id_token: None,
            refresh_token: None,
            token_type: None,
            scope: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    #[must_use]
    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether `expires_at` has passed. Unknown expiry counts as not expired.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| at <= time::OffsetDateTime::now_utc().unix_timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_deserializes_from_connections_payload() {
        let json = r#"{
            "id": "e1eede29-f875-4a5d-8470-17f6a29a88b1",
            "authEventId": "d99ecdfe-391d-43d2-b834-17636ba90e8d",
            "tenantId": "70784a63-d24b-46a9-a4db-0e70a274b056",
            "tenantType": "ORGANISATION",
            "tenantName": "Maple Florists Inc",
            "createdDateUtc": "2019-07-09T23:40:30.1833130",
            "updatedDateUtc": "2020-05-15T01:35:13.8491980"
        }"#;
        let tenant: Tenant = serde_json::from_str(json).unwrap();

        assert_eq!(tenant.id.to_string(), "e1eede29-f875-4a5d-8470-17f6a29a88b1");
        assert_eq!(
            tenant.tenant_id,
            TenantId("70784a63-d24b-46a9-a4db-0e70a274b056".into())
        );
        assert_eq!(tenant.tenant_name.as_deref(), Some("Maple Florists Inc"));
        assert_eq!(tenant.tenant_type.as_deref(), Some("ORGANISATION"));
    }

    #[test]
    fn tenant_optional_fields_default() {
        let tenant: Tenant = serde_json::from_str(r#"{"id":"c1","tenantId":"t1"}"#).unwrap();
        assert_eq!(tenant, Tenant::new("c1", "t1"));
    }

    #[test]
    fn token_set_expiry() {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        assert!(TokenSet::new("a").with_expires_at(now - 10).expired());
        assert!(!TokenSet::new("a").with_expires_at(now + 600).expired());
        assert!(!TokenSet::new("a").expired());
    }

    #[test]
    fn session_id_parses_from_display() {
        let id = SessionId::generate();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-ulid".parse::<SessionId>().is_err());
    }
}
