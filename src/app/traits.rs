use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::oauth::XeroClient;
use crate::session::Session;
use crate::types::{ConnectionId, SessionId, Tenant, TenantId, TokenSet};

type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// The upstream OAuth client and accounting API, as used by the routes.
///
/// [`XeroClient`] is the production implementation; tests substitute a fake.
pub trait AccountingApi: Send + Sync + 'static {
    /// Consent URL carrying the given `state`.
    fn consent_url(&self, state: &str) -> impl Future<Output = Result<String, Error>> + Send;

    /// Exchange an authorization code for a token set.
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<TokenSet, Error>> + Send;

    /// Tenants covered by the grant, in the provider's order.
    fn tenants(
        &self,
        token_set: &TokenSet,
    ) -> impl Future<Output = Result<Vec<Tenant>, Error>> + Send;

    /// Revoke one connection and return the updated token set.
    fn disconnect(
        &self,
        token_set: &TokenSet,
        connection: &ConnectionId,
    ) -> impl Future<Output = Result<TokenSet, Error>> + Send;

    /// Organisation name for a tenant.
    fn organisation_name(
        &self,
        token_set: &TokenSet,
        tenant: &TenantId,
    ) -> impl Future<Output = Result<String, Error>> + Send;
}

impl AccountingApi for XeroClient {
    async fn consent_url(&self, state: &str) -> Result<String, Error> {
        XeroClient::consent_url(self, state).await
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, Error> {
        XeroClient::exchange_code(self, code).await
    }

    async fn tenants(&self, token_set: &TokenSet) -> Result<Vec<Tenant>, Error> {
        self.connections(&token_set.access_token).await
    }

    async fn disconnect(
        &self,
        token_set: &TokenSet,
        connection: &ConnectionId,
    ) -> Result<TokenSet, Error> {
        XeroClient::disconnect(self, token_set, connection).await
    }

    async fn organisation_name(
        &self,
        token_set: &TokenSet,
        tenant: &TenantId,
    ) -> Result<String, Error> {
        XeroClient::organisation_name(self, &token_set.access_token, tenant).await
    }
}

/// Session persistence.
///
/// Sessions are replaced whole: [`save`](SessionStore::save) overwrites
/// whatever was stored under the id. Expiry is up to the implementation.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for RedisSessions {
///     async fn load(&self, id: &SessionId) -> Result<Option<Session>, ...> {
///         let raw: Option<String> = self.conn().get(id.to_string()).await?;
///         Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
///     }
///     // ...
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Look up a session. `None` if it never existed or has expired.
    fn load(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Store a session under `id`.
    fn save(
        &self,
        id: &SessionId,
        session: Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Forget a session.
    fn remove(&self, id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: AccountingApi> AccountingApi for Arc<T> {
    fn consent_url(&self, state: &str) -> impl Future<Output = Result<String, Error>> + Send {
        (**self).consent_url(state)
    }

    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<TokenSet, Error>> + Send {
        (**self).exchange_code(code)
    }

    fn tenants(
        &self,
        token_set: &TokenSet,
    ) -> impl Future<Output = Result<Vec<Tenant>, Error>> + Send {
        (**self).tenants(token_set)
    }

    fn disconnect(
        &self,
        token_set: &TokenSet,
        connection: &ConnectionId,
    ) -> impl Future<Output = Result<TokenSet, Error>> + Send {
        (**self).disconnect(token_set, connection)
    }

    fn organisation_name(
        &self,
        token_set: &TokenSet,
        tenant: &TenantId,
    ) -> impl Future<Output = Result<String, Error>> + Send {
        (**self).organisation_name(token_set, tenant)
    }
}

impl<T: SessionStore> SessionStore for Arc<T> {
    fn load(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send {
        (**self).load(id)
    }

    fn save(
        &self,
        id: &SessionId,
        session: Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).save(id, session)
    }

    fn remove(&self, id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).remove(id)
    }
}
