use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::error::Error;
use crate::types::{ConnectionId, Tenant, TenantId, TokenSet};
use crate::well_known::ProviderMetadata;

/// Scopes requested on every consent.
pub const DEFAULT_SCOPES: &str = "openid profile email accounting.settings accounting.reports.read accounting.journals.read accounting.contacts accounting.attachments accounting.transactions offline_access";

/// Xero `OAuth2` client configuration.
///
/// Required fields are constructor parameters, so there are no runtime "missing field" errors.
///
/// ```rust,ignore
/// use xero_connect::OAuthConfig;
///
/// let config = OAuthConfig::new("client-id", "secret", "http://localhost:5000/callback".parse()?)
///     .with_issuer_url("https://identity.example.com".parse()?);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: Url,
    pub(crate) issuer_url: Url,
    pub(crate) api_url: Url,
    pub(crate) scopes: Vec<String>,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            issuer_url: "https://identity.xero.com"
                .parse()
                .expect("valid default URL"),
            api_url: "https://api.xero.com".parse().expect("valid default URL"),
            scopes: DEFAULT_SCOPES.split(' ').map(str::to_string).collect(),
        }
    }

    /// Override the OpenID issuer used for discovery.
    #[must_use]
    pub fn with_issuer_url(mut self, url: Url) -> Self {
        self.issuer_url = url;
        self
    }

    /// Override the accounting API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn issuer_url(&self) -> &Url {
        &self.issuer_url
    }

    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Generates a random `state` parameter for the authorization request.
///
/// Returns a 22-character URL-safe string (16 random bytes → base64url).
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_token_set(self) -> TokenSet {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        TokenSet {
            access_token: self.access_token,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            scope: self.scope,
            expires_at: self.expires_in.map(|secs| now + secs),
        }
    }
}

/// An organisation record from the accounting API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct Organisation {
    #[serde(rename = "OrganisationID", default)]
    pub organisation_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub legal_name: Option<String>,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OrganisationsEnvelope {
    #[serde(default)]
    organisations: Vec<Organisation>,
}

/// `OAuth2` client for Xero identity and the accounting API.
///
/// Provider metadata is discovered on first use and cached for the lifetime
/// of the client.
pub struct XeroClient {
    config: OAuthConfig,
    http: reqwest::Client,
    metadata: OnceCell<ProviderMetadata>,
}

impl XeroClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            metadata: OnceCell::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Fetches (once) the OpenID provider metadata for the configured issuer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, [`Error::OAuth`] on a
    /// non-success response, or [`Error::Discovery`] if the URL is invalid.
    pub async fn provider_metadata(&self) -> Result<&ProviderMetadata, Error> {
        self.metadata
            .get_or_try_init(|| async {
                let url = ProviderMetadata::discovery_url(&self.config.issuer_url)?;
                tracing::debug!(url = %url, "Fetching OpenID provider metadata");
                let response = self.http.get(url).send().await?;
                let response = Self::ensure_success(response, "provider discovery").await?;
                let metadata = response.json::<ProviderMetadata>().await?;
                Ok::<_, Error>(metadata)
            })
            .await
    }

    /// Builds the consent URL the user is redirected to.
    ///
    /// # Errors
    ///
    /// Fails if provider discovery fails.
    pub async fn consent_url(&self, state: &str) -> Result<String, Error> {
        let metadata = self.provider_metadata().await?;
        let scope = self.config.scopes.join(" ");

        let mut url = metadata.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &scope)
            .append_pair("state", state);

        Ok(url.into())
    }

    /// Exchanges an authorization code for a token set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the token endpoint returns an error.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        self.token_request(&params, "token exchange").await
    }

    /// Refreshes a token set with its refresh token.
    ///
    /// A refresh token missing from the response is carried over from `token_set`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] if `token_set` has no refresh token or the
    /// token endpoint rejects it.
    pub async fn refresh(&self, token_set: &TokenSet) -> Result<TokenSet, Error> {
        let refresh_token = token_set.refresh_token.as_deref().ok_or(Error::OAuth {
            operation: "token refresh",
            status: None,
            detail: "no refresh token".into(),
        })?;
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let mut refreshed = self.token_request(&params, "token refresh").await?;
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token.to_string());
        }
        Ok(refreshed)
    }

    /// Lists the tenants the access token is connected to, in the provider's order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] on a non-success response (401 when the token expired).
    pub async fn connections(&self, access_token: &str) -> Result<Vec<Tenant>, Error> {
        let url = self.api_endpoint("connections", "tenant listing")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::ensure_success(response, "tenant listing").await?;
        response.json::<Vec<Tenant>>().await.map_err(Into::into)
    }

    /// Removes one connection from the grant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] on a non-success response.
    pub async fn delete_connection(
        &self,
        access_token: &str,
        connection: &ConnectionId,
    ) -> Result<(), Error> {
        let path = format!("connections/{}", urlencoding::encode(&connection.0));
        let url = self.api_endpoint(&path, "disconnect")?;
        let response = self
            .http
            .delete(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::ensure_success(response, "disconnect").await?;
        Ok(())
    }

    /// Disconnects a tenant and returns the refreshed token set for the remaining grant.
    ///
    /// # Errors
    ///
    /// Fails if either the connection removal or the token refresh fails.
    pub async fn disconnect(
        &self,
        token_set: &TokenSet,
        connection: &ConnectionId,
    ) -> Result<TokenSet, Error> {
        self.delete_connection(&token_set.access_token, connection)
            .await?;
        self.refresh(token_set).await
    }

    /// Fetches the organisation records visible for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] on a non-success response (401 when the token expired).
    pub async fn organisations(
        &self,
        access_token: &str,
        tenant_id: &TenantId,
    ) -> Result<Vec<Organisation>, Error> {
        let url = self.api_endpoint("api.xro/2.0/Organisation", "organisation lookup")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("xero-tenant-id", tenant_id.0.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::ensure_success(response, "organisation lookup").await?;
        let envelope = response.json::<OrganisationsEnvelope>().await?;
        Ok(envelope.organisations)
    }

    /// Name of the first organisation visible for a tenant.
    ///
    /// # Errors
    ///
    /// Fails like [`organisations`](Self::organisations), or with [`Error::OAuth`]
    /// if the tenant has no organisation.
    pub async fn organisation_name(
        &self,
        access_token: &str,
        tenant_id: &TenantId,
    ) -> Result<String, Error> {
        self.organisations(access_token, tenant_id)
            .await?
            .into_iter()
            .next()
            .map(|org| org.name)
            .ok_or_else(|| Error::OAuth {
                operation: "organisation lookup",
                status: None,
                detail: format!("no organisation for tenant {tenant_id}"),
            })
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        operation: &'static str,
    ) -> Result<TokenSet, Error> {
        let metadata = self.provider_metadata().await?;
        let response = self
            .http
            .post(metadata.token_endpoint.clone())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(params)
            .send()
            .await?;

        let response = Self::ensure_success(response, operation).await?;
        let token = response.json::<TokenResponse>().await?;
        Ok(token.into_token_set())
    }

    fn api_endpoint(&self, path: &str, operation: &'static str) -> Result<Url, Error> {
        let base = self.config.api_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
            .parse()
            .map_err(|e: url::ParseError| Error::OAuth {
                operation,
                status: None,
                detail: e.to_string(),
            })
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::OAuth {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}
