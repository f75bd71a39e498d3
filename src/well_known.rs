use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// Path of the OpenID provider configuration document, relative to the issuer.
pub const OPENID_CONFIGURATION_PATH: &str = ".well-known/openid-configuration";

/// OpenID provider metadata, as published at the discovery endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    #[serde(default)]
    pub userinfo_endpoint: Option<Url>,
    #[serde(default)]
    pub revocation_endpoint: Option<Url>,
    #[serde(default)]
    pub jwks_uri: Option<Url>,
    #[serde(default)]
    pub scopes_supported: Vec<String>,
}

impl ProviderMetadata {
    /// Builds the discovery URL for an issuer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the joined URL is invalid.
    pub fn discovery_url(issuer: &Url) -> Result<Url, Error> {
        let mut base = issuer.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(OPENID_CONFIGURATION_PATH)
            .map_err(|e| Error::Discovery(format!("{issuer}: {e}")))
    }
}
