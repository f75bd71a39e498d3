use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Error;

/// Claims of an OpenID Connect ID token.
///
/// Unknown claims are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IdTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub iss: Option<String>,
    /// Either a single audience string or an array of them.
    #[serde(default)]
    pub aud: Option<JsonValue>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub auth_time: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub xero_userid: Option<String>,
    #[serde(default)]
    pub global_session_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Claims of a JWT access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AccessTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    /// Either a single audience string or an array of them.
    #[serde(default)]
    pub aud: Option<JsonValue>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub auth_time: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub xero_userid: Option<String>,
    #[serde(default)]
    pub global_session_id: Option<String>,
    #[serde(default)]
    pub authentication_event_id: Option<String>,
    /// Granted scopes. Accepts a JSON array or a space-delimited string.
    #[serde(default, deserialize_with = "scope_list")]
    pub scope: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

fn scope_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scope {
        List(Vec<String>),
        Delimited(String),
    }

    Ok(match Option::<Scope>::deserialize(deserializer)? {
        Some(Scope::List(scopes)) => scopes,
        Some(Scope::Delimited(scopes)) => scopes.split_whitespace().map(str::to_owned).collect(),
        None => Vec::new(),
    })
}

/// Decodes an ID token's payload without verifying its signature.
///
/// # Errors
///
/// Returns `Error::Token` if the token is not a three-part JWT or its
/// payload is not valid base64url-encoded JSON.
pub fn decode_id_token(token: &str) -> Result<IdTokenClaims, Error> {
    decode_payload(token)
}

/// Decodes an access token's payload without verifying its signature.
///
/// # Errors
///
/// Returns `Error::Token` if the token is not a three-part JWT or its
/// payload is not valid base64url-encoded JSON.
pub fn decode_access_token(token: &str) -> Result<AccessTokenClaims, Error> {
    decode_payload(token)
}

/// Decodes the payload segment of an untrusted JWT into `T`.
pub(crate) fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T, Error> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::Token("invalid token format".into()));
    }

    // Some issuers pad the segment even though JWTs should not be.
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|_| Error::Token("invalid payload encoding".into()))?;

    serde_json::from_slice(&payload).map_err(|e| Error::Token(format!("invalid payload: {e}")))
}
