//! OAuth2 / OpenID Connect client for Xero, with a small axum app that keeps
//! one server-side session per browser connected to an active tenant.

pub mod app;
pub mod error;
pub mod oauth;
pub mod session;
pub mod token;
pub mod types;
pub mod well_known;

// Re-exports for convenient access
pub use error::Error;
pub use oauth::{DEFAULT_SCOPES, OAuthConfig, Organisation, XeroClient, generate_state};
pub use session::{Connection, Session};
pub use token::{AccessTokenClaims, IdTokenClaims, decode_access_token, decode_id_token};
pub use types::{ConnectionId, SessionId, Tenant, TenantId, TokenSet};
pub use well_known::ProviderMetadata;
