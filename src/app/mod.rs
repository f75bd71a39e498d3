//! HTTP surface for connecting a browser session to Xero tenants.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use xero_connect::app::{AppConfig, MemorySessionStore, app_routes};
//! use xero_connect::XeroClient;
//!
//! let config = AppConfig::from_env()?;
//! let client = XeroClient::new(config.oauth.clone());
//!
//! let app = axum::Router::new()
//!     .merge(app_routes(config.settings.clone(), client, MemorySessionStore::new()));
//! ```
//!
//! | Route         | Success                                   |
//! |---------------|-------------------------------------------|
//! | `/`           | connection status snippet                 |
//! | `/connect`    | 302 to the provider consent page          |
//! | `/callback`   | 302 to `/` once the code is exchanged     |
//! | `/disconnect` | 302 to `/` after revoking the active tenant |

mod config;
mod cookies;
mod error;
mod routes;
mod state;
mod store;
mod traits;
mod views;

pub use config::{AppConfig, AppSettings, DEFAULT_PORT};
pub use error::AppError;
pub use routes::app_routes;
pub use store::MemorySessionStore;
pub use traits::{AccountingApi, SessionStore};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
