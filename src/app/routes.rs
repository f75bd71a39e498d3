use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header::LOCATION};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use super::config::AppSettings;
use super::cookies;
use super::error::AppError;
use super::state::AppState;
use super::traits::{AccountingApi, SessionStore};
use super::views;
use crate::oauth::generate_state;
use crate::session::Session;
use crate::types::SessionId;

/// Create the application router: `/`, `/connect`, `/callback` and `/disconnect`.
pub fn app_routes<C, S>(settings: AppSettings, client: C, session_store: S) -> Router
where
    C: AccountingApi,
    S: SessionStore,
{
    let state = AppState {
        client: Arc::new(client),
        session_store: Arc::new(session_store),
        settings,
    };

    Router::new()
        .route("/", get(index::<C, S>))
        .route("/connect", get(connect::<C, S>))
        .route("/callback", get(callback::<C, S>))
        .route("/disconnect", get(disconnect::<C, S>))
        .with_state(state)
}

// ── Status ─────────────────────────────────────────────────────────

async fn index<C: AccountingApi, S: SessionStore>(
    State(state): State<AppState<C, S>>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Html<String>), AppError> {
    let (jar, session_id, session) = open_session(&state, jar).await?;

    let Session::Connected(conn) = session else {
        return Ok((jar, Html(views::connect())));
    };

    let tenant_id = conn.active_tenant().tenant_id.clone();
    let lookup = state
        .client
        .organisation_name(conn.token_set(), &tenant_id)
        .await;

    match lookup {
        Ok(name) => {
            let html = views::connected(&name);
            state
                .session_store
                .save(&session_id, Session::Connected(conn.with_display_name(name)))
                .await
                .map_err(store_error)?;
            Ok((jar, Html(html)))
        }
        Err(e) if e.is_unauthorized() => {
            tracing::info!(tenant_id = %tenant_id, "Access token rejected, session expired");
            Ok((jar, Html(views::expired(conn.label()))))
        }
        Err(e) => Err(e.into()),
    }
}

// ── Connect ────────────────────────────────────────────────────────

async fn connect<C: AccountingApi, S: SessionStore>(
    State(state): State<AppState<C, S>>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), AppError> {
    let csrf_state = generate_state();
    let consent_url = state.client.consent_url(&csrf_state).await?;

    let jar = jar.add(cookies::state_cookie(
        &csrf_state,
        state.settings.secure_cookies,
    ));

    Ok((jar, found(&consent_url)))
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback<C: AccountingApi, S: SessionStore>(
    State(state): State<AppState<C, S>>,
    jar: PrivateCookieJar,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> (PrivateCookieJar, Result<Response, AppError>) {
    // The state cookie is single use, whatever the outcome.
    let stored_state = cookies::get_state(&jar);
    let jar = jar.remove(cookies::clear_state_cookie());

    match complete_callback(&state, jar.clone(), stored_state, query).await {
        Ok((jar, response)) => (jar, Ok(response)),
        Err(e) => (jar, Err(e)),
    }
}

async fn complete_callback<C: AccountingApi, S: SessionStore>(
    state: &AppState<C, S>,
    jar: PrivateCookieJar,
    stored_state: Option<String>,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> Result<(PrivateCookieJar, Response), AppError> {
    let Query(params) = query.map_err(|e| AppError::Callback(e.body_text()))?;

    if let Some(error) = &params.error {
        let desc = params.error_description.as_deref().unwrap_or("no description");
        return Err(AppError::Callback(format!("{error}: {desc}")));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::Callback("missing authorization code".into()))?;

    let received_state = params
        .state
        .ok_or_else(|| AppError::Callback("missing state".into()))?;

    let stored_state = stored_state
        .ok_or_else(|| AppError::Callback("no authorization request in progress".into()))?;

    if received_state != stored_state {
        return Err(AppError::Callback("state mismatch".into()));
    }

    let (jar, session_id, _) = open_session(state, jar).await?;

    let token_set = state
        .client
        .exchange_code(&code)
        .await
        .map_err(callback_error)?;
    let tenants = state
        .client
        .tenants(&token_set)
        .await
        .map_err(callback_error)?;
    let tenant_count = tenants.len();
    let session = Session::establish(token_set, tenants).map_err(callback_error)?;

    match session.active_tenant() {
        Some(tenant) => tracing::info!(
            session_id = %session_id,
            tenant_id = %tenant.tenant_id,
            tenants = tenant_count,
            "Connected"
        ),
        None => tracing::warn!(session_id = %session_id, "Grant covers no tenants"),
    }

    store_session(state, &session_id, session).await?;

    Ok((jar, found("/")))
}

// ── Disconnect ─────────────────────────────────────────────────────

async fn disconnect<C: AccountingApi, S: SessionStore>(
    State(state): State<AppState<C, S>>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), AppError> {
    let (jar, session_id, session) = open_session(&state, jar).await?;

    let Session::Connected(conn) = session else {
        return Ok((jar, found("/")));
    };

    let connection = &conn.active_tenant().id;
    tracing::info!(session_id = %session_id, connection_id = %connection, "Disconnecting");

    let updated = state
        .client
        .disconnect(conn.token_set(), connection)
        .await?;
    let tenants = state.client.tenants(&updated).await?;

    let next = if tenants.is_empty() {
        Session::Disconnected
    } else {
        Session::establish(updated, tenants)?
    };

    if let Some(tenant) = next.active_tenant() {
        tracing::info!(session_id = %session_id, tenant_id = %tenant.tenant_id, "Switched to next tenant");
    }

    store_session(&state, &session_id, next).await?;

    Ok((jar, found("/")))
}

// ── Helpers ────────────────────────────────────────────────────────

/// Loads the caller's session, issuing a session cookie to new clients.
async fn open_session<C: AccountingApi, S: SessionStore>(
    state: &AppState<C, S>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, SessionId, Session), AppError> {
    let cookie_name = &state.settings.session_cookie_name;

    if let Some(session_id) = cookies::get_session_id(&jar, cookie_name) {
        let session = state
            .session_store
            .load(&session_id)
            .await
            .map_err(store_error)?
            .unwrap_or_default();
        return Ok((jar, session_id, session));
    }

    let session_id = SessionId::generate();
    tracing::debug!(session_id = %session_id, "New session");
    let jar = jar.add(cookies::session_cookie(
        cookie_name,
        &session_id,
        state.settings.secure_cookies,
    ));
    Ok((jar, session_id, Session::default()))
}

/// Replaces the stored session. A disconnected session is dropped from the
/// store; loading a missing id yields [`Session::Disconnected`] again.
async fn store_session<C: AccountingApi, S: SessionStore>(
    state: &AppState<C, S>,
    session_id: &SessionId,
    session: Session,
) -> Result<(), AppError> {
    let result = match session {
        Session::Disconnected => state.session_store.remove(session_id).await,
        connected => state.session_store.save(session_id, connected).await,
    };
    result.map_err(store_error)
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn callback_error(e: crate::error::Error) -> AppError {
    AppError::Callback(e.to_string())
}

fn store_error(e: Box<dyn std::error::Error + Send + Sync>) -> AppError {
    AppError::Store(e.to_string())
}
