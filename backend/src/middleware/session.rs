//! Per-request session handle backed by the session store.
//!
//! The middleware resolves the `lbh_session` cookie to a stored
//! [`SessionState`], hands the handler a [`SessionHandle`], and writes the
//! state back once the handler is done.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    error::AppError,
    models::session::SessionState,
    state::AppState,
    utils::{
        cookies::{
            build_clear_session_cookie, build_session_cookie, extract_cookie_value,
            SESSION_COOKIE_NAME,
        },
        session_token::{create_session_token, verify_session_token},
    },
};

/// Request-scoped access to the caller's session.
#[derive(Clone, Debug)]
pub struct SessionHandle(Arc<Mutex<SessionState>>);

impl SessionHandle {
    pub fn new(session: SessionState) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.0.lock().await
    }
}

pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let now = state.clock.now_utc();
    let cookie_session_id = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| extract_cookie_value(cookies, SESSION_COOKIE_NAME))
        .and_then(|token| {
            verify_session_token(&token, &state.config.session_secret, now)
                .map_err(|err| tracing::debug!(error = %err, "ignoring session cookie"))
                .ok()
        });

    let stored = match cookie_session_id {
        Some(id) => state.sessions.find(id, now).await?,
        None => None,
    };
    let persisted = stored.is_some();
    let session = stored.unwrap_or_else(|| SessionState::new(now, state.session_lifetime()));
    let snapshot = session.clone();

    let handle = SessionHandle::new(session);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let session = handle.lock().await.clone();
    if session.destroyed {
        if persisted {
            state.sessions.delete(session.id).await?;
        }
        tracing::info!(session_id = %session.id, "session destroyed");
        set_cookie(&mut response, build_clear_session_cookie(state.cookie_options()));
        return Ok(response);
    }

    if session == snapshot || (!persisted && session.is_empty()) {
        return Ok(response);
    }

    state.sessions.save(&session).await?;
    if !persisted {
        let token = create_session_token(
            session.id,
            now,
            session.expires_at,
            &state.config.session_secret,
        )?;
        let max_age = (session.expires_at - now).to_std().unwrap_or_default();
        set_cookie(
            &mut response,
            build_session_cookie(&token, max_age, state.cookie_options()),
        );
    }

    Ok(response)
}

fn set_cookie(response: &mut Response, cookie: String) {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(err) => tracing::error!(error = %err, "session cookie is not a valid header value"),
    }
}
