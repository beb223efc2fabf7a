use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use roost_text::{parse_channel, tokenize};
use roost_types::MAX_MESSAGE_LENGTH;
use roost_types::api::{Ack, FetchResponse, IdentityRequest, SendMessageRequest};
use roost_types::error::{AuthError, RoutingError, ValidationError};

use crate::auth::{AppState, Credential, resolve_identity, session_token};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct FetchQuery {
    /// Watermark: highest sequence number the caller has already seen.
    /// Zero or absent fetches the whole retained log.
    #[serde(default)]
    pub after: u64,
}

/// `POST /get/{channel}?after=N` — the fetch side of the polling loop.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(query): Query<FetchQuery>,
    jar: CookieJar,
    Json(req): Json<IdentityRequest>,
) -> Result<Json<FetchResponse>, ApiError> {
    let identity = resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        0,
    )?;

    let parsed = parse_channel(&channel);
    let chat = state
        .channels
        .with_channel(&parsed.key, |ch| {
            if ch.read > identity.level {
                return Err(AuthError::AccessDenied);
            }
            Ok(ch.entries_after(query.after))
        })
        .ok_or(RoutingError::InvalidChannel)??;

    Ok(Json(FetchResponse { success: true, chat }))
}

/// `POST /msg/{channel}` — the access-controlled append pipeline.
///
/// Truncation to the message length cap happens before tokenizing; an alias
/// clipped by the cap simply fails to expand and stays literal.
pub async fn send_message(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    jar: CookieJar,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Ack>, ApiError> {
    let identity = resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        0,
    )?;

    let parsed = parse_channel(&channel);
    let filter = state
        .channels
        .with_channel(&parsed.key, |ch| {
            if ch.write > identity.level {
                return Err(AuthError::AccessDenied);
            }
            Ok(ch.filter)
        })
        .ok_or(RoutingError::InvalidChannel)??;

    let msg = req.msg.as_deref().unwrap_or("");
    if msg.is_empty() {
        return Err(ValidationError::EmptyMessage.into());
    }

    let content = tokenize(truncate_chars(msg, MAX_MESSAGE_LENGTH), filter, &state.users);
    let now = chrono::Utc::now().timestamp();

    state
        .channels
        .with_channel(&parsed.key, |ch| {
            ch.append(identity.level, &identity.name, content, now)
        })
        .ok_or(RoutingError::InvalidChannel)?;

    if identity.level > 0 {
        state.users.bump_messages(&identity.key());
    }

    Ok(Json(Ack { success: true }))
}

/// Cap by character count, never splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
