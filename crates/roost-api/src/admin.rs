use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;

use roost_text::{parse_channel, sanitize};
use roost_types::api::{
    Ack, ChannelInfo, CreateChannelRequest, EditChannelRequest, IdentityRequest, SignupRequest,
    StatsResponse,
};
use roost_types::error::{RoutingError, ValidationError};
use roost_types::{LEVEL_ADMIN, MAX_NAME_LENGTH};

use crate::auth::{AppState, Credential, resolve_identity, session_token};
use crate::error::ApiError;

use std::collections::BTreeMap;

/// `POST /dev/create/{channel}` — channel creation.
///
/// Gates: creator level must reach the tier's creation floor (tier + 1) and
/// both requested thresholds; switching the profanity filter off requires
/// the admin floor. Read and write thresholds are independent by design;
/// read <= write is deliberately not enforced.
pub async fn create_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    jar: CookieJar,
    Json(req): Json<CreateChannelRequest>,
) -> Result<Json<Ack>, ApiError> {
    let identity = resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        0,
    )?;

    let parsed = parse_channel(&channel);
    if identity.level < parsed.tier + 1 {
        return Err(ValidationError::InsufficientLevel.into());
    }
    if req.read > identity.level || req.write > identity.level {
        return Err(ValidationError::InsufficientLevel.into());
    }
    if !req.filter && identity.level < LEVEL_ADMIN {
        return Err(ValidationError::FilterToggleDenied.into());
    }

    state
        .channels
        .create(&parsed.key, parsed.tier, req.read, req.write, req.filter)?;

    info!(key = %parsed.key, tier = parsed.tier, by = %identity.name, "channel created");
    Ok(Json(Ack { success: true }))
}

/// `POST /dev/signup` — admin-only account creation. Requested level must be
/// in the non-admin range 1..=3.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignupRequest>,
) -> Result<Json<Ack>, ApiError> {
    resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        LEVEL_ADMIN,
    )?;

    let name = sanitize(req.new_user.as_deref().unwrap_or(""), MAX_NAME_LENGTH);
    let (level, password) = match (req.level, req.password.as_deref()) {
        (Some(level), Some(password)) if !name.is_empty() && !password.is_empty() => {
            (level, password)
        }
        _ => return Err(ValidationError::MissingParams.into()),
    };
    if level == 0 || level >= LEVEL_ADMIN {
        return Err(ValidationError::InvalidLevel.into());
    }

    let hash = crate::auth::hash_password(password).map_err(|_| ApiError::Internal)?;
    state.users.insert(&name.to_lowercase(), hash, level)?;

    info!(user = %name, level, "user created");
    Ok(Json(Ack { success: true }))
}

/// `POST /dev/stats` — grand total plus per-channel and per-user counters.
pub async fn stats(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<IdentityRequest>,
) -> Result<Json<StatsResponse>, ApiError> {
    resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        LEVEL_ADMIN,
    )?;

    let channels: BTreeMap<String, u64> = state
        .channels
        .summaries()
        .into_iter()
        .map(|(key, info)| (key, info.total))
        .collect();
    let total = channels.values().sum();

    Ok(Json(StatsResponse {
        total,
        channels,
        users: state.users.message_counts(),
    }))
}

/// `POST /dev/channels` — channel metadata, never the logs.
pub async fn list_channels(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<IdentityRequest>,
) -> Result<Json<BTreeMap<String, ChannelInfo>>, ApiError> {
    resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        LEVEL_ADMIN,
    )?;

    Ok(Json(state.channels.summaries()))
}

/// `POST /dev/edit/{channel}` — in-place threshold/filter merge.
pub async fn edit_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    jar: CookieJar,
    Json(req): Json<EditChannelRequest>,
) -> Result<Json<Ack>, ApiError> {
    resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        LEVEL_ADMIN,
    )?;

    let parsed = parse_channel(&channel);
    state
        .channels
        .edit(&parsed.key, req.edits.read, req.edits.write, req.edits.filter)
        .ok_or(RoutingError::InvalidChannel)?;

    Ok(Json(Ack { success: true }))
}

#[derive(Debug, Default, Deserialize)]
pub struct HashQuery {
    pub text: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct HashResponse {
    pub hashed: String,
    pub text: String,
}

/// `GET /dev/hash?text=...` — helper for seeding `users.json` by hand.
pub async fn dev_hash(Query(query): Query<HashQuery>) -> Result<Json<HashResponse>, ApiError> {
    let text = query.text.unwrap_or_default();
    if text.is_empty() {
        return Ok(Json(HashResponse { hashed: String::new(), text }));
    }
    let hashed = crate::auth::hash_password(&text).map_err(|_| ApiError::Internal)?;
    Ok(Json(HashResponse { hashed, text }))
}
