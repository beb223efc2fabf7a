//! End-to-end pipeline coverage: handlers invoked directly with the same
//! extractor values axum would hand them.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use roost_api::auth::{self, AUTH_COOKIE_NAME, AppState, AppStateInner, hash_password};
use roost_api::error::ApiError;
use roost_api::{admin, messages};
use roost_store::{ChannelStore, UserStore};
use roost_types::api::{
    CreateChannelRequest, EditChannelRequest, IdentityRequest, LoginRequest, SendMessageRequest,
    SignupRequest,
};
use roost_types::error::{AuthError, RoutingError, ValidationError};
use roost_types::models::Fragment;

fn app_state() -> AppState {
    let users = UserStore::new();
    users
        .insert("root", hash_password("rootpw").unwrap(), 4)
        .unwrap();
    Arc::new(AppStateInner {
        users,
        channels: ChannelStore::new(100),
    })
}

fn ident(user: &str) -> Json<IdentityRequest> {
    Json(IdentityRequest {
        user: Some(user.to_string()),
    })
}

fn msg(user: &str, text: &str) -> Json<SendMessageRequest> {
    Json(SendMessageRequest {
        user: Some(user.to_string()),
        msg: Some(text.to_string()),
    })
}

async fn login(state: &AppState, user: &str, password: &str) -> CookieJar {
    let (jar, resp) = auth::login(
        State(state.clone()),
        CookieJar::new(),
        Json(LoginRequest {
            user: Some(user.to_string()),
            password: Some(password.to_string()),
        }),
    )
    .await
    .unwrap();
    assert!(resp.0.success);
    jar
}

async fn create(
    state: &AppState,
    jar: &CookieJar,
    user: &str,
    channel: &str,
    read: u8,
    write: u8,
    filter: bool,
) -> Result<(), ApiError> {
    admin::create_channel(
        State(state.clone()),
        Path(channel.to_string()),
        jar.clone(),
        Json(CreateChannelRequest {
            user: Some(user.to_string()),
            read,
            write,
            filter,
        }),
    )
    .await
    .map(|_| ())
}

async fn fetch(
    state: &AppState,
    jar: &CookieJar,
    user: &str,
    channel: &str,
    after: u64,
) -> Result<Vec<roost_types::models::ChatEntry>, ApiError> {
    messages::get_messages(
        State(state.clone()),
        Path(channel.to_string()),
        Query(messages::FetchQuery { after }),
        jar.clone(),
        ident(user),
    )
    .await
    .map(|resp| resp.0.chat)
}

#[tokio::test]
async fn anonymous_post_and_poll() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "lobby", 0, 0, true).await.unwrap();

    let anon = CookieJar::new();
    messages::send_message(
        State(state.clone()),
        Path("lobby".to_string()),
        anon.clone(),
        msg("guest", "hello there"),
    )
    .await
    .unwrap();

    let chat = fetch(&state, &anon, "guest", "lobby", 0).await.unwrap();
    assert_eq!(chat.len(), 2); // synthetic + 1
    assert_eq!(chat[1].seq, 1);
    assert_eq!(chat[1].level, 0);
    assert_eq!(chat[1].user, "guest");
    assert_eq!(chat[1].content, vec![Fragment::text("hello there")]);

    // Watermark polling: only entries strictly newer come back.
    let newer = fetch(&state, &anon, "guest", "lobby", 1).await.unwrap();
    assert!(newer.is_empty());
    let all = fetch(&state, &anon, "guest", "lobby", 0).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn write_threshold_rejects_low_levels_regardless_of_content() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "~announce", 0, 3, true).await.unwrap();

    for text in ["hi", "@root", ":tada:", "x"] {
        let err = messages::send_message(
            State(state.clone()),
            Path("~announce".to_string()),
            CookieJar::new(),
            msg("guest", text),
        )
        .await
        .unwrap_err();
        assert_eq!(err, ApiError::Auth(AuthError::AccessDenied));
    }

    // Reading stays open: thresholds are independent.
    let chat = fetch(&state, &CookieJar::new(), "guest", "~announce", 0).await.unwrap();
    assert_eq!(chat.len(), 1);
}

#[tokio::test]
async fn read_threshold_gates_fetch() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "&mods", 2, 2, true).await.unwrap();

    let err = fetch(&state, &CookieJar::new(), "guest", "&mods", 0).await.unwrap_err();
    assert_eq!(err, ApiError::Auth(AuthError::AccessDenied));

    let chat = fetch(&state, &jar, "@root", "&mods", 0).await.unwrap();
    assert_eq!(chat.len(), 1);
}

#[tokio::test]
async fn unknown_channel_is_invalid_before_thresholds() {
    let state = app_state();
    let err = fetch(&state, &CookieJar::new(), "guest", "nowhere", 0).await.unwrap_err();
    assert_eq!(err, ApiError::Routing(RoutingError::InvalidChannel));

    let err = messages::send_message(
        State(state.clone()),
        Path("nowhere".to_string()),
        CookieJar::new(),
        msg("guest", "hi"),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Routing(RoutingError::InvalidChannel));
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "lobby", 0, 0, true).await.unwrap();

    let err = messages::send_message(
        State(state.clone()),
        Path("lobby".to_string()),
        CookieJar::new(),
        msg("guest", ""),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::EmptyMessage));

    let err = messages::send_message(
        State(state.clone()),
        Path("lobby".to_string()),
        CookieJar::new(),
        Json(SendMessageRequest {
            user: Some("guest".into()),
            msg: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::EmptyMessage));
}

#[tokio::test]
async fn signup_login_post_mention_roundtrip() {
    let state = app_state();
    let root_jar = login(&state, "@root", "rootpw").await;
    create(&state, &root_jar, "@root", "lobby", 0, 0, false).await.unwrap();

    admin::signup(
        State(state.clone()),
        root_jar.clone(),
        Json(SignupRequest {
            user: Some("@root".into()),
            new_user: Some("Bob".into()),
            level: Some(2),
            password: Some("bobpw".into()),
        }),
    )
    .await
    .unwrap();

    let bob_jar = login(&state, "@Bob", "bobpw").await;
    messages::send_message(
        State(state.clone()),
        Path("lobby".to_string()),
        bob_jar.clone(),
        msg("@Bob", "hi @bob\nyo"),
    )
    .await
    .unwrap();

    let chat = fetch(&state, &bob_jar, "@Bob", "lobby", 0).await.unwrap();
    assert_eq!(chat.len(), 2); // synthetic + Bob's post
    let entry = &chat[1];
    assert_eq!(entry.seq, 1);
    assert_eq!(entry.user, "Bob");
    assert_eq!(entry.level, 2);
    assert_eq!(
        entry.content,
        vec![
            Fragment::text("hi "),
            Fragment::mention(2, "@bob"),
            Fragment::newline(),
            Fragment::text("yo"),
        ]
    );

    // Registered authors accrue lifetime message counts.
    assert_eq!(state.users.message_counts().get("bob"), Some(&1));
}

#[tokio::test]
async fn signup_validates_level_and_params() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;

    let err = admin::signup(
        State(state.clone()),
        jar.clone(),
        Json(SignupRequest {
            user: Some("@root".into()),
            new_user: Some("eve".into()),
            level: Some(4),
            password: Some("pw".into()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::InvalidLevel));

    let err = admin::signup(
        State(state.clone()),
        jar.clone(),
        Json(SignupRequest {
            user: Some("@root".into()),
            new_user: None,
            level: Some(2),
            password: Some("pw".into()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::MissingParams));

    let err = admin::signup(
        State(state.clone()),
        jar.clone(),
        Json(SignupRequest {
            user: Some("@root".into()),
            new_user: Some("Root".into()),
            level: Some(2),
            password: Some("pw".into()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::DuplicateUser));

    // Non-admins cannot reach signup at all.
    let err = admin::signup(
        State(state.clone()),
        CookieJar::new(),
        Json(SignupRequest {
            user: Some("guest".into()),
            new_user: Some("eve".into()),
            level: Some(1),
            password: Some("pw".into()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Auth(AuthError::AccessDenied));
}

#[tokio::test]
async fn create_channel_gates() {
    let state = app_state();
    let root_jar = login(&state, "@root", "rootpw").await;

    admin::signup(
        State(state.clone()),
        root_jar.clone(),
        Json(SignupRequest {
            user: Some("@root".into()),
            new_user: Some("mod".into()),
            level: Some(1),
            password: Some("modpw".into()),
        }),
    )
    .await
    .unwrap();
    let mod_jar = login(&state, "@mod", "modpw").await;

    // Level 1 can create restricted (tier 0) but not moderate (tier 1).
    create(&state, &mod_jar, "@mod", "~ok", 0, 0, true).await.unwrap();
    let err = create(&state, &mod_jar, "@mod", "&nope", 0, 0, true).await.unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::InsufficientLevel));

    // Thresholds above the creator's own level are refused.
    let err = create(&state, &mod_jar, "@mod", "~high", 0, 2, true).await.unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::InsufficientLevel));

    // Only admins may disable the profanity filter.
    let err = create(&state, &mod_jar, "@mod", "~raw", 0, 0, false).await.unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::FilterToggleDenied));
    create(&state, &root_jar, "@root", "raw", 0, 0, false).await.unwrap();

    // Duplicate keys are refused.
    let err = create(&state, &root_jar, "@root", "~ok", 0, 0, true).await.unwrap_err();
    assert_eq!(err, ApiError::Routing(RoutingError::DuplicateChannel));
}

#[tokio::test]
async fn logout_invalidates_the_old_session() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "lobby", 1, 1, true).await.unwrap();

    let old_token = jar.get(AUTH_COOKIE_NAME).unwrap().value().to_string();

    let (cleared, resp) = auth::logout(State(state.clone()), jar.clone(), ident("@root"))
        .await
        .unwrap();
    assert!(resp.0.success);
    assert!(cleared.get(AUTH_COOKIE_NAME).is_none());

    // The credential issued before logout no longer resolves.
    let stale = CookieJar::new().add(Cookie::new(AUTH_COOKIE_NAME, old_token));
    let err = fetch(&state, &stale, "@root", "lobby", 0).await.unwrap_err();
    assert_eq!(err, ApiError::Auth(AuthError::InvalidAuth));
}

#[tokio::test]
async fn bare_name_collision_is_rejected() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "lobby", 0, 0, true).await.unwrap();

    let err = fetch(&state, &CookieJar::new(), "Root", "lobby", 0).await.unwrap_err();
    assert_eq!(err, ApiError::Auth(AuthError::UsernameRegistered));
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let state = app_state();
    let err = auth::login(
        State(state.clone()),
        CookieJar::new(),
        Json(LoginRequest {
            user: Some("@root".into()),
            password: Some("wrong".into()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Auth(AuthError::InvalidPassword));
}

#[tokio::test]
async fn edit_merges_thresholds_in_place() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "lobby", 0, 0, true).await.unwrap();

    admin::edit_channel(
        State(state.clone()),
        Path("lobby".to_string()),
        jar.clone(),
        Json(EditChannelRequest {
            user: Some("@root".into()),
            edits: roost_types::api::ChannelEdits {
                read: None,
                write: Some(3),
                filter: None,
            },
        }),
    )
    .await
    .unwrap();

    // Anonymous writes now bounce off the raised threshold.
    let err = messages::send_message(
        State(state.clone()),
        Path("lobby".to_string()),
        CookieJar::new(),
        msg("guest", "hi"),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Auth(AuthError::AccessDenied));

    // Reads were left untouched.
    fetch(&state, &CookieJar::new(), "guest", "lobby", 0).await.unwrap();
}

#[tokio::test]
async fn stats_and_listing_require_the_admin_floor() {
    let state = app_state();
    let jar = login(&state, "@root", "rootpw").await;
    create(&state, &jar, "@root", "lobby", 0, 0, true).await.unwrap();

    for _ in 0..3 {
        messages::send_message(
            State(state.clone()),
            Path("lobby".to_string()),
            CookieJar::new(),
            msg("guest", "spam"),
        )
        .await
        .unwrap();
    }

    let stats = admin::stats(State(state.clone()), jar.clone(), ident("@root"))
        .await
        .unwrap();
    assert_eq!(stats.0.total, 3);
    assert_eq!(stats.0.channels.get("lobby"), Some(&3));

    let listing = admin::list_channels(State(state.clone()), jar.clone(), ident("@root"))
        .await
        .unwrap();
    assert_eq!(listing.0.get("lobby").map(|c| c.total), Some(3));

    let err = admin::stats(State(state.clone()), CookieJar::new(), ident("guest"))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Auth(AuthError::AccessDenied));
}
