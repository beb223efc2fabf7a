use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use roost_store::{ChannelStore, UserStore};
use roost_text::parse_user;
use roost_types::LEVEL_ANONYMOUS;
use roost_types::api::{Ack, IdentityRequest, LoginRequest, LoginResponse};
use roost_types::error::AuthError;

use crate::error::ApiError;

/// Name of the session-credential cookie.
pub const AUTH_COOKIE_NAME: &str = "auth";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserStore,
    pub channels: ChannelStore,
}

/// Who the resolved caller is for the rest of the request: their permission
/// level and display name (caller's casing, sanitized).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub level: u8,
    pub name: String,
}

impl Identity {
    /// Lowercased store key for this identity.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// The credential presented alongside the identity token. Password mode is
/// used at login; session mode everywhere else.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    Password(Option<&'a str>),
    Session(Option<&'a str>),
}

/// Resolve a raw identity token plus credential into (level, name).
///
/// `@name` claims a registered identity and must validate its credential. A
/// bare name is anonymous (level 0) unless it collides with a registered
/// account. Read-only with respect to the store; login/logout rotate the
/// session token separately.
pub fn resolve_identity(
    raw_user: &str,
    credential: Credential<'_>,
    users: &UserStore,
    min_level: u8,
) -> Result<Identity, AuthError> {
    let parsed = parse_user(raw_user);
    let key = parsed.name.to_lowercase();

    let level = if parsed.registered {
        match credential {
            Credential::Password(password) => {
                // Unknown user and wrong password answer identically.
                let (hash, level) = users.credentials(&key).ok_or(AuthError::InvalidPassword)?;
                let password = password.ok_or(AuthError::InvalidPassword)?;
                if !verify_password(password, &hash) {
                    return Err(AuthError::InvalidPassword);
                }
                level
            }
            Credential::Session(token) => {
                let (session, level) = users.session(&key).ok_or(AuthError::InvalidAuth)?;
                match (token, session) {
                    (Some(presented), Some(stored)) if presented == stored => level,
                    _ => return Err(AuthError::InvalidAuth),
                }
            }
        }
    } else if users.contains(&key) {
        // Bare name colliding with a registered account would allow
        // impersonation by coincidence.
        return Err(AuthError::UsernameRegistered);
    } else {
        LEVEL_ANONYMOUS
    };

    if level < min_level {
        return Err(AuthError::AccessDenied);
    }

    Ok(Identity {
        level,
        name: parsed.name,
    })
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .build()
}

pub(crate) fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(AUTH_COOKIE_NAME).map(|c| c.value())
}

/// `POST /login` — password-mode resolution; registered identities get a
/// freshly rotated session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let identity = resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Password(req.password.as_deref()),
        &state.users,
        0,
    )?;

    let jar = if identity.level > 0 {
        let token = state
            .users
            .rotate_session(&identity.key())
            .ok_or(AuthError::InvalidPassword)?;
        jar.add(auth_cookie(token))
    } else {
        jar
    };

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: identity.name,
            level: identity.level,
        }),
    ))
}

/// `POST /logout` — rotates the stored session token, invalidating the one
/// the caller holds, and clears the cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<IdentityRequest>,
) -> Result<(CookieJar, Json<Ack>), ApiError> {
    let identity = resolve_identity(
        req.user.as_deref().unwrap_or(""),
        Credential::Session(session_token(&jar)),
        &state.users,
        0,
    )?;

    if identity.level > 0 {
        state.users.rotate_session(&identity.key());
    }

    let jar = jar.remove(Cookie::from(AUTH_COOKIE_NAME));
    Ok((jar, Json(Ack { success: true })))
}
