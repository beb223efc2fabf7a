use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ChatEntry;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: String,
    pub level: u8,
}

/// Body carried by every request that only needs to say who is asking.
#[derive(Debug, Deserialize)]
pub struct IdentityRequest {
    pub user: Option<String>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub user: Option<String>,
    pub msg: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub success: bool,
    pub chat: Vec<ChatEntry>,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

// -- Administration --

#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub user: Option<String>,
    #[serde(default)]
    pub read: u8,
    #[serde(default)]
    pub write: u8,
    #[serde(default = "default_filter")]
    pub filter: bool,
}

fn default_filter() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub user: Option<String>,
    #[serde(rename = "new-user")]
    pub new_user: Option<String>,
    pub level: Option<u8>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelEdits {
    pub read: Option<u8>,
    pub write: Option<u8>,
    pub filter: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EditChannelRequest {
    pub user: Option<String>,
    #[serde(default)]
    pub edits: ChannelEdits,
}

/// Channel metadata as reported to admins. Never includes the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelInfo {
    pub tier: u8,
    pub read: u8,
    pub write: u8,
    pub filter: bool,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: u64,
    pub channels: BTreeMap<String, u64>,
    pub users: BTreeMap<String, u64>,
}
