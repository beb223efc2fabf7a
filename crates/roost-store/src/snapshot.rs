//! JSON snapshot persistence. Only metadata survives a restart: user records
//! without session tokens, channel records without logs. Saves clone the
//! state under brief per-entity locks and do file I/O outside any lock.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::channels::ChannelStore;
use crate::users::UserStore;

pub const USERS_FILE: &str = "users.json";
pub const CHANNELS_FILE: &str = "channels.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub password: String,
    pub level: u8,
    pub messages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub tier: u8,
    pub read: u8,
    pub write: u8,
    pub filter: bool,
}

/// Load both stores from `data_dir`. Missing files mean a fresh instance;
/// unreadable or corrupt files are fatal at startup.
pub fn load_stores(data_dir: &Path, log_cap: usize) -> Result<(UserStore, ChannelStore)> {
    let users = match read_json::<BTreeMap<String, UserRecord>>(&data_dir.join(USERS_FILE))? {
        Some(records) => UserStore::from_records(records),
        None => {
            info!("no {USERS_FILE} in {}, starting empty", data_dir.display());
            UserStore::new()
        }
    };

    let channels = match read_json::<BTreeMap<String, ChannelRecord>>(&data_dir.join(CHANNELS_FILE))? {
        Some(records) => ChannelStore::from_records(records, log_cap),
        None => {
            info!("no {CHANNELS_FILE} in {}, starting empty", data_dir.display());
            ChannelStore::new(log_cap)
        }
    };

    Ok((users, channels))
}

/// Snapshot both stores and write them out, temp file then rename so a crash
/// mid-write never leaves a truncated snapshot behind.
pub fn save_stores(data_dir: &Path, users: &UserStore, channels: &ChannelStore) -> Result<()> {
    write_json(&data_dir.join(USERS_FILE), &users.snapshot())?;
    write_json(&data_dir.join(CHANNELS_FILE), &channels.snapshot())?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value).context("serialize snapshot")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, raw).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    Ok(())
}
