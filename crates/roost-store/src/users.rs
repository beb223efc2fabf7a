use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use rand::{Rng, distr::Alphanumeric};
use roost_text::MentionDirectory;
use roost_types::TOKEN_LENGTH;
use roost_types::error::ValidationError;

use crate::snapshot::UserRecord;

/// Per-user state, keyed by the lowercased sanitized name. Session tokens
/// live only here and only in memory; they are never persisted.
#[derive(Debug, Clone)]
pub struct UserState {
    pub password_hash: String,
    pub session: Option<String>,
    pub level: u8,
    pub messages: u64,
}

/// Authoritative mapping of normalized username to user state.
#[derive(Debug, Default)]
pub struct UserStore {
    inner: RwLock<HashMap<String, Arc<Mutex<UserState>>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signup. The password hash is write-once; users are never deleted.
    pub fn insert(&self, key: &str, password_hash: String, level: u8) -> Result<(), ValidationError> {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if map.contains_key(key) {
            return Err(ValidationError::DuplicateUser);
        }
        map.insert(
            key.to_string(),
            Arc::new(Mutex::new(UserState {
                password_hash,
                session: None,
                level,
                messages: 0,
            })),
        );
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.contains_key(key)
    }

    fn with_user<T>(&self, key: &str, f: impl FnOnce(&mut UserState) -> T) -> Option<T> {
        let slot = {
            let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
            map.get(key).cloned()
        }?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());
        Some(f(&mut state))
    }

    /// Stored password hash and level, for password-mode resolution.
    pub fn credentials(&self, key: &str) -> Option<(String, u8)> {
        self.with_user(key, |u| (u.password_hash.clone(), u.level))
    }

    /// Current session token (if any) and level, for cookie-mode resolution.
    pub fn session(&self, key: &str) -> Option<(Option<String>, u8)> {
        self.with_user(key, |u| (u.session.clone(), u.level))
    }

    /// Issue a fresh random token, invalidating any prior one. Token
    /// rotation is the single critical section on the user entry.
    pub fn rotate_session(&self, key: &str) -> Option<String> {
        self.with_user(key, |u| {
            let token = generate_token(TOKEN_LENGTH);
            u.session = Some(token.clone());
            token
        })
    }

    pub fn bump_messages(&self, key: &str) -> Option<()> {
        self.with_user(key, |u| {
            u.messages += 1;
        })
    }

    /// Persistable records: password hash, level, message count. Session
    /// tokens deliberately stay out.
    pub fn snapshot(&self) -> BTreeMap<String, UserRecord> {
        let slots: Vec<(String, Arc<Mutex<UserState>>)> = {
            let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        slots
            .into_iter()
            .map(|(key, slot)| {
                let state = slot.lock().unwrap_or_else(|e| e.into_inner());
                (
                    key,
                    UserRecord {
                        password: state.password_hash.clone(),
                        level: state.level,
                        messages: state.messages,
                    },
                )
            })
            .collect()
    }

    pub fn from_records(records: BTreeMap<String, UserRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|(key, rec)| {
                (
                    key,
                    Arc::new(Mutex::new(UserState {
                        password_hash: rec.password,
                        session: None,
                        level: rec.level,
                        messages: rec.messages,
                    })),
                )
            })
            .collect();
        UserStore { inner: RwLock::new(map) }
    }

    /// Lifetime message count per user, for admin stats.
    pub fn message_counts(&self) -> BTreeMap<String, u64> {
        let slots: Vec<(String, Arc<Mutex<UserState>>)> = {
            let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        slots
            .into_iter()
            .map(|(key, slot)| {
                let state = slot.lock().unwrap_or_else(|e| e.into_inner());
                (key, state.messages)
            })
            .collect()
    }
}

impl MentionDirectory for UserStore {
    fn level_of(&self, name: &str) -> Option<u8> {
        self.with_user(name, |u| u.level)
    }
}

fn generate_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicates() {
        let store = UserStore::new();
        store.insert("bob", "hash".into(), 2).unwrap();
        assert_eq!(
            store.insert("bob", "other".into(), 1),
            Err(ValidationError::DuplicateUser)
        );
        assert!(store.contains("bob"));
        assert!(!store.contains("alice"));
    }

    #[test]
    fn rotation_replaces_the_previous_token() {
        let store = UserStore::new();
        store.insert("bob", "hash".into(), 2).unwrap();

        assert_eq!(store.session("bob"), Some((None, 2)));

        let first = store.rotate_session("bob").unwrap();
        assert_eq!(first.len(), TOKEN_LENGTH);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));

        let second = store.rotate_session("bob").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.session("bob"), Some((Some(second), 2)));
    }

    #[test]
    fn unknown_user_yields_none() {
        let store = UserStore::new();
        assert_eq!(store.rotate_session("ghost"), None);
        assert_eq!(store.credentials("ghost"), None);
        assert_eq!(store.level_of("ghost"), None);
    }

    #[test]
    fn message_counts_accumulate() {
        let store = UserStore::new();
        store.insert("bob", "hash".into(), 2).unwrap();
        store.bump_messages("bob").unwrap();
        store.bump_messages("bob").unwrap();
        assert_eq!(store.message_counts().get("bob"), Some(&2));
    }

    #[test]
    fn mention_directory_reports_levels() {
        let store = UserStore::new();
        store.insert("bob", "hash".into(), 2).unwrap();
        assert_eq!(store.level_of("bob"), Some(2));
        assert_eq!(store.level_of("BOB"), None); // keys are pre-lowercased
    }
}
