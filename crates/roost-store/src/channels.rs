use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use roost_types::api::ChannelInfo;
use roost_types::error::RoutingError;
use roost_types::models::{ChatEntry, Fragment};

use crate::snapshot::ChannelRecord;

/// Per-channel state. Mutated only inside the channel's own lock.
#[derive(Debug)]
pub struct ChannelState {
    pub tier: u8,
    pub read: u8,
    pub write: u8,
    pub filter: bool,
    /// Accepted messages over the channel's lifetime. Never reset, so it can
    /// exceed the number of retained entries once trimming kicks in.
    pub total: u64,
    cap: usize,
    /// Last assigned sequence number. Tracked apart from the log so trimming
    /// (even down to an empty log) never causes a number to be reused.
    last_seq: u64,
    chat: VecDeque<ChatEntry>,
}

impl ChannelState {
    fn new(tier: u8, read: u8, write: u8, filter: bool, cap: usize) -> Self {
        let mut chat = VecDeque::with_capacity(cap.min(128) + 1);
        chat.push_back(ChatEntry::start_of_channel());
        ChannelState { tier, read, write, filter, total: 0, cap, last_seq: 0, chat }
    }

    /// Append one entry with the next sequence number, then trim the oldest
    /// entries past the bound. Sequence numbers are never renumbered.
    pub fn append(&mut self, level: u8, user: &str, content: Vec<Fragment>, time: i64) -> u64 {
        self.last_seq += 1;
        let seq = self.last_seq;
        self.chat.push_back(ChatEntry {
            seq,
            time,
            level,
            user: user.to_string(),
            content,
        });
        while self.chat.len() > self.cap {
            self.chat.pop_front();
        }
        self.total += 1;
        seq
    }

    /// Retained entries with sequence number strictly greater than `after`;
    /// a zero watermark returns the whole retained log.
    pub fn entries_after(&self, after: u64) -> Vec<ChatEntry> {
        if after == 0 {
            return self.chat.iter().cloned().collect();
        }
        self.chat.iter().filter(|e| e.seq > after).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.chat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chat.is_empty()
    }

    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            tier: self.tier,
            read: self.read,
            write: self.write,
            filter: self.filter,
            total: self.total,
        }
    }
}

/// Authoritative mapping of channel key to channel state.
#[derive(Debug)]
pub struct ChannelStore {
    inner: RwLock<HashMap<String, Arc<Mutex<ChannelState>>>>,
    cap: usize,
}

impl ChannelStore {
    pub fn new(cap: usize) -> Self {
        ChannelStore {
            inner: RwLock::new(HashMap::new()),
            cap,
        }
    }

    pub fn create(
        &self,
        key: &str,
        tier: u8,
        read: u8,
        write: u8,
        filter: bool,
    ) -> Result<(), RoutingError> {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if map.contains_key(key) {
            return Err(RoutingError::DuplicateChannel);
        }
        map.insert(
            key.to_string(),
            Arc::new(Mutex::new(ChannelState::new(tier, read, write, filter, self.cap))),
        );
        Ok(())
    }

    /// Run `f` inside the channel's critical section. Returns `None` when the
    /// key is absent; channels are never deleted in-process.
    pub fn with_channel<T>(&self, key: &str, f: impl FnOnce(&mut ChannelState) -> T) -> Option<T> {
        let slot = {
            let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
            map.get(key).cloned()
        }?;
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());
        Some(f(&mut state))
    }

    /// Administrative in-place field merge. Touches thresholds and the filter
    /// flag only, never the log.
    pub fn edit(
        &self,
        key: &str,
        read: Option<u8>,
        write: Option<u8>,
        filter: Option<bool>,
    ) -> Option<()> {
        self.with_channel(key, |ch| {
            if let Some(read) = read {
                ch.read = read;
            }
            if let Some(write) = write {
                ch.write = write;
            }
            if let Some(filter) = filter {
                ch.filter = filter;
            }
        })
    }

    /// Persistable records: tier and thresholds only. Logs and counters are
    /// in-memory state and do not survive a restart.
    pub fn snapshot(&self) -> BTreeMap<String, ChannelRecord> {
        let slots: Vec<(String, Arc<Mutex<ChannelState>>)> = {
            let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        slots
            .into_iter()
            .map(|(key, slot)| {
                let state = slot.lock().unwrap_or_else(|e| e.into_inner());
                (
                    key,
                    ChannelRecord {
                        tier: state.tier,
                        read: state.read,
                        write: state.write,
                        filter: state.filter,
                    },
                )
            })
            .collect()
    }

    pub fn from_records(records: BTreeMap<String, ChannelRecord>, cap: usize) -> Self {
        let map = records
            .into_iter()
            .map(|(key, rec)| {
                (
                    key,
                    Arc::new(Mutex::new(ChannelState::new(
                        rec.tier, rec.read, rec.write, rec.filter, cap,
                    ))),
                )
            })
            .collect();
        ChannelStore {
            inner: RwLock::new(map),
            cap,
        }
    }

    /// Metadata for every channel, log excluded.
    pub fn summaries(&self) -> BTreeMap<String, ChannelInfo> {
        let slots: Vec<(String, Arc<Mutex<ChannelState>>)> = {
            let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        slots
            .into_iter()
            .map(|(key, slot)| {
                let state = slot.lock().unwrap_or_else(|e| e.into_inner());
                (key, state.info())
            })
            .collect()
    }
}
