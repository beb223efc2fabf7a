//! Authoritative in-memory state: the User Store and the Channel Store.
//!
//! Both stores are maps of normalized key to a per-entity `Arc<Mutex<_>>`.
//! The outer map lock is held only long enough to fetch the entity handle,
//! so writers to different channels never block each other, while append +
//! trim + counter updates on one channel run as a single critical section.

pub mod channels;
pub mod snapshot;
pub mod users;

pub use channels::{ChannelState, ChannelStore};
pub use snapshot::{ChannelRecord, UserRecord, load_stores, save_stores};
pub use users::{UserState, UserStore};
