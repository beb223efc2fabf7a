pub mod api;
pub mod error;
pub mod models;

/// Highest level reachable through signup is 3; 4 is the admin floor and 5
/// is reserved for the synthetic start-of-channel entry.
pub const LEVEL_ANONYMOUS: u8 = 0;
pub const LEVEL_ADMIN: u8 = 4;
pub const LEVEL_SYSTEM: u8 = 5;

pub const MAX_NAME_LENGTH: usize = 16;
pub const MAX_MESSAGE_LENGTH: usize = 256;
pub const TOKEN_LENGTH: usize = 64;
pub const DEFAULT_LOG_CAP: usize = 100;
