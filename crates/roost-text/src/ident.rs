use roost_types::MAX_NAME_LENGTH;

use crate::sanitize::sanitize;

/// Sigil claiming a registered identity, and the mention sigil in messages.
pub const USER_SIGIL: char = '@';
/// Channel key prefixes. `~` marks a restricted (tier 0) channel, `&` a
/// moderate (tier 1) one; anything else is open (tier 2).
pub const RESTRICTED_SIGIL: char = '~';
pub const MODERATE_SIGIL: char = '&';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUser {
    /// True when the token claimed a registered identity via `@`.
    pub registered: bool,
    /// Sanitized name, caller's casing preserved. May be empty.
    pub name: String,
}

/// Parse a raw user token. Total: never errors, worst case an empty name.
pub fn parse_user(raw: &str) -> ParsedUser {
    match raw.strip_prefix(USER_SIGIL) {
        Some(rest) => ParsedUser {
            registered: true,
            name: sanitize(rest, MAX_NAME_LENGTH),
        },
        None => ParsedUser {
            registered: false,
            name: sanitize(raw, MAX_NAME_LENGTH),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChannel {
    /// Creation-privilege class, fixed at creation. Creating a channel of
    /// tier `t` requires level >= `t + 1`.
    pub tier: u8,
    /// Normalized key; tier 0 and 1 keys keep their sigil prefix.
    pub key: String,
}

/// Parse a raw channel token into (tier, normalized key).
pub fn parse_channel(raw: &str) -> ParsedChannel {
    if let Some(rest) = raw.strip_prefix(RESTRICTED_SIGIL) {
        ParsedChannel {
            tier: 0,
            key: format!("{RESTRICTED_SIGIL}{}", sanitize(rest, MAX_NAME_LENGTH)),
        }
    } else if let Some(rest) = raw.strip_prefix(MODERATE_SIGIL) {
        ParsedChannel {
            tier: 1,
            key: format!("{MODERATE_SIGIL}{}", sanitize(rest, MAX_NAME_LENGTH)),
        }
    } else {
        ParsedChannel {
            tier: 2,
            key: sanitize(raw, MAX_NAME_LENGTH),
        }
    }
}
