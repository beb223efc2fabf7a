use serde::{Deserialize, Serialize};

use crate::LEVEL_SYSTEM;

/// One typed unit of tokenized message content. Plain text serializes as a
/// bare JSON string; markup fragments as tagged objects, so the wire format
/// for a message body looks like:
/// `["hi ", {"type":"mention","level":2,"value":"@bob"}, {"type":"newline"}, "yo"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Text(String),
    Markup(Markup),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Markup {
    Mention { level: u8, value: String },
    Newline,
}

impl Fragment {
    pub fn text(value: impl Into<String>) -> Self {
        Fragment::Text(value.into())
    }

    pub fn mention(level: u8, value: impl Into<String>) -> Self {
        Fragment::Markup(Markup::Mention {
            level,
            value: value.into(),
        })
    }

    pub fn newline() -> Self {
        Fragment::Markup(Markup::Newline)
    }
}

/// One immutable entry in a channel's chat log.
///
/// `seq` is monotonic per channel and never reused, even after the log has
/// been trimmed. `level` and `user` capture the author at post time; edits to
/// the user afterwards do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub seq: u64,
    pub time: i64,
    pub level: u8,
    pub user: String,
    pub content: Vec<Fragment>,
}

impl ChatEntry {
    /// The synthetic entry every channel log starts with. Not counted by the
    /// channel's total-message counter.
    pub fn start_of_channel() -> Self {
        ChatEntry {
            seq: 0,
            time: 0,
            level: LEVEL_SYSTEM,
            user: String::new(),
            content: vec![Fragment::text("- Start of channel")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_wire_format() {
        let frags = vec![
            Fragment::text("hi "),
            Fragment::mention(2, "@bob"),
            Fragment::newline(),
            Fragment::text("yo"),
        ];

        let json = serde_json::to_string(&frags).unwrap();
        assert_eq!(
            json,
            r#"["hi ",{"type":"mention","level":2,"value":"@bob"},{"type":"newline"},"yo"]"#
        );

        let back: Vec<Fragment> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frags);
    }

    #[test]
    fn start_entry_is_seq_zero() {
        let entry = ChatEntry::start_of_channel();
        assert_eq!(entry.seq, 0);
        assert_eq!(entry.time, 0);
        assert_eq!(entry.level, LEVEL_SYSTEM);
        assert!(entry.user.is_empty());
    }
}
