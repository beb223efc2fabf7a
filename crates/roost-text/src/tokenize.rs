use censor::Censor;
use roost_types::models::Fragment;

use crate::sanitize::is_name_char;

/// Lookup seam the tokenizer uses to turn `@name` runs into mention
/// fragments. Keys are lowercased, sanitized names.
pub trait MentionDirectory {
    fn level_of(&self, name: &str) -> Option<u8>;
}

impl MentionDirectory for std::collections::HashMap<String, u8> {
    fn level_of(&self, name: &str) -> Option<u8> {
        self.get(name).copied()
    }
}

/// Convert raw message text into an ordered sequence of typed fragments.
///
/// Emoji aliases are expanded first, then (optionally) profanity is masked,
/// then the text is split into mention candidates and literal runs, and
/// finally literal runs are split on newlines. Identical input and directory
/// state always yield identical output.
pub fn tokenize(raw: &str, filter: bool, users: &dyn MentionDirectory) -> Vec<Fragment> {
    let expanded = expand_aliases(raw);
    let text = if filter {
        Censor::Standard.censor(&expanded)
    } else {
        expanded
    };

    let mut frags = Vec::new();
    for part in split_mentions(&text) {
        if let Some(name) = part.strip_prefix('@') {
            if let Some(level) = users.level_of(&name.to_lowercase()) {
                frags.push(Fragment::mention(level, part));
                continue;
            }
        }
        push_literal(&mut frags, &part);
    }

    frags.retain(|f| !matches!(f, Fragment::Text(t) if t.is_empty()));
    frags
}

/// Expand `:alias:` shortcodes into emoji glyphs, leaving unrecognized text
/// untouched. The closing colon of a failed alias may open the next one, so
/// `:notreal:tada:` still expands the tada.
fn expand_aliases(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(':') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(':') {
            Some(end) => {
                if let Some(emoji) = emojis::get_by_shortcode(&after[..end]) {
                    out.push_str(emoji.as_str());
                    rest = &after[end + 1..];
                } else {
                    out.push(':');
                    rest = after;
                }
            }
            None => {
                out.push(':');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Split on the mention sigil so each candidate keeps the sigil plus the run
/// of name characters after it; everything from the first non-name character
/// on stays literal. `@alice!` becomes `@alice` and `!`.
fn split_mentions(text: &str) -> Vec<String> {
    let mut parts = text.split('@');
    let mut out = Vec::new();

    if let Some(first) = parts.next() {
        out.push(first.to_string());
    }
    for piece in parts {
        match piece.find(|c: char| !is_name_char(c)) {
            Some(idx) => {
                out.push(format!("@{}", &piece[..idx]));
                out.push(piece[idx..].to_string());
            }
            None => out.push(format!("@{piece}")),
        }
    }

    out
}

/// Append a literal run, splitting out newline markers and merging with a
/// preceding text fragment when nothing separates them.
fn push_literal(frags: &mut Vec<Fragment>, text: &str) {
    let mut lines = text.split('\n');

    if let Some(first) = lines.next() {
        append_text(frags, first);
    }
    for line in lines {
        frags.push(Fragment::newline());
        append_text(frags, line);
    }
}

fn append_text(frags: &mut Vec<Fragment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Fragment::Text(prev)) = frags.last_mut() {
        prev.push_str(text);
    } else {
        frags.push(Fragment::text(text));
    }
}
