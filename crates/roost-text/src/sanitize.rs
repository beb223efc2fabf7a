/// Characters allowed in normalized names and channel keys.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Strip untrusted text down to the safe identifier set and cap its length.
/// Total: never fails, empty input yields empty output.
pub fn sanitize(text: &str, max_len: usize) -> String {
    text.chars().filter(|c| is_name_char(*c)).take(max_len).collect()
}
