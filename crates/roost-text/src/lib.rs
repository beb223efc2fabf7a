//! Pure text leaves of the ingestion pipeline: sanitation, identity and
//! channel token parsing, and message tokenization. Everything here is total
//! and deterministic; nothing touches shared state beyond the
//! [`MentionDirectory`] lookup seam.

pub mod ident;
pub mod sanitize;
pub mod tokenize;

pub use ident::{ParsedChannel, ParsedUser, parse_channel, parse_user};
pub use sanitize::{is_name_char, sanitize};
pub use tokenize::{MentionDirectory, tokenize};
