//! Client name sanitizing.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Maximum length of a client name, in bytes.
pub const CLIENT_NAME_SIZE: usize = 64;

const PATH_SEPARATOR_PATTERN: &str = r"[/\\]";
const PATH_SEPARATOR_REPLACEMENT: &str = "_";

static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_separator_regex() -> &'static Regex {
    SEPARATOR_REGEX.get_or_init(|| Regex::new(PATH_SEPARATOR_PATTERN).expect("valid regex pattern"))
}

/// A client name that fits in [`CLIENT_NAME_SIZE`] bytes.
///
/// Uniqueness and legality are decided by the engine, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientName(String);

impl ClientName {
    /// Rewrite path separators to `_` and truncate to [`CLIENT_NAME_SIZE`]
    /// bytes on a character boundary.
    pub fn sanitize(raw: &str) -> Self {
        let rewritten = get_separator_regex().replace_all(raw, PATH_SEPARATOR_REPLACEMENT);
        ClientName(truncate_to_boundary(&rewritten, CLIENT_NAME_SIZE).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Longest prefix of `value` that is at most `max` bytes and ends on a char boundary.
pub(crate) fn truncate_to_boundary(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }

    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

impl AsRef<str> for ClientName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ClientName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{}", self.0)
    }
}
