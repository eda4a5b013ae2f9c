//! Upload filename rules
//!
//! Uploaded names are reduced to a conservative ASCII subset before they are
//! checked against the extension allow-list or used on disk.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Extensions accepted for attachments, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "csv", "xlsx", "xls", "doc", "docx", "txt", "heic", "webp",
];

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid filename regex"));

/// Reduce a client-supplied filename to `[A-Za-z0-9_.-]`.
///
/// Path separators become word breaks, whitespace runs become a single `_`,
/// and leading/trailing dots and underscores are stripped, so the result can
/// never name a parent directory. May return an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Whether `filename` carries an allow-listed extension.
pub fn is_allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// On-disk name for an accepted upload: `{YYYYmmddHHMMSSffffff}_{name}`.
pub fn stored_file_name(now: DateTime<Utc>, sanitized: &str) -> String {
    format!("{}_{}", now.format("%Y%m%d%H%M%S%6f"), sanitized)
}
