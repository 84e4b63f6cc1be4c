//! Storage key layout.
//!
//! Every object lives under `targets/{user_id}/{unix_millis}-{file_name}`.
//! The millisecond stamp is taken per file when the key is derived, so two
//! same-named files issued in the same millisecond collide.

use uuid::Uuid;

/// Top-level key segment.
pub const KEY_ROOT: &str = "targets";

/// Prefix every key owned by `owner` starts with, including the slash.
#[must_use]
pub fn owner_prefix(owner: Uuid) -> String {
    format!("{KEY_ROOT}/{owner}/")
}

/// Key for a new object.
#[must_use]
pub fn derive_key(owner: Uuid, issued_at_millis: i64, file_name: &str) -> String {
    format!(
        "{}{issued_at_millis}-{}",
        owner_prefix(owner),
        sanitize_filename(file_name)
    )
}

/// Whether `key` is inside `owner`'s space and free of path tricks.
#[must_use]
pub fn is_owned_key(key: &str, owner: Uuid) -> bool {
    key.strip_prefix(&owner_prefix(owner))
        .is_some_and(|rest| {
            !rest.is_empty() && rest.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
        })
}

/// Replace anything but ASCII alphanumerics, `.`, `-` and `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
