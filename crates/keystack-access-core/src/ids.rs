//! Slugs, record ids, and record keys.

use std::sync::LazyLock;

use regex::Regex;

/// Pictographic and symbol ranges dropped from slugs.
static SYMBOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x{2700}-\x{27BF}\x{E000}-\x{F8FF}\x{1F000}-\x{1F7FF}\x{2011}-\x{26FF}\x{1F910}-\x{1F9FF}]",
    )
    .expect("symbol pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("slug pattern is valid"));

/// Record id prefix.
const RECORD_ID_PREFIX: &str = "evt_ac_";

/// Turn a display name into a group slug: `"Orders Webhook"` -> `"orders-webhook"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let text = SYMBOLS.replace_all(name.trim(), "");
    let text = WHITESPACE.replace_all(&text, " ");
    NON_SLUG.replace_all(&text, "-").to_lowercase()
}

/// A fresh record id.
#[must_use]
pub fn new_record_id() -> String {
    format!("{RECORD_ID_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

/// Record key: `event_access::<type>::<group>`.
#[must_use]
pub fn record_key(event_type: &str, group: &str) -> String {
    format!("event_access::{event_type}::{group}")
}
