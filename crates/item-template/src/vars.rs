//! Per-item substitution variables.

use chrono::{Duration, Utc};
use uuid::Uuid;

/// Value substituted for `$FOO`.
pub const FOO_VALUE: &str = "BAR";

/// Placeholder names a template may use.
pub const PLACEHOLDER_NAMES: [&str; 4] = ["UUID", "NOW", "BUILD", "FOO"];

/// Unix timestamp in seconds for `minutes` from now (UTC).
///
/// Intended for expiry attributes. Negative offsets point into the past.
pub fn future_timestamp_seconds(minutes: i64) -> i64 {
    (Utc::now() + Duration::minutes(minutes)).timestamp()
}

/// Values available to a template for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemVars {
    /// `$UUID`
    pub uuid: Uuid,
    /// `$NOW`
    pub now: i64,
    /// `$BUILD`
    pub build: u64,
    /// `$FOO`
    pub foo: &'static str,
}

impl ItemVars {
    /// Variables for the item with 1-based sequence number `build`.
    ///
    /// Draws a fresh UUID and reads the clock on every call.
    pub fn for_build(build: u64, offset_minutes: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            now: future_timestamp_seconds(offset_minutes),
            build,
            foo: FOO_VALUE,
        }
    }

    /// Whether `name` is one of [`PLACEHOLDER_NAMES`].
    pub fn is_supported(name: &str) -> bool {
        PLACEHOLDER_NAMES.contains(&name)
    }

    /// Text to substitute for `name`, or `None` if it is not a supported placeholder.
    pub fn get(&self, name: &str) -> Option<String> {
        match name {
            "UUID" => Some(self.uuid.to_string()),
            "NOW" => Some(self.now.to_string()),
            "BUILD" => Some(self.build.to_string()),
            "FOO" => Some(self.foo.to_string()),
            _ => None,
        }
    }
}
