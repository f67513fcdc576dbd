use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("valid pid name regex"));

/// Build a catalog PID from `prefix` and a microsecond timestamp.
pub fn generate_pid(prefix: &str) -> String {
    pid_at(prefix, Utc::now())
}

pub fn pid_at(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}{}", at.format("%Y%m%d%H%M%S%6f"))
}

/// URL-safe record name for a PID: every non-alphanumeric becomes `-`.
pub fn pid_to_name(pid: &str) -> String {
    NON_NAME_CHARS.replace_all(pid, "-").into_owned()
}
