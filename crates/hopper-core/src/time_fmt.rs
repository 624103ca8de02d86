// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable timestamp/duration formatting for list and status output.

/// Format a past timestamp as a friendly age relative to `now_ms`: `"now"`,
/// `"3m"`, `"4h"`, `"2d"`, `"1w"`.
pub fn format_age(timestamp_ms: i64, now_ms: i64) -> String {
    let diff_ms = now_ms - timestamp_ms;
    if diff_ms < 60_000 {
        return "now".to_string();
    }

    let minutes = diff_ms / 60_000;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d");
    }
    let weeks = days / 7;
    format!("{weeks}w")
}

/// Format an elapsed-since-start duration as `"0m"`, `"5m"`, `"2h 15m"`, `"3d 4h"`.
///
/// Minutes are only shown when the uptime is under a day, matching the
/// original's "don't bother with the small unit once it's noise" rule.
pub fn format_uptime(started_at_ms: i64, now_ms: i64) -> String {
    let diff_ms = now_ms - started_at_ms;
    if diff_ms < 60_000 {
        return "0m".to_string();
    }

    let total_minutes = diff_ms / 60_000;
    let days = total_minutes / (60 * 24);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 && days == 0 {
        parts.push(format!("{minutes}m"));
    }

    if parts.is_empty() {
        "0m".to_string()
    } else {
        parts.join(" ")
    }
}

/// Format a duration in milliseconds as `"0s"`, `"5s"`, `"2m"`, `"1h"`.
pub fn format_duration_ms(duration_ms: i64) -> String {
    if duration_ms < 1000 {
        return "0s".to_string();
    }
    let seconds = duration_ms / 1000;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    format!("{hours}h")
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
