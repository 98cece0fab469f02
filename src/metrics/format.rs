use chrono::{DateTime, Utc};

/// Elapsed milliseconds between two instants, clamped at zero
pub fn elapsed_ms_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().max(0)
}

/// Formats a duration as whole minutes and whole seconds, truncating.
/// Minutes are not folded into hours, so 75 minutes reads `75m 0s`.
pub fn format_elapsed_ms(elapsed_ms: i64) -> String {
    let elapsed_ms = elapsed_ms.max(0);
    let minutes = elapsed_ms / 60_000;
    let seconds = (elapsed_ms % 60_000) / 1_000;
    format!("{}m {}s", minutes, seconds)
}
