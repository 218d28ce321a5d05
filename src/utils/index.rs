use std::time::Duration;

/// Render an amount in atoms with `decimals` fractional digits, keeping the sign.
pub fn format_amount(atoms: i64, decimals: u32) -> String {
    format!(
        "{:.*}",
        decimals as usize,
        atoms as f64 / 10f64.powi(decimals as i32)
    )
}

/// Compact duration label such as `2m`, `1h5m` or `30s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total % 86_400) / 3_600,
        (total % 3_600) / 60,
        total % 60,
    );

    if days > 0 {
        format!("{}d{}h", days, hours)
    } else if hours > 0 {
        if minutes > 0 {
            format!("{}h{}m", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Label for how long ago `then` was, relative to `now`. Future times read as `now`.
pub fn format_time_ago(now: i64, then: i64) -> String {
    if then >= now {
        return "now".to_string();
    }
    format!("{} ago", format_duration(Duration::from_secs((now - then) as u64)))
}

/// Clamp a library-reported percentage into `0..=100`.
pub fn percent(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}
