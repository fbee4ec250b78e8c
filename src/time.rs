use chrono::Utc;

/// Wall-clock now in epoch seconds, the unit horse anchors are stored in.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

// Short countdown for embeds: "1h 5m", "3m 20s", "5m", "45s"
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 && secs == 0 {
        format!("{}m", minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
