use chrono::Local;

/// Wall-clock `HH:MM:SS`, local time, for `[SENT]`/`[RECVD]` log lines.
pub fn wall_clock_hms() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
