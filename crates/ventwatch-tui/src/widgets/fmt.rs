//! Compact value formatting for panels and tables.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use ratatui::style::Style;
use ratatui::text::Span;

use ventwatch_core::WifiSignal;

use crate::theme;

pub const MISSING: &str = "--";

pub fn fmt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.into(), |v| format!("{v:.0}%"))
}

pub fn fmt_hpa(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.into(), |v| format!("{v:.0} hPa"))
}

/// Device uptime, trimmed to minutes once past the first minute.
pub fn fmt_uptime(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return MISSING.into();
    };
    let secs = d.as_secs();
    let rounded = if secs >= 60 { secs - secs % 60 } else { secs };
    humantime::format_duration(Duration::from_secs(rounded)).to_string()
}

pub fn fmt_heap(bytes: Option<u64>) -> String {
    bytes.map_or_else(|| MISSING.into(), |b| bytesize::ByteSize::b(b).to_string())
}

/// "45m", "2h", "1h 30m", "3d 4h". Sub-minute spans read "<1m".
pub fn fmt_span(d: chrono::Duration) -> String {
    let mins = d.num_minutes().max(0);
    let (days, hours, minutes) = (mins / 1440, (mins % 1440) / 60, mins % 60);
    match (days, hours, minutes) {
        (0, 0, 0) => "<1m".into(),
        (0, 0, m) => format!("{m}m"),
        (0, h, 0) => format!("{h}h"),
        (0, h, m) => format!("{h}h {m}m"),
        (d, 0, _) => format!("{d}d"),
        (d, h, _) => format!("{d}d {h}h"),
    }
}

/// "just now", "40s ago", "12m ago", "3h ago".
pub fn fmt_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    match secs {
        i64::MIN..5 => "just now".into(),
        5..60 => format!("{secs}s ago"),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86_400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

/// Local wall-clock time; the date is added for anything not from today.
pub fn fmt_clock(ts: Option<DateTime<Utc>>) -> String {
    let Some(ts) = ts else {
        return MISSING.into();
    };
    let local = ts.with_timezone(&Local);
    if local.date_naive() == Local::now().date_naive() {
        local.format("%H:%M").to_string()
    } else {
        local.format("%m-%d %H:%M").to_string()
    }
}

/// Signal bars (▂▄▆█) colored by link quality.
pub fn signal_span(rssi_dbm: Option<i32>) -> Span<'static> {
    let Some(dbm) = rssi_dbm else {
        return Span::styled("····", theme::muted());
    };
    let signal = WifiSignal::from_rssi(dbm);
    let bars = match signal.bars() {
        4 => "▂▄▆█",
        3 => "▂▄▆ ",
        2 => "▂▄  ",
        _ => "▂   ",
    };
    let color = match signal {
        WifiSignal::Excellent => theme::SUCCESS_GREEN,
        WifiSignal::Good => theme::NEON_CYAN,
        WifiSignal::Fair => theme::ELECTRIC_YELLOW,
        WifiSignal::Weak => theme::CORAL,
    };
    Span::styled(format!("{bars} {dbm} dBm"), Style::default().fg(color))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn spans_are_compact() {
        assert_eq!(fmt_span(chrono::Duration::seconds(20)), "<1m");
        assert_eq!(fmt_span(chrono::Duration::minutes(45)), "45m");
        assert_eq!(fmt_span(chrono::Duration::minutes(120)), "2h");
        assert_eq!(fmt_span(chrono::Duration::minutes(90)), "1h 30m");
        assert_eq!(fmt_span(chrono::Duration::hours(76)), "3d 4h");
        assert_eq!(fmt_span(chrono::Duration::minutes(-5)), "<1m");
    }

    #[test]
    fn ages_pick_the_largest_unit() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(fmt_age(now, now), "just now");
        assert_eq!(fmt_age(now - chrono::Duration::seconds(40), now), "40s ago");
        assert_eq!(fmt_age(now - chrono::Duration::minutes(12), now), "12m ago");
        assert_eq!(fmt_age(now - chrono::Duration::hours(3), now), "3h ago");
        assert_eq!(fmt_age(now - chrono::Duration::days(2), now), "2d ago");
    }

    #[test]
    fn missing_values_render_as_dashes() {
        assert_eq!(fmt_pct(None), "--");
        assert_eq!(fmt_hpa(None), "--");
        assert_eq!(fmt_uptime(None), "--");
        assert_eq!(fmt_heap(None), "--");
        assert_eq!(fmt_clock(None), "--");
        assert_eq!(fmt_pct(Some(48.4)), "48%");
        assert_eq!(fmt_hpa(Some(1012.8)), "1013 hPa");
    }

    #[test]
    fn uptime_drops_seconds_after_a_minute() {
        assert_eq!(fmt_uptime(Some(Duration::from_secs(3661))), "1h 1m");
        assert_eq!(fmt_uptime(Some(Duration::from_secs(42))), "42s");
        assert_eq!(fmt_heap(Some(512)), "512 B");
    }
}
