use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Fixed badge/header palette, indexed by [`color_for_module_id`].
pub const MODULE_PALETTE: [&str; 8] = [
    "#667eea", "#764ba2", "#f093fb", "#4facfe", "#43e97b", "#fa709a", "#30cfd0", "#a8edea",
];

pub const INVALID_DATE: &str = "Invalid Date";

// ─── Urgency / progress tiers ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Urgent,
    Warning,
    Normal,
}

impl Urgency {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Warning => "warning",
            Self::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTier {
    Complete,
    Good,
    NeedsWork,
}

impl ProgressTier {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Good => "good",
            Self::NeedsWork => "needs-work",
        }
    }
}

// ─── Dates ──────────────────────────────────────────────────────────────────

/// Parse a backend date-like string. Strings without an offset are read as
/// local time; a bare date is local midnight.
pub fn parse_due(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// `DD.MM.YYYY`, or [`INVALID_DATE`] for anything unparsable.
pub fn format_date(raw: &str) -> String {
    parse_due(raw)
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| INVALID_DATE.into())
}

/// Whole days from `now` until the due instant, rounded up. Negative when
/// overdue, zero when due within the next 24 hours (or just past).
pub fn days_until_due_at(raw: &str, now: DateTime<Local>) -> Option<i64> {
    let due = parse_due(raw)?;
    let ms = (due - now).num_milliseconds() as f64;
    // `as` saturates, and -0.0 becomes 0.
    Some((ms / MS_PER_DAY).ceil() as i64)
}

pub fn format_days_until(days: i64) -> String {
    match days {
        0 => "Heute!".into(),
        1 => "Morgen".into(),
        d if d < 0 => "Überfällig".into(),
        d => format!("in {d} Tagen"),
    }
}

pub fn urgency_class(days: i64) -> Urgency {
    if days <= 2 {
        Urgency::Urgent
    } else if days <= 5 {
        Urgency::Warning
    } else {
        Urgency::Normal
    }
}

// ─── Modules ────────────────────────────────────────────────────────────────

/// Sum of the id's code points modulo the palette size. Absent or empty ids
/// map to the first entry.
pub fn color_for_module_id(id: Option<&str>) -> &'static str {
    let hash: u64 = id
        .unwrap_or_default()
        .chars()
        .map(|c| u64::from(u32::from(c)))
        .sum();
    MODULE_PALETTE[(hash % MODULE_PALETTE.len() as u64) as usize]
}

/// Completion percentage; a module with no tasks counts as 0%.
pub fn progress_percent(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(completed) / f64::from(total) * 100.0
}

pub fn progress_tier(percent: f64) -> ProgressTier {
    if percent == 100.0 {
        ProgressTier::Complete
    } else if percent >= 50.0 {
        ProgressTier::Good
    } else {
        ProgressTier::NeedsWork
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).earliest().unwrap()
    }

    #[test]
    fn test_format_days_until() {
        assert_eq!(format_days_until(0), "Heute!");
        assert_eq!(format_days_until(1), "Morgen");
        assert_eq!(format_days_until(-1), "Überfällig");
        assert_eq!(format_days_until(-30), "Überfällig");
        assert!(format_days_until(7).contains('7'));
        assert_eq!(format_days_until(7), "in 7 Tagen");
    }

    #[test]
    fn test_urgency_boundaries() {
        assert_eq!(urgency_class(-3), Urgency::Urgent);
        assert_eq!(urgency_class(0), Urgency::Urgent);
        assert_eq!(urgency_class(2), Urgency::Urgent);
        assert_eq!(urgency_class(3), Urgency::Warning);
        assert_eq!(urgency_class(5), Urgency::Warning);
        assert_eq!(urgency_class(6), Urgency::Normal);
        assert_eq!(urgency_class(40), Urgency::Normal);
    }

    #[test]
    fn test_module_color_is_deterministic() {
        let a = color_for_module_id(Some("analysis-1"));
        for _ in 0..10 {
            assert_eq!(color_for_module_id(Some("analysis-1")), a);
        }
        assert_eq!(color_for_module_id(None), MODULE_PALETTE[0]);
        assert_eq!(color_for_module_id(Some("")), MODULE_PALETTE[0]);
        // 'a' = 97, 97 % 8 = 1
        assert_eq!(color_for_module_id(Some("a")), MODULE_PALETTE[1]);
        // 'A' + 'B' = 65 + 66 = 131, 131 % 8 = 3
        assert_eq!(color_for_module_id(Some("AB")), MODULE_PALETTE[3]);
    }

    #[test]
    fn test_days_until_due_at() {
        let now = local(2024, 5, 1, 12);
        assert_eq!(days_until_due_at("2024-05-03T12:00:00", now), Some(2));
        assert_eq!(days_until_due_at("2024-05-03T13:00:00", now), Some(3));
        assert_eq!(days_until_due_at("2024-05-01T18:00:00", now), Some(1));
        assert_eq!(days_until_due_at("2024-05-01T06:00:00", now), Some(0));
        assert_eq!(days_until_due_at("2024-04-29T12:00:00", now), Some(-2));
        assert_eq!(days_until_due_at("2024-05-08", now), Some(7));
        assert_eq!(days_until_due_at("not a date", now), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-05-03"), "03.05.2024");
        assert_eq!(format_date("2024-12-24T18:30:00"), "24.12.2024");
        assert_eq!(format_date("2024-01-09 08:00:00"), "09.01.2024");
        assert_eq!(format_date("garbage"), INVALID_DATE);
        assert_eq!(format_date(""), INVALID_DATE);
    }

    #[test]
    fn test_progress_tiers() {
        assert_eq!(progress_tier(progress_percent(5, 10)), ProgressTier::Good);
        assert_eq!(progress_tier(progress_percent(10, 10)), ProgressTier::Complete);
        assert_eq!(progress_tier(progress_percent(2, 10)), ProgressTier::NeedsWork);
        assert_eq!(progress_percent(3, 0), 0.0);
        assert_eq!(progress_tier(progress_percent(0, 0)), ProgressTier::NeedsWork);
    }

    #[test]
    fn test_overfull_module_is_not_complete() {
        // More closed tasks than the total only ever reaches the middle tier.
        assert_eq!(progress_percent(12, 10), 120.0);
        assert_eq!(progress_tier(progress_percent(12, 10)), ProgressTier::Good);
        assert_eq!(progress_tier(100.0), ProgressTier::Complete);
        assert_eq!(progress_tier(99.9), ProgressTier::Good);
    }
}
