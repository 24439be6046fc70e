use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Interval used when the species gives no shade-tolerance signal.
pub const DEFAULT_INTERVAL_DAYS: u32 = 7;

/// Shade tolerance as reported by Trefle's growth block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadeTolerance {
    Intolerant,
    Intermediate,
    Tolerant,
}

const TOLERANCE_TABLE: [(&str, ShadeTolerance, u32); 3] = [
    ("intolerant", ShadeTolerance::Intolerant, 2),
    ("intermediate", ShadeTolerance::Intermediate, 5),
    ("tolerant", ShadeTolerance::Tolerant, 10),
];

impl ShadeTolerance {
    pub fn from_tag(tag: &str) -> Option<Self> {
        TOLERANCE_TABLE
            .iter()
            .find(|(t, _, _)| *t == tag)
            .map(|(_, tolerance, _)| *tolerance)
    }

    pub fn interval_days(self) -> u32 {
        TOLERANCE_TABLE
            .iter()
            .find(|(_, tolerance, _)| *tolerance == self)
            .map(|(_, _, days)| *days)
            .unwrap_or(DEFAULT_INTERVAL_DAYS)
    }
}

/// Days between waterings for a shade-tolerance tag. Unknown or absent tags
/// fall back to [`DEFAULT_INTERVAL_DAYS`].
pub fn watering_interval(tolerance: Option<&str>) -> u32 {
    tolerance
        .and_then(ShadeTolerance::from_tag)
        .map(ShadeTolerance::interval_days)
        .unwrap_or(DEFAULT_INTERVAL_DAYS)
}

/// Derived watering judgment for one plant. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WateringStatus {
    MissingData,
    WaterToday,
    Next(NaiveDate),
}

impl WateringStatus {
    /// Due date is `last_watered + interval` days; the plant is due once `now`
    /// reaches it. A zero interval counts as missing.
    pub fn evaluate(
        interval_days: Option<u32>,
        last_watered: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let (interval, last) = match (interval_days, last_watered) {
            (Some(interval), Some(last)) if interval > 0 => (interval, last),
            _ => return WateringStatus::MissingData,
        };
        let due = last + Duration::days(i64::from(interval));
        if now >= due {
            WateringStatus::WaterToday
        } else {
            WateringStatus::Next(due.date_naive())
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, WateringStatus::WaterToday)
    }

    pub fn message(&self) -> String {
        match self {
            WateringStatus::MissingData => "Información faltante".to_string(),
            WateringStatus::WaterToday => "¡Regar hoy!".to_string(),
            WateringStatus::Next(date) => format!("Próximo riego: {}", date.format("%Y-%m-%d")),
        }
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            status: self.message(),
            urgent: self.is_urgent(),
        }
    }
}

/// `{status, urgent}` pair as shown by the dashboard and the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: String,
    pub urgent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn known_tolerances_map_to_intervals() {
        assert_eq!(watering_interval(Some("intolerant")), 2);
        assert_eq!(watering_interval(Some("intermediate")), 5);
        assert_eq!(watering_interval(Some("tolerant")), 10);
    }

    #[test]
    fn unknown_or_absent_tolerance_defaults() {
        assert_eq!(watering_interval(None), 7);
        assert_eq!(watering_interval(Some("")), 7);
        assert_eq!(watering_interval(Some("Tolerant")), 7);
        assert_eq!(watering_interval(Some("very tolerant")), 7);
    }

    #[test]
    fn due_exactly_at_boundary() {
        let last = at(2026, 3, 1, 9);
        let status = WateringStatus::evaluate(Some(3), Some(last), at(2026, 3, 4, 9));
        assert_eq!(status, WateringStatus::WaterToday);
        assert!(status.is_urgent());
    }

    #[test]
    fn not_due_just_before_boundary() {
        let last = at(2026, 3, 1, 9);
        let now = at(2026, 3, 4, 9) - Duration::seconds(1);
        let status = WateringStatus::evaluate(Some(3), Some(last), now);
        assert_eq!(status, WateringStatus::Next(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()));
        assert!(!status.is_urgent());
        assert_eq!(status.message(), "Próximo riego: 2026-03-04");
    }

    #[test]
    fn missing_inputs_report_missing_data() {
        let now = at(2026, 3, 1, 9);
        for status in [
            WateringStatus::evaluate(None, Some(now), now),
            WateringStatus::evaluate(Some(5), None, now),
            WateringStatus::evaluate(None, None, now),
            WateringStatus::evaluate(Some(0), Some(now), now),
        ] {
            assert_eq!(status, WateringStatus::MissingData);
            assert!(!status.report().urgent);
        }
    }

    #[test]
    fn intolerant_plant_watered_three_days_ago_is_due() {
        let now = at(2026, 6, 10, 12);
        let interval = watering_interval(Some("intolerant"));
        let status = WateringStatus::evaluate(Some(interval), Some(now - Duration::days(3)), now);
        assert_eq!(
            status.report(),
            StatusReport { status: "¡Regar hoy!".into(), urgent: true }
        );
    }
}
