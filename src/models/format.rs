//! Interval labels shown next to items and on rating buttons.
use super::ReviewState;

pub fn format_interval(entry: Option<&ReviewState>) -> String {
    let days = match entry {
        Some(entry) if !entry.is_new() => entry.interval,
        _ => return "New".to_string(),
    };

    match days {
        0 => "New".to_string(),
        1 => "1 day".to_string(),
        2..30 => format!("{days} days"),
        30..365 => format!("{} mo", (f64::from(days) / 30.0).round() as u32),
        _ => format!("{:.1} yr", f64::from(days) / 365.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sm2::create_entry;

    fn reviewed(interval: u32) -> ReviewState {
        ReviewState {
            interval,
            last_reviewed_at: 1_700_000_000_000,
            ..create_entry(1_700_000_000_000)
        }
    }

    #[test]
    fn test_new_entries() {
        assert_eq!(format_interval(None), "New");
        assert_eq!(format_interval(Some(&create_entry(5))), "New");
        assert_eq!(format_interval(Some(&reviewed(0))), "New");
    }

    #[test]
    fn test_never_reviewed_ignores_interval() {
        let entry = ReviewState {
            interval: 6,
            ..create_entry(5)
        };
        assert_eq!(format_interval(Some(&entry)), "New");
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(format_interval(Some(&reviewed(1))), "1 day");
        assert_eq!(format_interval(Some(&reviewed(2))), "2 days");
        assert_eq!(format_interval(Some(&reviewed(29))), "29 days");
        assert_eq!(format_interval(Some(&reviewed(30))), "1 mo");
        assert_eq!(format_interval(Some(&reviewed(45))), "2 mo");
        assert_eq!(format_interval(Some(&reviewed(364))), "12 mo");
        assert_eq!(format_interval(Some(&reviewed(365))), "1.0 yr");
        assert_eq!(format_interval(Some(&reviewed(548))), "1.5 yr");
        assert_eq!(format_interval(Some(&reviewed(730))), "2.0 yr");
    }
}
