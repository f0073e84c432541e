use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};

use crate::models::{CheckIn, PeakHour};
use crate::synth::hour_label;

pub const INSUFFICIENT_HISTORY: &str = "Not enough check-in history yet to estimate peak times.";

const WEEKDAY_NAMES: [&str; 7] = [
    "Sundays",
    "Mondays",
    "Tuesdays",
    "Wednesdays",
    "Thursdays",
    "Fridays",
    "Saturdays",
];
const MIN_PEAK_COUNT: usize = 2;

/// Buckets check-ins by UTC weekday (Sunday = 0) and hour. Empty buckets
/// are left out.
pub fn peak_hours(check_ins: &[CheckIn]) -> Vec<PeakHour> {
    let mut buckets: BTreeMap<(u32, u32), usize> = BTreeMap::new();
    for check_in in check_ins {
        let key = (
            check_in.created_at.weekday().num_days_from_sunday(),
            check_in.created_at.hour(),
        );
        *buckets.entry(key).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|((dow, hour), count)| PeakHour { dow, hour, count })
        .collect()
}

fn is_weekend(peak: &PeakHour) -> bool {
    matches!(peak.dow, 5 | 6)
}

pub fn summarize_peak_times(peaks: &[PeakHour]) -> String {
    let weekend: Vec<&PeakHour> = peaks.iter().filter(|p| is_weekend(p)).collect();
    let use_weekend = !weekend.is_empty();
    let candidates = if use_weekend {
        weekend
    } else {
        peaks.iter().collect()
    };

    let busiest = candidates
        .into_iter()
        .fold(None, |best: Option<&PeakHour>, peak| match best {
            Some(current) if current.count >= peak.count => Some(current),
            _ => Some(peak),
        });

    let Some(busiest) = busiest.filter(|p| p.count >= MIN_PEAK_COUNT) else {
        return INSUFFICIENT_HISTORY.to_string();
    };

    let window = format!(
        "{}-{}",
        hour_label(busiest.hour),
        hour_label(busiest.hour + 2)
    );
    if use_weekend {
        format!("Busiest on weekend evenings, typically {window} on weekends.")
    } else {
        let day = WEEKDAY_NAMES[(busiest.dow % 7) as usize];
        format!("Busiest on {day}, typically {window}.")
    }
}
