//! Placeholder chart data derived from the venue seed.
//!
//! Every generator is a pure function of `(range_days, venue_id)`: the same
//! inputs always yield the same series, and each value is clamped to the
//! range documented on its generator.

use std::f64::consts::PI;

use crate::models::{
    ActivityPoint, AgeBand, HeatmapCell, ImpactEstimate, Intent, KpiSnapshot, RelationshipStatus,
    SplitEntry, VibeScore, VibeTrendPoint,
};
use crate::seed::{seeded_random, venue_seed};
use crate::smoothing::{normalize_split, smooth};

const MAX_DAILY_BUCKETS: u32 = 30;
const TARGET_LABELS: u32 = 6;
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
pub const HEATMAP_HOURS: [u32; 10] = [18, 19, 20, 21, 22, 23, 0, 1, 2, 3];

pub const ACTIVITY_RANGE: (f64, f64) = (2.0, 90.0);
pub const HOT_RANGE: (f64, f64) = (5.0, 45.0);
pub const GOOD_RANGE: (f64, f64) = (15.0, 45.0);
pub const OK_RANGE: (f64, f64) = (10.0, 35.0);
pub const QUIET_RANGE: (f64, f64) = (4.0, 18.0);
pub const AVG_VIBE_RANGE: (f64, f64) = (1.0, 4.0);
pub const REPEAT_RANGE: (f64, f64) = (10.0, 60.0);
pub const CHANGE_RANGE: (f64, f64) = (-25.0, 40.0);
pub const LIFT_RANGE: (f64, f64) = (2.0, 18.0);

pub fn daily_buckets(range_days: u32) -> u32 {
    range_days.min(MAX_DAILY_BUCKETS)
}

/// Axis label for a daily bucket; blank when thinned out.
pub fn bucket_label(index: u32, buckets: u32, range_days: u32) -> String {
    if range_days <= 7 {
        return WEEKDAYS[(index % 7) as usize].to_string();
    }

    let step = if range_days <= 14 {
        2
    } else {
        buckets.div_ceil(TARGET_LABELS).max(1)
    };

    if index % step == 0 {
        format!("D{}", index + 1)
    } else {
        String::new()
    }
}

pub fn hour_label(hour: u32) -> String {
    match hour % 24 {
        0 => "12am".to_string(),
        12 => "12pm".to_string(),
        h if h < 12 => format!("{h}am"),
        h => format!("{}pm", h - 12),
    }
}

/// Friday and Saturday in the Monday-first bucket week.
fn is_weekend_bucket(index: u32) -> bool {
    matches!(index % 7, 4 | 5)
}

/// Longer ranges carry more day-to-day variance.
fn variance_scale(range_days: u32) -> f64 {
    1.0 + f64::from(range_days.min(90)) / 90.0
}

fn clamp(value: f64, (lo, hi): (f64, f64)) -> f64 {
    value.clamp(lo, hi)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn wave(index: u32, buckets: u32, phase: f64) -> f64 {
    (f64::from(index) / f64::from(buckets.max(1)) * 2.0 * PI + phase).sin()
}

pub fn activity_trend(range_days: u32, venue_id: &str) -> Vec<ActivityPoint> {
    let seed = venue_seed(venue_id);
    let buckets = daily_buckets(range_days);
    let phase = seeded_random(seed, 1) * 2.0 * PI;
    let amplitude = 8.0 + seeded_random(seed, 2) * 6.0;
    let drift = (seeded_random(seed, 4) - 0.5) * 0.6;
    let base = 20.0 + (seed % 25) as f64;
    let noise_scale = 6.0 * variance_scale(range_days);

    let raw: Vec<f64> = (0..buckets)
        .map(|i| {
            let noise = (seeded_random(seed, u64::from(i) * 7 + 3) - 0.5) * noise_scale;
            let boost = if is_weekend_bucket(i) { 18.0 } else { 0.0 };
            let value = base
                + wave(i, buckets, phase) * amplitude
                + noise
                + boost
                + drift * f64::from(i);
            clamp(value, ACTIVITY_RANGE)
        })
        .collect();

    smooth(&raw)
        .into_iter()
        .enumerate()
        .map(|(i, value)| ActivityPoint {
            label: bucket_label(i as u32, buckets, range_days),
            checkins: value.round() as u32,
        })
        .collect()
}

struct VibeChannel {
    base: f64,
    amplitude: f64,
    weekend_boost: f64,
    range: (f64, f64),
}

const VIBE_CHANNELS: [VibeChannel; 4] = [
    VibeChannel { base: 22.0, amplitude: 6.0, weekend_boost: 8.0, range: HOT_RANGE },
    VibeChannel { base: 30.0, amplitude: 5.0, weekend_boost: 2.0, range: GOOD_RANGE },
    VibeChannel { base: 22.0, amplitude: 4.0, weekend_boost: -3.0, range: OK_RANGE },
    VibeChannel { base: 10.0, amplitude: 3.0, weekend_boost: -3.0, range: QUIET_RANGE },
];

/// Daily hot/good/ok/quiet percentages. Channels are clamped, not normalized.
pub fn vibe_trend(range_days: u32, venue_id: &str) -> Vec<VibeTrendPoint> {
    let seed = venue_seed(venue_id);
    let buckets = daily_buckets(range_days);
    let noise_scale = 6.0 * variance_scale(range_days);

    (0..buckets)
        .map(|i| {
            let mut values = [0.0; 4];
            for (k, channel) in VIBE_CHANNELS.iter().enumerate() {
                let k = k as u64;
                let offset = (seeded_random(seed, 10 + k) - 0.5) * 10.0;
                let phase = seeded_random(seed, 20 + k) * 2.0 * PI;
                let noise =
                    (seeded_random(seed, u64::from(i) * 11 + 30 + k) - 0.5) * noise_scale;
                let boost = if is_weekend_bucket(i) {
                    channel.weekend_boost
                } else {
                    0.0
                };
                let value = channel.base
                    + offset
                    + wave(i, buckets, phase) * channel.amplitude
                    + noise
                    + boost;
                values[k as usize] = round1(clamp(value, channel.range));
            }

            VibeTrendPoint {
                label: bucket_label(i, buckets, range_days),
                hot: values[0],
                good: values[1],
                ok: values[2],
                quiet: values[3],
            }
        })
        .collect()
}

/// Weekly grid of evening intensity in `[0, 1]`, Monday-first, 6pm to 3am.
///
/// The grid is always complete; the range only widens the noise.
pub fn heatmap(range_days: u32, venue_id: &str) -> Vec<HeatmapCell> {
    let seed = venue_seed(venue_id);
    let phase = seeded_random(seed, 40) * PI;
    let noise_scale = 0.1 + 0.1 * f64::from(range_days.min(90)) / 90.0;
    let slots = HEATMAP_HOURS.len() as u32;

    let mut cells = Vec::with_capacity(7 * HEATMAP_HOURS.len());
    for dow in 0..7u32 {
        let day_base = 0.15 + seeded_random(seed, 50 + u64::from(dow)) * 0.15;
        for (slot, hour) in HEATMAP_HOURS.iter().copied().enumerate() {
            let slot = slot as u32;
            let bucket = u64::from(dow * slots + slot);
            let wave = (f64::from(slot) / f64::from(slots) * PI + phase).sin() * 0.2;
            let noise = (seeded_random(seed, bucket * 13 + 60) - 0.5) * noise_scale;
            let mut boost = 0.0;
            if is_weekend_bucket(dow) {
                boost += 0.2;
            }
            if matches!(hour, 22 | 23 | 0) {
                boost += 0.25;
            }
            let intensity = (day_base + wave + noise + boost).clamp(0.0, 1.0);
            cells.push(HeatmapCell {
                dow,
                hour,
                label: format!("{} {}", WEEKDAYS[dow as usize], hour_label(hour)),
                intensity: (intensity * 100.0).round() / 100.0,
            });
        }
    }
    cells
}

fn split(seed: u64, range_days: u32, offset: u64, categories: &[(&str, f64)]) -> Vec<SplitEntry> {
    let raw: Vec<f64> = categories
        .iter()
        .enumerate()
        .map(|(k, (_, base))| {
            let r = seeded_random(seed, offset + k as u64 * 17 + u64::from(range_days));
            base * (0.6 + r * 0.8)
        })
        .collect();

    categories
        .iter()
        .zip(normalize_split(&raw))
        .map(|((label, _), pct)| SplitEntry {
            label: (*label).to_string(),
            pct,
        })
        .collect()
}

pub fn age_split(range_days: u32, venue_id: &str) -> Vec<SplitEntry> {
    let weights = [15.0, 30.0, 28.0, 17.0, 10.0];
    let categories: Vec<(&str, f64)> = AgeBand::ALL
        .iter()
        .map(|band| band.as_str())
        .zip(weights)
        .collect();
    split(venue_seed(venue_id), range_days, 100, &categories)
}

pub fn relationship_split(range_days: u32, venue_id: &str) -> Vec<SplitEntry> {
    let categories = [
        (RelationshipStatus::Single.as_str(), 55.0),
        (RelationshipStatus::Taken.as_str(), 35.0),
        (RelationshipStatus::Complicated.as_str(), 10.0),
    ];
    split(venue_seed(venue_id), range_days, 200, &categories)
}

pub fn intent_split(range_days: u32, venue_id: &str) -> Vec<SplitEntry> {
    let categories = [
        (Intent::Drinks.as_str(), 30.0),
        (Intent::Dancing.as_str(), 25.0),
        (Intent::MeetingPeople.as_str(), 20.0),
        (Intent::DateNight.as_str(), 12.0),
        (Intent::Celebrating.as_str(), 13.0),
    ];
    split(venue_seed(venue_id), range_days, 300, &categories)
}

pub fn vibe_split(range_days: u32, venue_id: &str) -> Vec<SplitEntry> {
    let categories = [
        (VibeScore::Hot.as_str(), 25.0),
        (VibeScore::Good.as_str(), 35.0),
        (VibeScore::Ok.as_str(), 25.0),
        (VibeScore::Quiet.as_str(), 15.0),
    ];
    split(venue_seed(venue_id), range_days, 400, &categories)
}

pub fn ons_split(range_days: u32, venue_id: &str) -> Vec<SplitEntry> {
    let categories = [("yes", 20.0), ("maybe", 30.0), ("no", 50.0)];
    split(venue_seed(venue_id), range_days, 500, &categories)
}

pub fn base_checkins(seed: u64, range_days: u32) -> u32 {
    ((150 + seed % 100) as f64 * (f64::from(range_days) / 7.0)).round() as u32
}

pub fn kpis(range_days: u32, venue_id: &str) -> KpiSnapshot {
    let seed = venue_seed(venue_id);
    let avg_vibe = 2.6 + (seeded_random(seed, 70) - 0.5) * 1.6;
    let repeat = 20.0 + seeded_random(seed, 71) * 35.0;
    let change = (seeded_random(seed, 72 + u64::from(range_days)) - 0.4) * 50.0;

    KpiSnapshot {
        total_checkins: base_checkins(seed, range_days),
        avg_vibe: round1(clamp(avg_vibe, AVG_VIBE_RANGE)),
        repeat_visitor_pct: clamp(repeat.round(), REPEAT_RANGE) as u32,
        change_pct: clamp(change.round(), CHANGE_RANGE) as i32,
    }
}

/// Estimated effect of promoting the venue over the range.
pub fn impact_estimate(range_days: u32, venue_id: &str) -> ImpactEstimate {
    let seed = venue_seed(venue_id);
    let base = f64::from(base_checkins(seed, range_days));
    let lift = 3.0 + seeded_random(seed, 78) * 12.0 + f64::from(range_days.min(90)) / 30.0;

    ImpactEstimate {
        extra_visitors: (base * (0.08 + seeded_random(seed, 77) * 0.07)).round() as u32,
        revenue_lift_pct: round1(clamp(lift, LIFT_RANGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGES: [u32; 4] = [7, 14, 30, 90];
    const VENUES: [&str; 4] = ["abc", "venue-42", "The Velvet Room", "z"];

    fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
        value >= lo && value <= hi
    }

    #[test]
    fn kpi_base_follows_integer_formula() {
        // (150 + 294 % 100) * 30/7 = 1045.71
        assert_eq!(kpis(30, "abc").total_checkins, 1046);
        assert_eq!(kpis(7, "abc").total_checkins, 244);
        assert_eq!(base_checkins(0, 14), 300);
    }

    #[test]
    fn series_are_deterministic() {
        assert_eq!(activity_trend(30, "abc"), activity_trend(30, "abc"));
        assert_eq!(vibe_trend(14, "abc"), vibe_trend(14, "abc"));
        assert_eq!(heatmap(90, "abc"), heatmap(90, "abc"));
        assert_eq!(intent_split(30, "abc"), intent_split(30, "abc"));
    }

    #[test]
    fn daily_series_cap_at_thirty_buckets() {
        assert_eq!(activity_trend(7, "abc").len(), 7);
        assert_eq!(activity_trend(14, "abc").len(), 14);
        assert_eq!(activity_trend(90, "abc").len(), 30);
        assert_eq!(vibe_trend(90, "abc").len(), 30);
        assert!(activity_trend(0, "abc").is_empty());
    }

    #[test]
    fn values_respect_documented_ranges() {
        for range in RANGES {
            for venue in VENUES {
                for point in activity_trend(range, venue) {
                    assert!(within(f64::from(point.checkins), ACTIVITY_RANGE));
                }
                for point in vibe_trend(range, venue) {
                    assert!(within(point.hot, HOT_RANGE));
                    assert!(within(point.good, GOOD_RANGE));
                    assert!(within(point.ok, OK_RANGE));
                    assert!(within(point.quiet, QUIET_RANGE));
                }
                for cell in heatmap(range, venue) {
                    assert!(within(cell.intensity, (0.0, 1.0)));
                }
                let kpi = kpis(range, venue);
                assert!(within(kpi.avg_vibe, AVG_VIBE_RANGE));
                assert!(within(f64::from(kpi.repeat_visitor_pct), REPEAT_RANGE));
                assert!(within(f64::from(kpi.change_pct), CHANGE_RANGE));
                assert!(within(impact_estimate(range, venue).revenue_lift_pct, LIFT_RANGE));
            }
        }
    }

    #[test]
    fn splits_sum_close_to_one_hundred() {
        let generators: [fn(u32, &str) -> Vec<SplitEntry>; 5] =
            [age_split, relationship_split, intent_split, vibe_split, ons_split];
        for range in RANGES {
            for venue in VENUES {
                for generate in generators {
                    let total: u32 = generate(range, venue).iter().map(|e| e.pct).sum();
                    assert!((98..=102).contains(&total), "{venue}/{range}: {total}");
                }
            }
        }
    }

    #[test]
    fn heatmap_covers_the_full_week() {
        let cells = heatmap(7, "abc");
        assert_eq!(cells.len(), 70);
        assert_eq!(cells[0].label, "Mon 6pm");
        assert_eq!(cells[69].label, "Sun 3am");
    }

    #[test]
    fn week_range_labels_every_bucket() {
        let points = activity_trend(7, "abc");
        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, WEEKDAYS);
    }

    #[test]
    fn longer_ranges_thin_labels() {
        let fortnight = activity_trend(14, "abc");
        assert_eq!(fortnight.iter().filter(|p| !p.label.is_empty()).count(), 7);

        let month = activity_trend(30, "abc");
        let labeled = month.iter().filter(|p| !p.label.is_empty()).count();
        assert!(labeled < 30);
        assert_eq!(labeled, 6);
        assert_eq!(month[5].label, "D6");
    }

    #[test]
    fn hour_labels_use_twelve_hour_clock() {
        assert_eq!(hour_label(0), "12am");
        assert_eq!(hour_label(9), "9am");
        assert_eq!(hour_label(12), "12pm");
        assert_eq!(hour_label(22), "10pm");
        assert_eq!(hour_label(24), "12am");
    }
}
