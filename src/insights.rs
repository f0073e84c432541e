//! One dashboard payload, two sources.
//!
//! Presentation code asks an [`InsightsSource`] for a [`VenueInsights`] and
//! never learns whether the numbers came from the seeded generators or from
//! real check-ins.

use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, Utc};

use crate::aggregate::{
    demographics, demographics_displayable, first_max_by_key, intent_displayable,
    intent_distribution, venue_stats, Share,
};
use crate::models::{
    ActivityPoint, CheckIn, HeatmapCell, ImpactEstimate, KpiSnapshot, PeakHour,
    RelationshipStatus, SplitEntry, VibeScore, VibeTrendPoint,
};
use crate::peak::{peak_hours, summarize_peak_times};
use crate::smoothing::percent;
use crate::synth::{self, bucket_label, daily_buckets, hour_label, HEATMAP_HOURS, WEEKDAYS};

#[derive(Debug, Clone, PartialEq)]
pub struct VenueInsights {
    pub venue_id: String,
    pub range_days: u32,
    pub kpis: KpiSnapshot,
    pub activity: Vec<ActivityPoint>,
    pub vibe_trend: Vec<VibeTrendPoint>,
    pub heatmap: Vec<HeatmapCell>,
    pub vibe_mix: Vec<SplitEntry>,
    /// `None` when there are too few check-ins to show the panel.
    pub intent_mix: Option<Vec<SplitEntry>>,
    pub dominant_intent: Option<SplitEntry>,
    pub age_mix: Option<Vec<SplitEntry>>,
    pub top_age_band: Option<String>,
    /// Only observed, never estimated.
    pub gender_mix: Option<Vec<SplitEntry>>,
    pub relationship_mix: Vec<SplitEntry>,
    pub single_ratio: Option<f64>,
    pub ons_ratio: Option<f64>,
    pub peak_summary: String,
    pub impact: Option<ImpactEstimate>,
}

pub trait InsightsSource {
    fn insights(&self, venue_id: &str, range_days: u32) -> VenueInsights;
}

/// Seeded placeholder data.
pub struct SyntheticInsights;

fn pct_of(entries: &[SplitEntry], label: &str) -> Option<f64> {
    entries
        .iter()
        .find(|entry| entry.label == label)
        .map(|entry| f64::from(entry.pct) / 100.0)
}

/// Heatmap cells as weekday/hour buckets (Sunday = 0) scored 0 to 10.
fn heatmap_peaks(cells: &[HeatmapCell]) -> Vec<PeakHour> {
    cells
        .iter()
        .map(|cell| PeakHour {
            dow: (cell.dow + 1) % 7,
            hour: cell.hour,
            count: (cell.intensity * 10.0).round() as usize,
        })
        .collect()
}

impl InsightsSource for SyntheticInsights {
    fn insights(&self, venue_id: &str, range_days: u32) -> VenueInsights {
        let heatmap = synth::heatmap(range_days, venue_id);
        let relationship_mix = synth::relationship_split(range_days, venue_id);
        let ons_mix = synth::ons_split(range_days, venue_id);
        let intent_mix = synth::intent_split(range_days, venue_id);
        let dominant_intent = first_max_by_key(&intent_mix, |entry| entry.pct).cloned();
        let age_mix = synth::age_split(range_days, venue_id);
        let top_age_band =
            first_max_by_key(&age_mix, |entry| entry.pct).map(|entry| entry.label.clone());

        VenueInsights {
            venue_id: venue_id.to_string(),
            range_days,
            kpis: synth::kpis(range_days, venue_id),
            activity: synth::activity_trend(range_days, venue_id),
            vibe_trend: synth::vibe_trend(range_days, venue_id),
            peak_summary: summarize_peak_times(&heatmap_peaks(&heatmap)),
            heatmap,
            vibe_mix: synth::vibe_split(range_days, venue_id),
            intent_mix: Some(intent_mix),
            dominant_intent,
            age_mix: Some(age_mix),
            top_age_band,
            gender_mix: None,
            single_ratio: pct_of(&relationship_mix, RelationshipStatus::Single.as_str()),
            ons_ratio: pct_of(&ons_mix, "yes"),
            relationship_mix,
            impact: Some(synth::impact_estimate(range_days, venue_id)),
        }
    }
}

/// Midnight UTC opening the range: today plus the `range_days - 1`
/// calendar days before it.
pub fn range_start(now: DateTime<Utc>, range_days: u32) -> DateTime<Utc> {
    now.date_naive()
        .checked_sub_days(Days::new(u64::from(range_days.saturating_sub(1))))
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Aggregates over an already-fetched snapshot of check-ins.
pub struct CheckInInsights {
    check_ins: Vec<CheckIn>,
    now: DateTime<Utc>,
}

impl CheckInInsights {
    pub fn new(check_ins: Vec<CheckIn>, now: DateTime<Utc>) -> Self {
        Self { check_ins, now }
    }

    fn in_range(&self, venue_id: &str, range_days: u32) -> Vec<CheckIn> {
        let cutoff = range_start(self.now, range_days);
        self.check_ins
            .iter()
            .filter(|c| c.venue_id == venue_id)
            .filter(|c| c.created_at >= cutoff && c.created_at <= self.now)
            .cloned()
            .collect()
    }

    /// Index of the daily bucket holding `at`, oldest bucket first.
    fn bucket_of(&self, at: DateTime<Utc>, buckets: u32) -> Option<usize> {
        let days_ago = (self.now.date_naive() - at.date_naive()).num_days();
        if days_ago < 0 || days_ago >= i64::from(buckets) {
            return None;
        }
        Some((i64::from(buckets) - 1 - days_ago) as usize)
    }

    fn label(&self, index: u32, buckets: u32, range_days: u32) -> String {
        if range_days <= 7 {
            let day = self.now - Duration::days(i64::from(buckets - 1 - index));
            let monday_first = day.weekday().num_days_from_monday() as usize;
            return WEEKDAYS[monday_first].to_string();
        }
        bucket_label(index, buckets, range_days)
    }

    fn daily<'a>(&self, check_ins: &[&'a CheckIn], range_days: u32) -> Vec<Vec<&'a CheckIn>> {
        let buckets = daily_buckets(range_days);
        let mut days: Vec<Vec<&CheckIn>> = vec![Vec::new(); buckets as usize];
        for check_in in check_ins {
            if let Some(index) = self.bucket_of(check_in.created_at, buckets) {
                days[index].push(*check_in);
            }
        }
        days
    }

    fn kpis(&self, check_ins: &[&CheckIn], range_days: u32) -> KpiSnapshot {
        let total = check_ins.len();
        let avg_vibe = if total == 0 {
            0.0
        } else {
            let sum: f64 = check_ins.iter().map(|c| vibe_points(c.vibe)).sum();
            (sum / total as f64 * 10.0).round() / 10.0
        };

        let half = Duration::days(i64::from(range_days)) / 2;
        let midpoint = self
            .now
            .checked_sub_signed(half)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let recent = check_ins.iter().filter(|c| c.created_at >= midpoint).count();
        let earlier = total - recent;
        let change_pct = if earlier == 0 {
            // activity from nothing counts as a full increase
            if recent > 0 {
                100
            } else {
                0
            }
        } else {
            ((recent as f64 - earlier as f64) / earlier as f64 * 100.0).round() as i32
        };

        KpiSnapshot {
            total_checkins: total as u32,
            avg_vibe,
            // check-ins are anonymous, so repeat visits can't be counted
            repeat_visitor_pct: 0,
            change_pct,
        }
    }
}

fn vibe_points(vibe: VibeScore) -> f64 {
    match vibe {
        VibeScore::Quiet => 1.0,
        VibeScore::Ok => 2.0,
        VibeScore::Good => 3.0,
        VibeScore::Hot => 4.0,
    }
}

fn to_split<T: std::fmt::Display>(shares: &[Share<T>]) -> Vec<SplitEntry> {
    shares
        .iter()
        .map(|share| SplitEntry {
            label: share.key.to_string(),
            pct: share.pct,
        })
        .collect()
}

fn vibe_split_of(check_ins: &[&CheckIn]) -> [u32; 4] {
    let total = check_ins.len();
    let count = |vibe: VibeScore| check_ins.iter().filter(|c| c.vibe == vibe).count();
    [
        percent(count(VibeScore::Hot), total),
        percent(count(VibeScore::Good), total),
        percent(count(VibeScore::Ok), total),
        percent(count(VibeScore::Quiet), total),
    ]
}

/// Evening grid scaled against the busiest observed bucket.
fn observed_heatmap(peaks: &[PeakHour]) -> Vec<HeatmapCell> {
    let busiest = peaks.iter().map(|p| p.count).max().unwrap_or(0);
    let mut cells = Vec::with_capacity(7 * HEATMAP_HOURS.len());
    for dow in 0..7u32 {
        let sunday_first = (dow + 1) % 7;
        for hour in HEATMAP_HOURS {
            let count = peaks
                .iter()
                .find(|p| p.dow == sunday_first && p.hour == hour)
                .map_or(0, |p| p.count);
            let intensity = if busiest == 0 {
                0.0
            } else {
                (count as f64 / busiest as f64 * 100.0).round() / 100.0
            };
            cells.push(HeatmapCell {
                dow,
                hour,
                label: format!("{} {}", WEEKDAYS[dow as usize], hour_label(hour)),
                intensity,
            });
        }
    }
    cells
}

impl InsightsSource for CheckInInsights {
    fn insights(&self, venue_id: &str, range_days: u32) -> VenueInsights {
        let owned = self.in_range(venue_id, range_days);
        let window: Vec<&CheckIn> = owned.iter().collect();
        let count = owned.len();
        let buckets = daily_buckets(range_days);
        let days = self.daily(&window, range_days);

        let activity = days
            .iter()
            .enumerate()
            .map(|(i, day)| ActivityPoint {
                label: self.label(i as u32, buckets, range_days),
                checkins: day.len() as u32,
            })
            .collect();
        let vibe_trend = days
            .iter()
            .enumerate()
            .map(|(i, day)| {
                let [hot, good, ok, quiet] = vibe_split_of(day);
                VibeTrendPoint {
                    label: self.label(i as u32, buckets, range_days),
                    hot: f64::from(hot),
                    good: f64::from(good),
                    ok: f64::from(ok),
                    quiet: f64::from(quiet),
                }
            })
            .collect();

        let [hot, good, ok, quiet] = vibe_split_of(&window);
        let vibe_mix = [
            (VibeScore::Hot, hot),
            (VibeScore::Good, good),
            (VibeScore::Ok, ok),
            (VibeScore::Quiet, quiet),
        ]
        .into_iter()
        .map(|(vibe, pct)| SplitEntry {
            label: vibe.to_string(),
            pct,
        })
        .collect();

        let demographic = demographics(&owned);
        let intents = intent_distribution(&owned);
        let stats = venue_stats(&owned);
        let peaks = peak_hours(&owned);
        let show_intents = intent_displayable(intents.total);
        let show_demographics = demographics_displayable(count, &demographic);

        let relationship_total = owned
            .iter()
            .filter(|c| c.relationship_status.is_some())
            .count();
        let relationship_mix = RelationshipStatus::ALL
            .iter()
            .map(|status| SplitEntry {
                label: status.to_string(),
                pct: percent(
                    owned
                        .iter()
                        .filter(|c| c.relationship_status == Some(*status))
                        .count(),
                    relationship_total,
                ),
            })
            .collect();

        log::debug!(
            "aggregated {count} check-ins for {venue_id} over {range_days} days"
        );

        VenueInsights {
            venue_id: venue_id.to_string(),
            range_days,
            kpis: self.kpis(&window, range_days),
            activity,
            vibe_trend,
            heatmap: observed_heatmap(&peaks),
            vibe_mix,
            intent_mix: show_intents.then(|| to_split(&intents.shares)),
            dominant_intent: intents
                .dominant
                .filter(|_| show_intents)
                .map(|intent| SplitEntry {
                    label: intent.to_string(),
                    pct: intents.dominant_pct,
                }),
            age_mix: show_demographics.then(|| to_split(&demographic.age_bands)),
            top_age_band: demographic
                .most_common_age_band
                .filter(|_| show_demographics)
                .map(|band| band.to_string()),
            gender_mix: show_demographics.then(|| to_split(&demographic.gender)),
            relationship_mix,
            single_ratio: stats.single_ratio,
            ons_ratio: stats.ons_ratio,
            peak_summary: summarize_peak_times(&peaks),
            impact: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::sample_check_in;
    use crate::models::{AgeBand, Gender, Intent};
    use crate::peak::INSUFFICIENT_HISTORY;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // a Saturday
        Utc.with_ymd_and_hms(2026, 3, 7, 23, 30, 0).unwrap()
    }

    fn check_in_at(at: DateTime<Utc>, vibe: VibeScore) -> CheckIn {
        CheckIn {
            created_at: at,
            gender: Some(Gender::Female),
            age_band: Some(AgeBand::From25To29),
            ..sample_check_in(vibe, Intent::Dancing)
        }
    }

    #[test]
    fn synthetic_source_is_stable_and_complete() {
        let first = SyntheticInsights.insights("abc", 30);
        assert_eq!(first, SyntheticInsights.insights("abc", 30));
        assert_eq!(first.kpis.total_checkins, 1046);
        assert_eq!(first.activity.len(), 30);
        assert_eq!(first.heatmap.len(), 70);
        assert!(first.intent_mix.is_some());
        assert!(first.dominant_intent.is_some());
        assert_eq!(first.gender_mix, None);
        assert!(first.impact.is_some());
        assert!(first.single_ratio.is_some());
        assert_ne!(first.peak_summary, INSUFFICIENT_HISTORY);
    }

    #[test]
    fn empty_snapshot_yields_zeroed_insights() {
        let source = CheckInInsights::new(Vec::new(), now());
        let insights = source.insights("abc", 7);

        assert_eq!(insights.kpis.total_checkins, 0);
        assert_eq!(insights.activity.len(), 7);
        assert!(insights.activity.iter().all(|p| p.checkins == 0));
        assert_eq!(insights.intent_mix, None);
        assert_eq!(insights.age_mix, None);
        assert_eq!(insights.single_ratio, None);
        assert_eq!(insights.peak_summary, INSUFFICIENT_HISTORY);
        assert!(insights.heatmap.iter().all(|c| c.intensity == 0.0));
    }

    #[test]
    fn real_source_buckets_by_day() {
        let check_ins = vec![
            check_in_at(now() - Duration::minutes(10), VibeScore::Hot),
            check_in_at(now() - Duration::minutes(25), VibeScore::Hot),
            check_in_at(now() - Duration::days(1), VibeScore::Quiet),
            check_in_at(now() - Duration::days(20), VibeScore::Good),
        ];
        let insights = CheckInInsights::new(check_ins, now()).insights("abc", 7);

        assert_eq!(insights.kpis.total_checkins, 3);
        assert_eq!(insights.activity[6].checkins, 2);
        assert_eq!(insights.activity[6].label, "Sat");
        assert_eq!(insights.activity[5].checkins, 1);
        assert_eq!(insights.vibe_mix[0].pct, 67);
        assert!(insights.age_mix.is_some());
        assert!(insights.intent_mix.is_some());
        assert_eq!(
            insights.dominant_intent,
            Some(SplitEntry {
                label: "dancing".to_string(),
                pct: 100
            })
        );
        assert_eq!(insights.top_age_band.as_deref(), Some("25-29"));
        assert_eq!(insights.gender_mix.as_ref().map(|g| g[1].pct), Some(100));
        assert!(insights.peak_summary.contains("weekends"));
    }

    #[test]
    fn activity_totals_match_check_in_count() {
        let check_ins: Vec<CheckIn> = (0..24 * 31)
            .map(|hours| check_in_at(now() - Duration::hours(hours), VibeScore::Good))
            .collect();
        let source = CheckInInsights::new(check_ins, now());

        for range in 1..=30 {
            let insights = source.insights("abc", range);
            let charted: u32 = insights.activity.iter().map(|p| p.checkins).sum();
            assert_eq!(charted, insights.kpis.total_checkins, "range {range}");
        }
    }

    #[test]
    fn first_partial_day_is_charted() {
        let early = check_in_at(
            now() - Duration::days(6) - Duration::hours(23),
            VibeScore::Ok,
        );
        let insights = CheckInInsights::new(vec![early], now()).insights("abc", 7);

        assert_eq!(insights.kpis.total_checkins, 1);
        assert_eq!(insights.activity[0].checkins, 1);
    }

    #[test]
    fn check_ins_before_the_oldest_day_are_excluded() {
        let stale = check_in_at(now() - Duration::days(7) + Duration::minutes(10), VibeScore::Ok);
        let insights = CheckInInsights::new(vec![stale], now()).insights("abc", 7);

        assert_eq!(insights.kpis.total_checkins, 0);
        assert!(insights.activity.iter().all(|p| p.checkins == 0));
    }

    #[test]
    fn range_start_saturates_on_huge_ranges() {
        assert_eq!(
            range_start(now(), 7),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(range_start(now(), u32::MAX), DateTime::<Utc>::MIN_UTC);

        let insights = CheckInInsights::new(Vec::new(), now()).insights("abc", u32::MAX);
        assert_eq!(insights.activity.len(), 30);
        assert_eq!(insights.kpis.total_checkins, 0);
    }

    #[test]
    fn activity_from_nothing_is_a_full_increase() {
        let fresh = check_in_at(now() - Duration::hours(2), VibeScore::Hot);
        let insights = CheckInInsights::new(vec![fresh.clone()], now()).insights("abc", 14);
        assert_eq!(insights.kpis.change_pct, 100);

        let older = check_in_at(now() - Duration::days(10), VibeScore::Hot);
        let insights = CheckInInsights::new(vec![older, fresh], now()).insights("abc", 14);
        assert_eq!(insights.kpis.change_pct, 0);
    }

    #[test]
    fn synthetic_ties_go_to_the_earlier_category() {
        let insights = SyntheticInsights.insights("venue-159", 14);
        let ages = insights.age_mix.as_ref().unwrap();
        let best = ages.iter().map(|entry| entry.pct).max().unwrap();
        let first_best = ages.iter().find(|entry| entry.pct == best).unwrap();
        assert_eq!(insights.top_age_band.as_deref(), Some(first_best.label.as_str()));
        assert_eq!(insights.top_age_band.as_deref(), Some("21-24"));

        let intents = insights.intent_mix.as_ref().unwrap();
        let best = intents.iter().map(|entry| entry.pct).max().unwrap();
        let first_best = intents.iter().find(|entry| entry.pct == best).cloned();
        assert_eq!(insights.dominant_intent, first_best);
    }

    #[test]
    fn other_venues_are_ignored() {
        let mut elsewhere = check_in_at(now() - Duration::minutes(5), VibeScore::Hot);
        elsewhere.venue_id = "other".to_string();
        let insights = CheckInInsights::new(vec![elsewhere], now()).insights("abc", 14);
        assert_eq!(insights.kpis.total_checkins, 0);
    }
}
