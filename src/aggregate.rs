use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{AgeBand, CheckIn, Gender, Intent, RelationshipStatus, VibeScore};
use crate::smoothing::percent;

const MIN_DEMOGRAPHIC_CHECKINS: usize = 3;
const MIN_DEMOGRAPHIC_RESPONSES: usize = 2;
const MIN_INTENT_CHECKINS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share<T> {
    pub key: T,
    pub count: usize,
    pub pct: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demographics {
    pub gender: Vec<Share<Gender>>,
    pub age_bands: Vec<Share<AgeBand>>,
    pub total_gender_responses: usize,
    pub total_age_responses: usize,
    pub most_common_age_band: Option<AgeBand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentDistribution {
    pub shares: Vec<Share<Intent>>,
    pub dominant: Option<Intent>,
    pub dominant_pct: u32,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VenueStats {
    pub single_ratio: Option<f64>,
    pub ons_ratio: Option<f64>,
}

/// Counts every key in `keys` order, including those never observed.
fn shares<T, I>(keys: &[T], observed: I, total: usize) -> Vec<Share<T>>
where
    T: Copy + Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    for key in observed {
        *counts.entry(key).or_insert(0) += 1;
    }

    keys.iter()
        .map(|key| {
            let count = counts.get(key).copied().unwrap_or(0);
            Share {
                key: *key,
                count,
                pct: percent(count, total),
            }
        })
        .collect()
}

/// Largest item by `key`; the earliest item keeps a tie.
pub fn first_max_by_key<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> Option<&T> {
    items.iter().fold(None, |best: Option<&T>, item| match best {
        Some(current) if key(current) >= key(item) => Some(current),
        _ => Some(item),
    })
}

/// Highest observed count wins; the earlier key keeps a tie.
fn leader<T: Copy>(shares: &[Share<T>]) -> Option<&Share<T>> {
    first_max_by_key(shares, |share| share.count).filter(|share| share.count > 0)
}

/// Percentages are of responses to each question, not of all check-ins.
pub fn demographics(check_ins: &[CheckIn]) -> Demographics {
    let genders: Vec<Gender> = check_ins.iter().filter_map(|c| c.gender).collect();
    let ages: Vec<AgeBand> = check_ins.iter().filter_map(|c| c.age_band).collect();
    let total_gender_responses = genders.len();
    let total_age_responses = ages.len();

    let gender = shares(Gender::ALL, genders, total_gender_responses);
    let age_bands = shares(AgeBand::ALL, ages, total_age_responses);
    let most_common_age_band = leader(&age_bands).map(|share| share.key);

    Demographics {
        gender,
        age_bands,
        total_gender_responses,
        total_age_responses,
        most_common_age_band,
    }
}

/// Percentages are of all check-ins.
pub fn intent_distribution(check_ins: &[CheckIn]) -> IntentDistribution {
    let total = check_ins.len();
    let shares = shares(Intent::ALL, check_ins.iter().map(|c| c.intent), total);
    let (dominant, dominant_pct) = match leader(&shares) {
        Some(share) => (Some(share.key), share.pct),
        None => (None, 0),
    };

    IntentDistribution {
        shares,
        dominant,
        dominant_pct,
        total,
    }
}

/// Ratios over all check-ins, `None` when nobody answered the question.
pub fn venue_stats(check_ins: &[CheckIn]) -> VenueStats {
    let total = check_ins.len() as f64;
    let ratio = |responses: usize, hits: usize| {
        if responses == 0 {
            None
        } else {
            Some(hits as f64 / total)
        }
    };

    let relationship_responses = check_ins
        .iter()
        .filter(|c| c.relationship_status.is_some())
        .count();
    let singles = check_ins
        .iter()
        .filter(|c| c.relationship_status == Some(RelationshipStatus::Single))
        .count();
    let ons_responses = check_ins.iter().filter(|c| c.ons_intent.is_some()).count();
    let ons_yes = check_ins
        .iter()
        .filter(|c| c.ons_intent == Some(true))
        .count();

    VenueStats {
        single_ratio: ratio(relationship_responses, singles),
        ons_ratio: ratio(ons_responses, ons_yes),
    }
}

pub fn demographics_displayable(check_in_count: usize, demographics: &Demographics) -> bool {
    check_in_count >= MIN_DEMOGRAPHIC_CHECKINS
        && (demographics.total_gender_responses >= MIN_DEMOGRAPHIC_RESPONSES
            || demographics.total_age_responses >= MIN_DEMOGRAPHIC_RESPONSES)
}

pub fn intent_displayable(check_in_count: usize) -> bool {
    check_in_count >= MIN_INTENT_CHECKINS
}

/// Most reported vibe; ties go to the hotter vibe.
pub fn live_vibe(check_ins: &[CheckIn]) -> Option<VibeScore> {
    let mut counts: HashMap<VibeScore, usize> = HashMap::new();
    for check_in in check_ins {
        *counts.entry(check_in.vibe).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(vibe, count)| (*count, *vibe))
        .map(|(vibe, _)| vibe)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    pub(crate) fn sample_check_in(vibe: VibeScore, intent: Intent) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            venue_id: "abc".to_string(),
            created_at: Utc::now() - Duration::minutes(30),
            vibe,
            intent,
            relationship_status: None,
            ons_intent: None,
            gender: None,
            age_band: None,
        }
    }

    fn with_demographics(gender: Option<Gender>, age_band: Option<AgeBand>) -> CheckIn {
        CheckIn {
            gender,
            age_band,
            ..sample_check_in(VibeScore::Good, Intent::Drinks)
        }
    }

    #[test]
    fn empty_input_has_no_data() {
        let stats = demographics(&[]);
        assert_eq!(stats.total_gender_responses, 0);
        assert_eq!(stats.total_age_responses, 0);
        assert_eq!(stats.most_common_age_band, None);
        assert!(stats.age_bands.iter().all(|share| share.pct == 0));

        let ratios = venue_stats(&[]);
        assert_eq!(ratios.single_ratio, None);
        assert_eq!(ratios.ons_ratio, None);

        let intents = intent_distribution(&[]);
        assert_eq!(intents.dominant, None);
        assert_eq!(intents.total, 0);
    }

    #[test]
    fn demographic_percentages_use_responses() {
        let check_ins = vec![
            with_demographics(Some(Gender::Female), Some(AgeBand::From21To24)),
            with_demographics(Some(Gender::Male), Some(AgeBand::From25To29)),
            with_demographics(Some(Gender::Female), None),
            with_demographics(None, Some(AgeBand::From21To24)),
        ];
        let stats = demographics(&check_ins);

        assert_eq!(stats.total_gender_responses, 3);
        assert_eq!(stats.total_age_responses, 3);
        assert_eq!(stats.gender[1].key, Gender::Female);
        assert_eq!(stats.gender[1].pct, 67);
        assert_eq!(stats.gender[0].pct, 33);
        assert_eq!(stats.most_common_age_band, Some(AgeBand::From21To24));
    }

    #[test]
    fn age_ties_follow_band_order() {
        let check_ins = vec![
            with_demographics(None, Some(AgeBand::From30To34)),
            with_demographics(None, Some(AgeBand::From18To20)),
        ];
        assert_eq!(
            demographics(&check_ins).most_common_age_band,
            Some(AgeBand::From18To20)
        );
    }

    #[test]
    fn gating_is_separate_from_computation() {
        let check_ins = vec![
            with_demographics(Some(Gender::Female), None),
            with_demographics(Some(Gender::Male), None),
        ];
        let stats = demographics(&check_ins);

        assert_eq!(stats.gender[0].pct, 50);
        assert!(!demographics_displayable(check_ins.len(), &stats));
        assert!(demographics_displayable(3, &stats));
        assert!(!intent_displayable(1));
        assert!(intent_displayable(2));
    }

    #[test]
    fn intent_percentages_cover_all_check_ins() {
        let check_ins = vec![
            sample_check_in(VibeScore::Hot, Intent::Dancing),
            sample_check_in(VibeScore::Hot, Intent::Dancing),
            sample_check_in(VibeScore::Ok, Intent::Drinks),
            sample_check_in(VibeScore::Ok, Intent::DateNight),
        ];
        let intents = intent_distribution(&check_ins);

        assert_eq!(intents.total, 4);
        assert_eq!(intents.dominant, Some(Intent::Dancing));
        assert_eq!(intents.dominant_pct, 50);
        assert_eq!(intents.shares.len(), Intent::ALL.len());
    }

    #[test]
    fn ratios_divide_by_all_check_ins() {
        let mut check_ins = vec![
            sample_check_in(VibeScore::Good, Intent::Drinks),
            sample_check_in(VibeScore::Good, Intent::Drinks),
            sample_check_in(VibeScore::Good, Intent::Drinks),
            sample_check_in(VibeScore::Good, Intent::Drinks),
        ];
        check_ins[0].relationship_status = Some(RelationshipStatus::Single);
        check_ins[1].relationship_status = Some(RelationshipStatus::Taken);

        let stats = venue_stats(&check_ins);
        assert_eq!(stats.single_ratio, Some(0.25));
        assert_eq!(stats.ons_ratio, None);

        check_ins[2].ons_intent = Some(false);
        assert_eq!(venue_stats(&check_ins).ons_ratio, Some(0.0));
    }

    #[test]
    fn first_max_keeps_the_earliest_tie() {
        let values = [3, 7, 7, 1];
        let best = first_max_by_key(&values, |v| *v);
        assert!(std::ptr::eq(best.unwrap(), &values[1]));
        assert_eq!(first_max_by_key(&[] as &[u32], |v| *v), None);
    }

    #[test]
    fn live_vibe_prefers_hotter_on_tie() {
        assert_eq!(live_vibe(&[]), None);
        let check_ins = vec![
            sample_check_in(VibeScore::Quiet, Intent::Drinks),
            sample_check_in(VibeScore::Hot, Intent::Drinks),
        ];
        assert_eq!(live_vibe(&check_ins), Some(VibeScore::Hot));
    }
}
