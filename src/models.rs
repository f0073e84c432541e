use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a closed set of values stored as text in Postgres and CSV.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => anyhow::bail!(
                        "unknown {} value: {other}",
                        stringify!($name)
                    ),
                }
            }
        }
    };
}

text_enum!(
    /// Perceived energy at check-in time, ordered from calmest to busiest.
    VibeScore {
        Quiet => "quiet",
        Ok => "ok",
        Good => "good",
        Hot => "hot",
    }
);

text_enum!(Intent {
    Drinks => "drinks",
    Dancing => "dancing",
    MeetingPeople => "meeting_people",
    DateNight => "date_night",
    Celebrating => "celebrating",
});

text_enum!(RelationshipStatus {
    Single => "single",
    Taken => "taken",
    Complicated => "complicated",
});

text_enum!(Gender {
    Male => "male",
    Female => "female",
    NonBinary => "non_binary",
});

text_enum!(
    /// Fixed age band list; declaration order breaks ties.
    AgeBand {
        From18To20 => "18-20",
        From21To24 => "21-24",
        From25To29 => "25-29",
        From30To34 => "30-34",
        Over35 => "35+",
    }
);

#[derive(Debug, Clone)]
pub struct CheckIn {
    pub id: Uuid,
    pub venue_id: String,
    pub created_at: DateTime<Utc>,
    pub vibe: VibeScore,
    pub intent: Intent,
    pub relationship_status: Option<RelationshipStatus>,
    pub ons_intent: Option<bool>,
    pub gender: Option<Gender>,
    pub age_band: Option<AgeBand>,
}

#[derive(Debug, Clone)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    pub city: String,
}

/// Check-in count for one weekday/hour bucket. `dow` is 0 for Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakHour {
    pub dow: u32,
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPoint {
    pub label: String,
    pub checkins: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VibeTrendPoint {
    pub label: String,
    pub hot: f64,
    pub good: f64,
    pub ok: f64,
    pub quiet: f64,
}

/// One cell of the weekly heatmap. `dow` counts from Monday.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapCell {
    pub dow: u32,
    pub hour: u32,
    pub label: String,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitEntry {
    pub label: String,
    pub pct: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiSnapshot {
    pub total_checkins: u32,
    pub avg_vibe: f64,
    pub repeat_visitor_pct: u32,
    pub change_pct: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImpactEstimate {
    pub extra_visitors: u32,
    pub revenue_lift_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_values_round_trip_through_from_str() {
        for band in AgeBand::ALL {
            assert_eq!(band.as_str().parse::<AgeBand>().unwrap(), *band);
        }
        assert_eq!("meeting_people".parse::<Intent>().unwrap(), Intent::MeetingPeople);
    }

    #[test]
    fn rejects_unknown_text() {
        assert!("lukewarm".parse::<VibeScore>().is_err());
    }

    #[test]
    fn vibe_scores_are_ordered_by_energy() {
        assert!(VibeScore::Hot > VibeScore::Good);
        assert!(VibeScore::Ok > VibeScore::Quiet);
    }
}
