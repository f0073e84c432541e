use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{CheckIn, Intent, PeakHour, Venue, VibeScore};
use crate::store::CheckInStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let venues = vec![
        Venue {
            id: "velvet-room-austin".to_string(),
            name: "The Velvet Room".to_string(),
            address: "412 E 6th St".to_string(),
            latitude: 30.2672,
            longitude: -97.7404,
            category: "club".to_string(),
            city: "Austin".to_string(),
        },
        Venue {
            id: "lantern-bar-austin".to_string(),
            name: "Lantern Bar".to_string(),
            address: "1100 S Congress Ave".to_string(),
            latitude: 30.2531,
            longitude: -97.7489,
            category: "bar".to_string(),
            city: "Austin".to_string(),
        },
        Venue {
            id: "neon-palms-miami".to_string(),
            name: "Neon Palms".to_string(),
            address: "1439 Washington Ave".to_string(),
            latitude: 25.7877,
            longitude: -80.1318,
            category: "club".to_string(),
            city: "Miami".to_string(),
        },
    ];

    for venue in &venues {
        upsert_venue(pool, venue).await?;
    }

    let now = Utc::now();
    let check_ins = vec![
        ("seed-001", "velvet-room-austin", VibeScore::Hot, Intent::Dancing, Duration::minutes(20)),
        ("seed-002", "velvet-room-austin", VibeScore::Good, Intent::MeetingPeople, Duration::minutes(45)),
        ("seed-003", "velvet-room-austin", VibeScore::Hot, Intent::Celebrating, Duration::days(7)),
        ("seed-004", "lantern-bar-austin", VibeScore::Ok, Intent::Drinks, Duration::minutes(90)),
        ("seed-005", "lantern-bar-austin", VibeScore::Quiet, Intent::DateNight, Duration::days(2)),
        ("seed-006", "neon-palms-miami", VibeScore::Good, Intent::Dancing, Duration::hours(1)),
    ];

    for (source_key, venue_id, vibe, intent, age) in check_ins {
        let check_in = CheckIn {
            id: Uuid::new_v4(),
            venue_id: venue_id.to_string(),
            created_at: now - age,
            vibe,
            intent,
            relationship_status: None,
            ons_intent: None,
            gender: None,
            age_band: None,
        };
        insert_check_in(pool, &check_in, source_key).await?;
    }

    log::info!("seeded {} venues", venues.len());
    Ok(())
}

async fn upsert_venue(pool: &PgPool, venue: &Venue) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vibecheck.venues (id, name, address, latitude, longitude, category, city)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, address = EXCLUDED.address, category = EXCLUDED.category
        "#,
    )
    .bind(&venue.id)
    .bind(&venue.name)
    .bind(&venue.address)
    .bind(venue.latitude)
    .bind(venue.longitude)
    .bind(&venue.category)
    .bind(&venue.city)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns whether a row was written; duplicate source keys are skipped.
async fn insert_check_in(
    pool: &PgPool,
    check_in: &CheckIn,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO vibecheck.check_ins
        (id, venue_id, created_at, vibe, intent, relationship_status, ons_intent,
         gender, age_band, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(check_in.id)
    .bind(&check_in.venue_id)
    .bind(check_in.created_at)
    .bind(check_in.vibe.as_str())
    .bind(check_in.intent.as_str())
    .bind(check_in.relationship_status.map(|v| v.as_str()))
    .bind(check_in.ons_intent)
    .bind(check_in.gender.map(|v| v.as_str()))
    .bind(check_in.age_band.map(|v| v.as_str()))
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn parse_optional<T>(row: &PgRow, column: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    row.get::<Option<String>, _>(column)
        .map(|value| value.parse())
        .transpose()
}

fn check_in_from_row(row: &PgRow) -> anyhow::Result<CheckIn> {
    Ok(CheckIn {
        id: row.get("id"),
        venue_id: row.get("venue_id"),
        created_at: row.get("created_at"),
        vibe: row.get::<String, _>("vibe").parse()?,
        intent: row.get::<String, _>("intent").parse()?,
        relationship_status: parse_optional(row, "relationship_status")?,
        ons_intent: row.get("ons_intent"),
        gender: parse_optional(row, "gender")?,
        age_band: parse_optional(row, "age_band")?,
    })
}

fn venue_from_row(row: &PgRow) -> Venue {
    Venue {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        category: row.get("category"),
        city: row.get("city"),
    }
}

pub async fn venues_for_city(pool: &PgPool, city: &str) -> anyhow::Result<Vec<Venue>> {
    let rows = sqlx::query(
        "SELECT id, name, address, latitude, longitude, category, city \
         FROM vibecheck.venues \
         WHERE lower(city) = lower($1) \
         ORDER BY name",
    )
    .bind(city)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(venue_from_row).collect())
}

pub async fn fetch_venue(pool: &PgPool, venue_id: &str) -> anyhow::Result<Option<Venue>> {
    let row = sqlx::query(
        "SELECT id, name, address, latitude, longitude, category, city \
         FROM vibecheck.venues WHERE id = $1",
    )
    .bind(venue_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(venue_from_row))
}

/// Weekday/hour counts from the precomputed activity view.
pub async fn hourly_activity(pool: &PgPool, venue_id: &str) -> anyhow::Result<Vec<PeakHour>> {
    let rows = sqlx::query(
        "SELECT dow, hour, checkin_count \
         FROM vibecheck.venue_hourly_activity \
         WHERE venue_id = $1 \
         ORDER BY dow, hour",
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| PeakHour {
            dow: row.get::<i32, _>("dow") as u32,
            hour: row.get::<i32, _>("hour") as u32,
            count: row.get::<i64, _>("checkin_count") as usize,
        })
        .collect())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        venue_id: String,
        created_at: DateTime<Utc>,
        vibe: VibeScore,
        intent: Intent,
        relationship_status: Option<crate::models::RelationshipStatus>,
        ons_intent: Option<bool>,
        gender: Option<crate::models::Gender>,
        age_band: Option<crate::models::AgeBand>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid check-in on row {}", line + 1))?;
        let check_in = CheckIn {
            id: Uuid::new_v4(),
            venue_id: row.venue_id,
            created_at: row.created_at,
            vibe: row.vibe,
            intent: row.intent,
            relationship_status: row.relationship_status,
            ons_intent: row.ons_intent,
            gender: row.gender,
            age_band: row.age_band,
        };
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", check_in.id));

        if insert_check_in(pool, &check_in, &source_key).await? {
            inserted += 1;
        } else {
            log::debug!("skipping duplicate check-in {source_key}");
        }
    }

    Ok(inserted)
}

pub struct PgCheckInStore {
    pool: PgPool,
}

impl PgCheckInStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckInStore for PgCheckInStore {
    async fn append(&self, check_in: CheckIn) -> anyhow::Result<()> {
        let source_key = format!("app-{}", check_in.id);
        insert_check_in(&self.pool, &check_in, &source_key).await?;
        Ok(())
    }

    async fn since(&self, venue_id: &str, since: DateTime<Utc>) -> anyhow::Result<Vec<CheckIn>> {
        let rows = sqlx::query(
            "SELECT id, venue_id, created_at, vibe, intent, relationship_status, \
             ons_intent, gender, age_band \
             FROM vibecheck.check_ins \
             WHERE venue_id = $1 AND created_at >= $2 \
             ORDER BY created_at DESC",
        )
        .bind(venue_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(check_in_from_row).collect()
    }
}
