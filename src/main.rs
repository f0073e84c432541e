use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod access;
mod aggregate;
mod db;
mod insights;
mod models;
mod peak;
mod prefs;
mod report;
mod seed;
mod smoothing;
mod store;
mod synth;

use insights::{CheckInInsights, InsightsSource, SyntheticInsights, VenueInsights};
use models::{AgeBand, CheckIn, Gender, Intent, RelationshipStatus, VibeScore};
use store::CheckInStore;

const LIVE_WINDOW_HOURS: i64 = 3;

#[derive(Parser)]
#[command(name = "vibecheck")]
#[command(about = "Venue vibe check-ins and partner insights for VibeCheck", long_about = None)]
struct Cli {
    /// Postgres connection string; check-ins and real insights need it
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// PIN partners must enter to view insights
    #[arg(long, env = "VIBECHECK_INSIGHTS_PIN", global = true, hide_env_values = true)]
    insights_pin: Option<String>,

    /// Local preferences file
    #[arg(long, env = "VIBECHECK_PREFS", global = true, default_value = prefs::DEFAULT_PREFS_FILE)]
    prefs: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample venues and check-ins
    Seed,
    /// Import check-ins from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record an anonymous check-in
    CheckIn {
        #[arg(long)]
        venue: String,
        #[arg(long)]
        vibe: VibeScore,
        #[arg(long)]
        intent: Intent,
        #[arg(long)]
        relationship: Option<RelationshipStatus>,
        #[arg(long)]
        ons: Option<bool>,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long)]
        age: Option<AgeBand>,
    },
    /// List venues in a city
    Venues {
        #[arg(long)]
        city: Option<String>,
    },
    /// Current vibe at each venue in a city
    Live {
        #[arg(long)]
        city: Option<String>,
    },
    /// Finish onboarding and remember a favorite city
    Onboard {
        #[arg(long)]
        city: String,
    },
    /// Check and remember the insights PIN
    Login {
        #[arg(long)]
        pin: String,
    },
    /// Show the partner dashboard for a venue
    Insights {
        #[arg(long)]
        venue: String,
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=365))]
        range_days: u32,
        #[arg(long)]
        pin: Option<String>,
        /// Use seeded placeholder data instead of real check-ins
        #[arg(long)]
        synthetic: bool,
    },
    /// Generate a markdown insights report
    Report {
        #[arg(long)]
        venue: String,
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=365))]
        range_days: u32,
        #[arg(long)]
        pin: Option<String>,
        #[arg(long)]
        synthetic: bool,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

struct App {
    pool: Option<PgPool>,
    store: Option<Box<dyn CheckInStore>>,
    prefs: prefs::PrefsFile,
    insights_pin: Option<String>,
}

impl App {
    fn pool(&self) -> anyhow::Result<&PgPool> {
        self.pool
            .as_ref()
            .context("DATABASE_URL must be set for this command")
    }

    fn store(&self) -> anyhow::Result<&dyn CheckInStore> {
        self.store
            .as_deref()
            .context("DATABASE_URL must be set for this command")
    }

    fn city(&self, city: Option<String>) -> anyhow::Result<String> {
        city.or_else(|| self.prefs.load().favorite_city)
            .context("pass --city or run `onboard --city <city>` first")
    }

    /// Verifies the supplied or cached PIN and caches it on success.
    fn authorize(&self, pin: Option<String>) -> anyhow::Result<()> {
        let cached = self.prefs.load().insights_pin;
        let from_cache = pin.is_none();
        let supplied = pin.or(cached);

        match access::verify_pin(self.insights_pin.as_deref(), supplied.as_deref()) {
            Ok(()) => {
                if !from_cache {
                    self.prefs.update(|p| p.insights_pin = supplied)?;
                }
                Ok(())
            }
            Err(err) => {
                if from_cache && matches!(err, access::AccessError::Unauthorized(_)) {
                    log::warn!("cached insights PIN was rejected; clearing it");
                    self.prefs.update(|p| p.insights_pin = None)?;
                }
                Err(err.into())
            }
        }
    }

    async fn venue_insights(
        &self,
        venue: &str,
        range_days: u32,
        synthetic: bool,
    ) -> anyhow::Result<(VenueInsights, Vec<CheckIn>)> {
        if synthetic {
            return Ok((SyntheticInsights.insights(venue, range_days), Vec::new()));
        }

        let now = Utc::now();
        let since = insights::range_start(now, range_days);
        let check_ins = self.store()?.since(venue, since).await?;
        let mut insights = CheckInInsights::new(check_ins.clone(), now).insights(venue, range_days);

        if let Some(pool) = &self.pool {
            let history = db::hourly_activity(pool, venue).await?;
            insights.peak_summary = peak::summarize_peak_times(&history);
        }
        Ok((insights, check_ins))
    }
}

fn print_insights(insights: &VenueInsights, synthetic: bool) {
    let kpis = &insights.kpis;
    println!(
        "{} over the last {} days{}",
        insights.venue_id,
        insights.range_days,
        if synthetic { " (estimated)" } else { "" }
    );
    println!(
        "Check-ins {} | avg vibe {:.1} | change {:+}%",
        kpis.total_checkins, kpis.avg_vibe, kpis.change_pct
    );
    println!("Peak times: {}", insights.peak_summary);

    let mix: Vec<String> = insights
        .vibe_mix
        .iter()
        .map(|entry| format!("{} {}%", entry.label, entry.pct))
        .collect();
    println!("Vibe mix: {}", mix.join(", "));

    match &insights.dominant_intent {
        Some(top) => println!("Top reason to visit: {} ({}%)", top.label, top.pct),
        None => println!("Top reason to visit: not enough check-ins yet"),
    }

    if let Some(band) = &insights.top_age_band {
        println!("Most common age band: {band}");
    }

    let hottest = insights
        .heatmap
        .iter()
        .filter(|cell| cell.intensity > 0.0)
        .max_by(|a, b| a.intensity.total_cmp(&b.intensity));
    if let Some(cell) = hottest {
        println!("Hottest slot: {} ({:.0}%)", cell.label, cell.intensity * 100.0);
    }

    for point in insights.activity.iter().filter(|p| !p.label.is_empty()) {
        println!("  {:>4} {}", point.label, "#".repeat(point.checkins.min(60) as usize));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let pool = match &cli.database_url {
        Some(url) => Some(
            PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("failed to connect to Postgres")?,
        ),
        None => None,
    };

    let store = pool
        .clone()
        .map(|pool| Box::new(db::PgCheckInStore::new(pool)) as Box<dyn CheckInStore>);
    if store.is_none() {
        log::debug!("DATABASE_URL not set; only synthetic and local commands are available");
    }

    let app = App {
        pool,
        store,
        prefs: prefs::PrefsFile::new(cli.prefs),
        insights_pin: cli.insights_pin,
    };

    match cli.command {
        Commands::InitDb => {
            db::init_db(app.pool()?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(app.pool()?).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(app.pool()?, &csv).await?;
            println!("Inserted {inserted} check-ins from {}.", csv.display());
        }
        Commands::CheckIn {
            venue,
            vibe,
            intent,
            relationship,
            ons,
            gender,
            age,
        } => {
            let check_in = CheckIn {
                id: Uuid::new_v4(),
                venue_id: venue,
                created_at: Utc::now(),
                vibe,
                intent,
                relationship_status: relationship,
                ons_intent: ons,
                gender,
                age_band: age,
            };
            log::info!("recording check-in {} at {}", check_in.id, check_in.venue_id);
            let venue_id = check_in.venue_id.clone();
            app.store()?.append(check_in).await?;
            println!("Checked in at {venue_id}: {vibe}.");
        }
        Commands::Venues { city } => {
            let city = app.city(city)?;
            let venues = db::venues_for_city(app.pool()?, &city).await?;
            if venues.is_empty() {
                println!("No venues found in {city}.");
                return Ok(());
            }
            println!("Venues in {city}:");
            for venue in venues {
                println!(
                    "- {} [{}] {} ({}, {:.4}, {:.4})",
                    venue.name, venue.id, venue.category, venue.address, venue.latitude, venue.longitude
                );
            }
        }
        Commands::Live { city } => {
            let city = app.city(city)?;
            let venues = db::venues_for_city(app.pool()?, &city).await?;
            let since = Utc::now() - Duration::hours(LIVE_WINDOW_HOURS);
            println!("Live vibe in {city} (last {LIVE_WINDOW_HOURS} hours):");
            for venue in venues {
                let recent = app.store()?.since(&venue.id, since).await?;
                match aggregate::live_vibe(&recent) {
                    Some(vibe) => println!("- {}: {vibe} ({} check-ins)", venue.name, recent.len()),
                    None => println!("- {}: no recent check-ins", venue.name),
                }
            }
        }
        Commands::Onboard { city } => {
            let prefs = app.prefs.update(|p| {
                p.onboarding_complete = true;
                p.favorite_city = Some(city.clone());
                p.notification_session_id.get_or_insert_with(Uuid::new_v4);
            })?;
            println!("Favorite city set to {city}.");
            if let Some(session) = prefs.notification_session_id {
                log::info!("notification session {session}");
            }
        }
        Commands::Login { pin } => {
            app.authorize(Some(pin))?;
            println!("PIN saved to {}.", app.prefs.path().display());
        }
        Commands::Insights {
            venue,
            range_days,
            pin,
            synthetic,
        } => {
            app.authorize(pin)?;
            let (insights, _) = app.venue_insights(&venue, range_days, synthetic).await?;
            print_insights(&insights, synthetic);
        }
        Commands::Report {
            venue,
            range_days,
            pin,
            synthetic,
            out,
        } => {
            app.authorize(pin)?;
            let (insights, recent) = app.venue_insights(&venue, range_days, synthetic).await?;
            let details = match &app.pool {
                Some(pool) => db::fetch_venue(pool, &venue).await?,
                None => None,
            };
            let report = report::build_report(details.as_ref(), &insights, &recent, synthetic);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let kind = access::classify(&err);
        log::error!("{err:#}");
        eprintln!("{}", kind.user_message());
        std::process::exit(1);
    }
}
