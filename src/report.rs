use std::fmt::Write;

use crate::insights::VenueInsights;
use crate::models::{CheckIn, SplitEntry, Venue};

fn write_split(output: &mut String, title: &str, entries: Option<&[SplitEntry]>) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    match entries {
        None => {
            let _ = writeln!(output, "Not enough check-ins to show this yet.");
        }
        Some(entries) => {
            for entry in entries {
                let _ = writeln!(output, "- {}: {}%", entry.label, entry.pct);
            }
        }
    }
}

fn ratio_label(ratio: Option<f64>) -> String {
    match ratio {
        Some(value) => format!("{:.0}%", value * 100.0),
        None => "no responses".to_string(),
    }
}

pub fn build_report(
    venue: Option<&Venue>,
    insights: &VenueInsights,
    recent: &[CheckIn],
    synthetic: bool,
) -> String {
    let mut output = String::new();
    let venue_label = venue.map_or(insights.venue_id.as_str(), |v| v.name.as_str());

    let _ = writeln!(output, "# Venue Insights Report");
    let _ = writeln!(
        output,
        "Generated for {} (last {} days{})",
        venue_label,
        insights.range_days,
        if synthetic { ", estimated" } else { "" }
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Numbers");
    let _ = writeln!(output, "- Check-ins: {}", insights.kpis.total_checkins);
    let _ = writeln!(output, "- Average vibe: {:.1} / 4", insights.kpis.avg_vibe);
    let _ = writeln!(
        output,
        "- Change vs previous period: {:+}%",
        insights.kpis.change_pct
    );
    if synthetic {
        let _ = writeln!(
            output,
            "- Repeat visitors: {}%",
            insights.kpis.repeat_visitor_pct
        );
    }
    let _ = writeln!(output, "- Singles: {}", ratio_label(insights.single_ratio));
    let _ = writeln!(output, "- Open to ONS: {}", ratio_label(insights.ons_ratio));
    let _ = writeln!(output, "- Peak times: {}", insights.peak_summary);

    if let Some(impact) = &insights.impact {
        let _ = writeln!(
            output,
            "- Promotion impact: ~{} extra visitors, +{:.1}% revenue",
            impact.extra_visitors, impact.revenue_lift_pct
        );
    }

    write_split(&mut output, "Vibe Mix", Some(insights.vibe_mix.as_slice()));
    write_split(&mut output, "Why People Come", insights.intent_mix.as_deref());
    write_split(&mut output, "Age Bands", insights.age_mix.as_deref());
    if !synthetic {
        write_split(&mut output, "Gender", insights.gender_mix.as_deref());
    }
    write_split(
        &mut output,
        "Relationship Status",
        Some(insights.relationship_mix.as_slice()),
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Check-ins");
    for point in insights.activity.iter().filter(|p| !p.label.is_empty()) {
        let _ = writeln!(output, "- {}: {}", point.label, point.checkins);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Vibe Trend");
    for point in insights.vibe_trend.iter().filter(|p| !p.label.is_empty()) {
        let _ = writeln!(
            output,
            "- {}: hot {:.0}%, good {:.0}%, ok {:.0}%, quiet {:.0}%",
            point.label, point.hot, point.good, point.ok, point.quiet
        );
    }

    let mut recent = recent.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Check-ins");

    if recent.is_empty() {
        let _ = writeln!(output, "No check-ins recorded for this window.");
    } else {
        for check_in in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {}: {} ({})",
                check_in.created_at.format("%a %b %-d, %-I:%M%P"),
                check_in.vibe,
                check_in.intent
            );
        }
    }

    output
}
