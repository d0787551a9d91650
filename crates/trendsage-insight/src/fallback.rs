//! The deterministic record used whenever model analysis is unavailable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use trendsage_core::{
    Competitor, CompetitorInsight, InsightProvenance, InsightRecord, ObservationSet,
};

pub const FALLBACK_OVERALL_SENTIMENT: f64 = 0.7;

const KEY_INSIGHTS: [&str; 4] = [
    "Technology sector showing strong growth",
    "Apple leading in innovation metrics",
    "Google maintaining search dominance",
    "Microsoft expanding cloud services",
];

const RECOMMENDATIONS: [&str; 3] = [
    "Monitor Apple's product launches closely",
    "Track Google's AI developments",
    "Watch Microsoft's enterprise growth",
];

/// Canned insight for a run without usable model output.
///
/// `competitor_analysis` holds exactly one neutral placeholder per roster
/// competitor, and `data_sources_used` names only the sources that actually
/// produced observations.
#[must_use]
pub fn fallback_record(
    competitors: &[Competitor],
    observations: &ObservationSet,
    now: DateTime<Utc>,
) -> InsightRecord {
    let competitor_analysis: BTreeMap<String, CompetitorInsight> = competitors
        .iter()
        .map(|c| (c.name.clone(), CompetitorInsight::neutral()))
        .collect();

    InsightRecord {
        overall_sentiment: FALLBACK_OVERALL_SENTIMENT,
        key_insights: KEY_INSIGHTS.iter().map(ToString::to_string).collect(),
        competitor_analysis,
        recommendations: RECOMMENDATIONS.iter().map(ToString::to_string).collect(),
        data_sources_used: observations.sources_present(),
        generated_at: now,
        source: InsightProvenance::Fallback,
    }
}
