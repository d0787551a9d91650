//! Plain-text rendering of a stored insight record.

use std::fmt::Write as _;

use chrono::NaiveDate;
use trendsage_core::{InsightProvenance, InsightRecord};

const RULE_WIDTH: usize = 60;

fn sentiment_label(value: f64) -> &'static str {
    if value > 0.0 {
        "Positive"
    } else if value < 0.0 {
        "Negative"
    } else {
        "Neutral"
    }
}

fn marker(value: f64) -> &'static str {
    if value > 0.0 {
        "↑"
    } else if value < 0.0 {
        "↓"
    } else {
        "→"
    }
}

fn bullets(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str("• (none)\n");
        return;
    }
    for item in items {
        let _ = writeln!(out, "• {item}");
    }
}

#[must_use]
pub fn render_report(record: &InsightRecord, date: NaiveDate) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "Daily Market Insights Report - {date}");
    let _ = writeln!(out, "{rule}\n");

    let _ = writeln!(
        out,
        "Overall Sentiment: {} ({:.2})\n",
        sentiment_label(record.overall_sentiment),
        record.overall_sentiment
    );

    out.push_str("Key Insights:\n");
    bullets(&mut out, &record.key_insights);

    out.push_str("\nCompetitor Analysis:\n");
    if record.competitor_analysis.is_empty() {
        out.push_str("• (none)\n");
    }
    for (name, insight) in &record.competitor_analysis {
        let _ = writeln!(
            out,
            "• {name}: {} {} ({:.2})",
            marker(insight.sentiment),
            insight.trend,
            insight.sentiment
        );
    }

    out.push_str("\nRecommendations:\n");
    bullets(&mut out, &record.recommendations);

    let sources = if record.data_sources_used.is_empty() {
        "Multiple sources".to_string()
    } else {
        record
            .data_sources_used
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(out, "\nData Sources: {sources}\n");

    let provenance = match record.source {
        InsightProvenance::Model => "AI-generated",
        InsightProvenance::Fallback => "fallback analysis",
    };
    let _ = writeln!(out, "Generated by TrendSage ({provenance})");
    out.push_str(&rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::fallback_record;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use trendsage_core::{default_roster, CompetitorInsight, ObservationSet, Trend};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn sample_record() -> InsightRecord {
        let mut record = fallback_record(&default_roster(), &ObservationSet::new(), Utc::now());
        record.competitor_analysis.insert(
            "Apple".to_string(),
            CompetitorInsight {
                sentiment: 0.8,
                trend: Trend::Positive,
            },
        );
        record.data_sources_used = ["stock", "news", "twitter"]
            .into_iter()
            .map(String::from)
            .collect();
        record
    }

    #[test]
    fn renders_every_section_in_order() {
        let report = render_report(&sample_record(), date());

        let positions: Vec<usize> = [
            "Daily Market Insights Report - 2026-03-02",
            "Overall Sentiment: Positive (0.70)",
            "Key Insights:",
            "Competitor Analysis:",
            "Recommendations:",
            "Data Sources: news, stock, twitter",
            "fallback analysis",
        ]
        .iter()
        .map(|needle| report.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{report}");

        assert!(report.contains("• Apple: ↑ positive (0.80)"));
        assert!(report.contains("• Google: → stable (0.00)"));
        assert!(report.contains("• Technology sector showing strong growth"));
    }

    #[test]
    fn competitors_are_in_name_order() {
        let report = render_report(&sample_record(), date());
        let apple = report.find("• Apple").unwrap();
        let google = report.find("• Google").unwrap();
        let microsoft = report.find("• Microsoft").unwrap();
        assert!(apple < google && google < microsoft);
    }

    #[test]
    fn empty_sources_and_negative_sentiment() {
        let mut record = sample_record();
        record.overall_sentiment = -0.25;
        record.data_sources_used = BTreeSet::new();
        record.source = InsightProvenance::Model;
        record.key_insights.clear();

        let report = render_report(&record, date());
        assert!(report.contains("Overall Sentiment: Negative (-0.25)"));
        assert!(report.contains("Data Sources: Multiple sources"));
        assert!(report.contains("AI-generated"));
        assert!(report.contains("Key Insights:\n• (none)"));
    }

    #[test]
    fn zero_sentiment_is_neutral() {
        let mut record = sample_record();
        record.overall_sentiment = 0.0;
        let report = render_report(&record, date());
        assert!(report.contains("Overall Sentiment: Neutral (0.00)"));
    }
}
