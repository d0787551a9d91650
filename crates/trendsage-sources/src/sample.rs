//! Stand-in social payload used when the social source is unusable.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

/// Note attached to every degraded social observation.
pub const SAMPLE_SOCIAL_NOTE: &str = "Sample data due to API rate limit";

/// Two synthetic posts shaped like a v2 recent-search response.
#[must_use]
pub fn sample_social_payload(competitor_name: &str, now: DateTime<Utc>) -> Value {
    let yesterday = now - Duration::hours(24);
    json!({
        "data": [
            {
                "text": format!("{competitor_name} announces new product innovation"),
                "created_at": now.to_rfc3339(),
                "public_metrics": {
                    "retweet_count": 150,
                    "like_count": 500
                }
            },
            {
                "text": format!("{competitor_name} reports strong quarterly earnings"),
                "created_at": yesterday.to_rfc3339(),
                "public_metrics": {
                    "retweet_count": 200,
                    "like_count": 800
                }
            }
        ],
        "note": SAMPLE_SOCIAL_NOTE
    })
}
