use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Label substituted for missing categorical values.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Filter selection meaning "no restriction on this dimension".
pub const ALL_OPTION: &str = "All";

/// Normalized column names every campaign file must provide.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "date",
    "platform",
    "sentiment",
    "location",
    "engagements",
    "media_type",
    "influencer_brand",
    "post_type",
];

/// One cleaned social-media post from a campaign data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MediaPost {
    #[schema(value_type = String, example = "2024-03-01T09:30:00")]
    pub date: NaiveDateTime,
    pub platform: String,
    pub sentiment: String,
    pub location: String,
    pub engagements: i64,
    pub media_type: String,
    pub influencer_brand: String,
    pub post_type: String,
    /// Any further columns of the source file, keyed by normalized name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl MediaPost {
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Flatten into a column → value record, the shape sent to AI providers.
    pub fn to_record(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut record = serde_json::Map::new();
        record.insert(
            "date".into(),
            self.date.format("%Y-%m-%d %H:%M:%S").to_string().into(),
        );
        record.insert("platform".into(), self.platform.clone().into());
        record.insert("sentiment".into(), self.sentiment.clone().into());
        record.insert("location".into(), self.location.clone().into());
        record.insert("engagements".into(), self.engagements.into());
        record.insert("media_type".into(), self.media_type.clone().into());
        record.insert(
            "influencer_brand".into(),
            self.influencer_brand.clone().into(),
        );
        record.insert("post_type".into(), self.post_type.clone().into());
        for (key, value) in &self.extra {
            record.insert(key.clone(), value.clone().into());
        }
        record
    }
}

/// Categorical dimensions the dashboard can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Platform,
    Sentiment,
    Location,
    MediaType,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Platform,
        Dimension::Sentiment,
        Dimension::Location,
        Dimension::MediaType,
    ];

    pub fn value<'a>(&self, post: &'a MediaPost) -> &'a str {
        match self {
            Dimension::Platform => &post.platform,
            Dimension::Sentiment => &post.sentiment,
            Dimension::Location => &post.location,
            Dimension::MediaType => &post.media_type,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Dimension::Platform => "Platform",
            Dimension::Sentiment => "Sentiment",
            Dimension::Location => "Location",
            Dimension::MediaType => "Media Type",
        }
    }
}

/// Inclusive calendar-day span covered by a set of posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateBounds {
    #[schema(value_type = String, example = "2024-01-01")]
    pub min: NaiveDate,
    #[schema(value_type = String, example = "2024-03-31")]
    pub max: NaiveDate,
}

impl DateBounds {
    pub fn of(posts: &[MediaPost]) -> Option<Self> {
        let min = posts.iter().map(MediaPost::day).min()?;
        let max = posts.iter().map(MediaPost::day).max()?;
        Some(Self { min, max })
    }
}

impl std::fmt::Display for DateBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.min, self.max)
    }
}

/// Column names in the order a cleaned dataset exposes them.
pub fn column_names(extra: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(extra.iter().cloned())
        .collect()
}
