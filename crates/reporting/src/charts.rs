//! Chart datasets computed from the filtered campaign posts.

use chrono::NaiveDate;
use media_core::types::{Dimension, MediaPost};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

// ─── Palette ────────────────────────────────────────────────────────────────

pub const PRIMARY_COLOR: &str = "#3B82F6";
pub const SECONDARY_COLOR: &str = "#6366F1";
pub const TERTIARY_COLOR: &str = "#0EA5E9";

pub const MEDIA_TYPE_PALETTE: [&str; 7] = [
    "#8B5CF6", "#EC4899", "#F97316", "#14B8A6", "#60A5FA", "#DC2626", "#EAB308",
];

/// Number of locations shown in the location chart.
pub const TOP_LOCATIONS: usize = 5;

fn sentiment_color(label: &str) -> Option<&'static str> {
    match label {
        "Positive" => Some("#10B981"),
        "Neutral" => Some("#FCD34D"),
        "Negative" => Some("#EF4444"),
        _ => None,
    }
}

// ─── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    SentimentBreakdown,
    EngagementTrend,
    PlatformEngagements,
    MediaTypeMix,
    TopLocations,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::SentimentBreakdown,
        ChartKind::EngagementTrend,
        ChartKind::PlatformEngagements,
        ChartKind::MediaTypeMix,
        ChartKind::TopLocations,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::SentimentBreakdown => "Sentiment Breakdown",
            ChartKind::EngagementTrend => "Engagement Trend over time",
            ChartKind::PlatformEngagements => "Platform Engagements",
            ChartKind::MediaTypeMix => "Media Type Mix",
            ChartKind::TopLocations => "Top 5 Locations by Engagement",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::SentimentBreakdown => "sentiment",
            ChartKind::EngagementTrend => "engagement-trend",
            ChartKind::PlatformEngagements => "platforms",
            ChartKind::MediaTypeMix => "media-types",
            ChartKind::TopLocations => "locations",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

/// One donut slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryShare {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    pub color: String,
}

/// One bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryTotal {
    pub label: String,
    pub total_engagements: i64,
}

/// One point on the engagement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    #[schema(value_type = String, example = "2024-03-01")]
    pub date: NaiveDate,
    pub total_engagements: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "chart_type", rename_all = "snake_case")]
pub enum ChartData {
    Donut { slices: Vec<CategoryShare> },
    Line { color: String, points: Vec<TrendPoint> },
    Bar { color: String, bars: Vec<CategoryTotal> },
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Donut { slices } => slices.is_empty(),
            ChartData::Line { points, .. } => points.is_empty(),
            ChartData::Bar { bars, .. } => bars.is_empty(),
        }
    }
}

// ─── Aggregations ───────────────────────────────────────────────────────────

/// Post count per value of `dim`, most frequent first, ties by label.
pub fn value_counts(posts: &[MediaPost], dim: Dimension) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        *counts.entry(dim.value(post)).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Saturating engagement sum; totals clamp at the `i64` range instead of wrapping.
pub fn total_engagements<'a>(posts: impl IntoIterator<Item = &'a MediaPost>) -> i64 {
    posts
        .into_iter()
        .fold(0i64, |acc, post| acc.saturating_add(post.engagements))
}

/// Engagement sum per value of `dim`, highest first, ties by label.
pub fn engagement_totals(posts: &[MediaPost], dim: Dimension) -> Vec<(String, i64)> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for post in posts {
        let total = totals.entry(dim.value(post)).or_default();
        *total = total.saturating_add(post.engagements);
    }
    let mut totals: Vec<(String, i64)> = totals
        .into_iter()
        .map(|(label, total)| (label.to_string(), total))
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    totals
}

/// Engagement sum per calendar day in ascending date order.
pub fn daily_engagements(posts: &[MediaPost]) -> Vec<(NaiveDate, i64)> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for post in posts {
        let total = by_day.entry(post.day()).or_default();
        *total = total.saturating_add(post.engagements);
    }
    by_day.into_iter().collect()
}

/// Convert counts into percentage shares of the whole.
pub fn shares(counts: &[(String, usize)]) -> Vec<(String, f64)> {
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .map(|(label, count)| (label.clone(), *count as f64 * 100.0 / total as f64))
        .collect()
}

// ─── Chart builders ─────────────────────────────────────────────────────────

fn donut(counts: Vec<(String, usize)>, color_for: impl Fn(usize, &str) -> String) -> ChartData {
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    let slices = counts
        .into_iter()
        .enumerate()
        .map(|(i, (label, count))| CategoryShare {
            color: color_for(i, &label),
            percentage: if total > 0 {
                count as f64 * 100.0 / total as f64
            } else {
                0.0
            },
            label,
            count,
        })
        .collect();
    ChartData::Donut { slices }
}

fn bars(totals: Vec<(String, i64)>, color: &str) -> ChartData {
    ChartData::Bar {
        color: color.to_string(),
        bars: totals
            .into_iter()
            .map(|(label, total_engagements)| CategoryTotal {
                label,
                total_engagements,
            })
            .collect(),
    }
}

fn palette(i: usize) -> String {
    MEDIA_TYPE_PALETTE[i % MEDIA_TYPE_PALETTE.len()].to_string()
}

/// Build the dataset behind one chart.
pub fn build_chart(kind: ChartKind, posts: &[MediaPost]) -> ChartData {
    match kind {
        ChartKind::SentimentBreakdown => {
            donut(value_counts(posts, Dimension::Sentiment), |i, label| {
                sentiment_color(label)
                    .map(str::to_string)
                    .unwrap_or_else(|| palette(i))
            })
        }
        ChartKind::EngagementTrend => ChartData::Line {
            color: PRIMARY_COLOR.to_string(),
            points: daily_engagements(posts)
                .into_iter()
                .map(|(date, total_engagements)| TrendPoint {
                    date,
                    total_engagements,
                })
                .collect(),
        },
        ChartKind::PlatformEngagements => bars(
            engagement_totals(posts, Dimension::Platform),
            SECONDARY_COLOR,
        ),
        ChartKind::MediaTypeMix => {
            donut(value_counts(posts, Dimension::MediaType), |i, _| palette(i))
        }
        ChartKind::TopLocations => {
            let mut totals = engagement_totals(posts, Dimension::Location);
            totals.truncate(TOP_LOCATIONS);
            bars(totals, TERTIARY_COLOR)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use media_core::types::MediaPost;
    use std::collections::BTreeMap;

    pub fn post(
        day: u32,
        platform: &str,
        sentiment: &str,
        location: &str,
        media_type: &str,
        engagements: i64,
    ) -> MediaPost {
        MediaPost {
            date: NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            platform: platform.to_string(),
            sentiment: sentiment.to_string(),
            location: location.to_string(),
            engagements,
            media_type: media_type.to_string(),
            influencer_brand: "BrandA".to_string(),
            post_type: "Organic".to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Ten posts over three days across three platforms.
    pub fn campaign() -> Vec<MediaPost> {
        vec![
            post(1, "Instagram", "Positive", "Jakarta", "Video", 100),
            post(1, "Instagram", "Positive", "Bandung", "Image", 50),
            post(1, "TikTok", "Negative", "Jakarta", "Video", 30),
            post(2, "Twitter", "Neutral", "Surabaya", "Text", 10),
            post(2, "Instagram", "Positive", "Medan", "Video", 60),
            post(2, "TikTok", "Positive", "Bali", "Video", 20),
            post(3, "Instagram", "Neutral", "Jakarta", "Image", 80),
            post(3, "Twitter", "Negative", "Yogyakarta", "Text", 5),
            post(3, "TikTok", "Positive", "Makassar", "Video", 90),
            post(3, "Instagram", "Positive", "Jakarta", "Carousel", 55),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_value_counts_order_and_ties() {
        let counts = value_counts(&campaign(), Dimension::Sentiment);
        assert_eq!(
            counts,
            vec![
                ("Positive".to_string(), 6),
                ("Negative".to_string(), 2),
                ("Neutral".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_sentiment_donut_colors_and_shares() {
        let ChartData::Donut { slices } = build_chart(ChartKind::SentimentBreakdown, &campaign())
        else {
            panic!("expected donut");
        };
        assert_eq!(slices[0].label, "Positive");
        assert_eq!(slices[0].color, "#10B981");
        assert!((slices[0].percentage - 60.0).abs() < 1e-9);
        assert_eq!(slices[1].color, "#EF4444");
        assert_eq!(slices[2].color, "#FCD34D");
        let total: f64 = slices.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_trend_is_daily_and_sorted() {
        let ChartData::Line { points, color } = build_chart(ChartKind::EngagementTrend, &campaign())
        else {
            panic!("expected line");
        };
        assert_eq!(color, PRIMARY_COLOR);
        let totals: Vec<i64> = points.iter().map(|p| p.total_engagements).collect();
        assert_eq!(totals, vec![180, 90, 230]);
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_platform_bars_descending() {
        let ChartData::Bar { bars, .. } = build_chart(ChartKind::PlatformEngagements, &campaign())
        else {
            panic!("expected bars");
        };
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Instagram", "TikTok", "Twitter"]);
        assert_eq!(bars[0].total_engagements, 345);
    }

    #[test]
    fn test_top_locations_truncated_to_five() {
        let ChartData::Bar { bars, color } = build_chart(ChartKind::TopLocations, &campaign())
        else {
            panic!("expected bars");
        };
        assert_eq!(color, TERTIARY_COLOR);
        assert_eq!(bars.len(), TOP_LOCATIONS);
        assert_eq!(bars[0].label, "Jakarta");
        assert_eq!(bars[0].total_engagements, 265);
    }

    #[test]
    fn test_media_type_palette_cycles() {
        let ChartData::Donut { slices } = build_chart(ChartKind::MediaTypeMix, &campaign()) else {
            panic!("expected donut");
        };
        assert_eq!(slices[0].label, "Video");
        assert_eq!(slices[0].color, MEDIA_TYPE_PALETTE[0]);
        assert_eq!(slices[1].color, MEDIA_TYPE_PALETTE[1]);
    }

    #[test]
    fn test_empty_posts_give_empty_charts() {
        for kind in ChartKind::ALL {
            assert!(build_chart(kind, &[]).is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let posts = vec![
            post(1, "Instagram", "Positive", "Jakarta", "Video", i64::MAX),
            post(1, "Instagram", "Positive", "Jakarta", "Video", i64::MAX),
            post(2, "TikTok", "Negative", "Bandung", "Image", -5),
        ];
        assert_eq!(total_engagements(&posts), i64::MAX - 5);
        assert_eq!(
            engagement_totals(&posts, Dimension::Platform)[0],
            ("Instagram".to_string(), i64::MAX)
        );
        assert_eq!(daily_engagements(&posts)[0].1, i64::MAX);
    }

    #[test]
    fn test_slug_roundtrip() {
        for kind in ChartKind::ALL {
            assert_eq!(ChartKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(ChartKind::from_slug("nope"), None);
    }
}
