//! Dashboard snapshot: headline totals plus every chart with its insights.

use crate::charts::{build_chart, total_engagements, ChartData, ChartKind};
use crate::insights::insights_for;
use chrono::{DateTime, Utc};
use media_core::types::{DateBounds, MediaPost};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartPanel {
    pub kind: ChartKind,
    pub title: String,
    pub data: ChartData,
    pub insights: Vec<String>,
}

impl ChartPanel {
    pub fn build(kind: ChartKind, posts: &[MediaPost]) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            data: build_chart(kind, posts),
            insights: insights_for(kind, posts),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardSnapshot {
    pub total_posts: usize,
    pub total_engagements: i64,
    pub date_bounds: Option<DateBounds>,
    pub charts: Vec<ChartPanel>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn build(posts: &[MediaPost]) -> Self {
        Self {
            total_posts: posts.len(),
            total_engagements: total_engagements(posts),
            date_bounds: DateBounds::of(posts),
            charts: ChartKind::ALL
                .iter()
                .map(|kind| ChartPanel::build(*kind, posts))
                .collect(),
            generated_at: Utc::now(),
        }
    }

    pub fn chart(&self, kind: ChartKind) -> Option<&ChartPanel> {
        self.charts.iter().find(|c| c.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::{campaign, post};

    #[test]
    fn test_snapshot_totals_and_panels() {
        let snapshot = DashboardSnapshot::build(&campaign());
        assert_eq!(snapshot.total_posts, 10);
        assert_eq!(snapshot.total_engagements, 500);
        assert_eq!(snapshot.charts.len(), ChartKind::ALL.len());
        let trend = snapshot.chart(ChartKind::EngagementTrend).unwrap();
        assert_eq!(trend.title, "Engagement Trend over time");
        assert_eq!(trend.insights.len(), 3);
    }

    #[test]
    fn test_snapshot_with_maximal_engagements() {
        let posts = vec![
            post(1, "Instagram", "Positive", "Jakarta", "Video", i64::MAX),
            post(1, "Instagram", "Positive", "Jakarta", "Video", i64::MAX),
        ];
        let snapshot = DashboardSnapshot::build(&posts);
        assert_eq!(snapshot.total_engagements, i64::MAX);
        let platforms = snapshot.chart(ChartKind::PlatformEngagements).unwrap();
        assert!(platforms.insights[0].contains(&i64::MAX.to_string()));
    }

    #[test]
    fn test_snapshot_serializes_chart_type_tag() {
        let snapshot = DashboardSnapshot::build(&campaign());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["charts"][0]["kind"], "sentiment_breakdown");
        assert_eq!(json["charts"][0]["data"]["chart_type"], "donut");
        assert_eq!(json["charts"][1]["data"]["chart_type"], "line");
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = DashboardSnapshot::build(&[]);
        assert_eq!(snapshot.total_posts, 0);
        assert!(snapshot.date_bounds.is_none());
        assert!(snapshot.charts.iter().all(|c| c.data.is_empty()));
    }
}
