//! Built-in campaign analysis: an overall summary plus recommendations
//! derived from fixed thresholds, no external service involved.

use crate::charts::{daily_engagements, engagement_totals, shares, total_engagements, value_counts};
use crate::insights::{trend_direction, TrendDirection};
use chrono::{DateTime, Utc};
use media_core::types::{Dimension, MediaPost};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

pub const NO_DATA_SUMMARY: &str = "No data available to generate a summary.";
pub const NO_RECOMMENDATIONS: &str = "No specific campaign recommendations could be generated at this time. Consider uploading more data or adjusting filters.";

/// Where an analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    BuiltIn,
    OpenRouter,
    Gemini,
}

impl AnalysisSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            AnalysisSource::BuiltIn => "Our Model",
            AnalysisSource::OpenRouter => "OpenRouter AI",
            AnalysisSource::Gemini => "Gemini AI",
        }
    }

    pub fn is_ai(&self) -> bool {
        !matches!(self, AnalysisSource::BuiltIn)
    }
}

impl std::fmt::Display for AnalysisSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AnalysisSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "built_in" | "builtin" | "us" => Ok(AnalysisSource::BuiltIn),
            "open_router" | "openrouter" => Ok(AnalysisSource::OpenRouter),
            "gemini" => Ok(AnalysisSource::Gemini),
            other => Err(format!(
                "unknown analysis source '{other}' (expected built-in, open-router or gemini)"
            )),
        }
    }
}

/// Overall summary and campaign recommendations for a filtered dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Analysis {
    pub source: AnalysisSource,
    /// Model id for AI analyses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl Analysis {
    pub fn new(
        source: AnalysisSource,
        model: Option<String>,
        summary: String,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            source,
            model,
            summary,
            recommendations,
            generated_at: Utc::now(),
        }
    }
}

/// Summary and recommendations from the built-in rules.
pub fn built_in_analysis(posts: &[MediaPost]) -> Analysis {
    if posts.is_empty() {
        return Analysis::new(
            AnalysisSource::BuiltIn,
            None,
            NO_DATA_SUMMARY.to_string(),
            Vec::new(),
        );
    }

    let mut summary = Vec::new();
    let mut recommendations = Vec::new();

    summary.push(format!(
        "Analyzed a total of {} posts with {} engagements.",
        posts.len(),
        total_engagements(posts)
    ));

    // Sentiment
    let sentiments = shares(&value_counts(posts, Dimension::Sentiment));
    if let Some((dominant, pct)) = sentiments.first() {
        summary.push(format!(
            "The dominant sentiment is '{dominant}' ({pct:.1}%)."
        ));
        match dominant.as_str() {
            "Positive" if *pct > 60.0 => recommendations.push(
                "Leverage positive sentiment: Focus on replicating strategies from high-performing positive content. Consider user-generated content campaigns showcasing positive experiences.".to_string(),
            ),
            "Negative" if *pct > 30.0 => recommendations.push(
                "Address negative sentiment: Actively monitor and respond to negative feedback. Investigate root causes and consider a proactive PR strategy.".to_string(),
            ),
            "Neutral" if *pct > 50.0 => recommendations.push(
                "Boost engagement for neutral content: Experiment with more emotive language, compelling visuals, and clear calls to action to shift neutral sentiment towards positive.".to_string(),
            ),
            _ => {}
        }
    }

    // Top platform
    let platforms = engagement_totals(posts, Dimension::Platform);
    if let Some((top, total)) = platforms.first() {
        summary.push(format!(
            "'{top}' is the highest engaging platform, contributing {total} engagements."
        ));
        recommendations.push(format!(
            "Optimize for '{top}': Allocate more resources to content creation and advertising on this platform, as it currently delivers the highest engagement."
        ));
        if let Some((second, second_total)) = platforms.get(1) {
            if *total > second_total.saturating_mul(2) {
                recommendations.push(format!(
                    "Explore underperforming platforms: Investigate why platforms like '{second}' have significantly lower engagement compared to the top performer. Could there be an audience mismatch or content style issue?"
                ));
            }
        }
    }

    // Top media type
    let media_types = value_counts(posts, Dimension::MediaType);
    if let Some((top, count)) = media_types.first() {
        summary.push(format!("'{top}' is the most frequently used media type."));
        recommendations.push(format!(
            "Double down on '{top}': Since this is the most used media type, ensure its quality is top-notch and explore variations within this format."
        ));
        if let Some((_, second_count)) = media_types.get(1) {
            if *count as f64 > *second_count as f64 * 1.5 {
                recommendations.push(
                    "Diversify media types: If your content is heavily skewed towards one media type, consider experimenting with other formats to reach different audience segments or cater to varied consumption preferences.".to_string(),
                );
            }
        }
    }

    // Engagement trend
    match trend_direction(&daily_engagements(posts)) {
        Some(TrendDirection::Increasing) => {
            summary.push("Engagements show an increasing trend over time.".to_string());
            recommendations.push(
                "Capitalize on growth: Identify factors contributing to the increasing engagement trend (e.g., successful campaigns, trending topics) and scale those efforts.".to_string(),
            );
        }
        Some(TrendDirection::Decreasing) => {
            summary.push("Engagements show a decreasing trend over time.".to_string());
            recommendations.push(
                "Reverse declining trends: Analyze periods of low engagement to understand potential causes (e.g., content fatigue, competitive activity) and devise strategies to re-engage the audience.".to_string(),
            );
        }
        Some(TrendDirection::Stable) => {
            summary.push("Engagements show a relatively stable trend over time.".to_string());
        }
        None => {}
    }

    if recommendations.is_empty() {
        recommendations.push(NO_RECOMMENDATIONS.to_string());
    }

    Analysis::new(AnalysisSource::BuiltIn, None, summary.join(" "), recommendations)
}
