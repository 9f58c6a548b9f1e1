//! Rule-based "Top 3 Insights" shown beneath each chart.

use crate::charts::{
    daily_engagements, engagement_totals, shares, value_counts, ChartKind, TOP_LOCATIONS,
};
use media_core::types::{Dimension, MediaPost};

pub const NO_DATA_INSIGHT: &str = "No data available to generate insights for this chart.";

/// Ratio of last-day to first-day engagements above which a trend is "increasing".
pub const GROWTH_THRESHOLD: f64 = 1.1;
/// Ratio below which a trend is "decreasing".
pub const DECLINE_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Compare the last daily total against the first. `None` with fewer than two days.
pub fn trend_direction(daily: &[(chrono::NaiveDate, i64)]) -> Option<TrendDirection> {
    if daily.len() < 2 {
        return None;
    }
    let first = daily[0].1 as f64;
    let last = daily[daily.len() - 1].1 as f64;
    Some(if last > first * GROWTH_THRESHOLD {
        TrendDirection::Increasing
    } else if last < first * DECLINE_THRESHOLD {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    })
}

/// Up to three observations about `kind` computed over `posts`.
pub fn insights_for(kind: ChartKind, posts: &[MediaPost]) -> Vec<String> {
    if posts.is_empty() {
        return vec![NO_DATA_INSIGHT.to_string()];
    }

    let insights = match kind {
        ChartKind::SentimentBreakdown => sentiment_insights(posts),
        ChartKind::EngagementTrend => trend_insights(posts),
        ChartKind::PlatformEngagements => platform_insights(posts),
        ChartKind::MediaTypeMix => media_type_insights(posts),
        ChartKind::TopLocations => location_insights(posts),
    };

    if insights.is_empty() {
        vec!["No specific insights available for this chart type.".to_string()]
    } else {
        insights
    }
}

fn sentiment_insights(posts: &[MediaPost]) -> Vec<String> {
    let shares = shares(&value_counts(posts, Dimension::Sentiment));
    let mut insights = Vec::new();

    if let Some((label, pct)) = shares.first() {
        insights.push(format!(
            "The most dominant sentiment is '{label}' with {pct:.2}% of posts."
        ));
    }
    if let Some((label, pct)) = shares.get(1) {
        insights.push(format!(
            "The second most common sentiment is '{label}' representing {pct:.2}% of posts."
        ));
    }
    if shares.len() > 2 {
        if let Some((label, pct)) = shares.last() {
            insights.push(format!(
                "The least common sentiment among the top three is '{label}' with {pct:.2}%."
            ));
        }
    } else if shares.len() == 2 {
        insights.push(format!(
            "The second sentiment, '{}', is notably less frequent than the dominant one.",
            shares[1].0
        ));
    }
    insights
}

fn trend_insights(posts: &[MediaPost]) -> Vec<String> {
    let daily = daily_engagements(posts);
    let mut insights = Vec::new();

    // Earliest day wins ties for both peak and low.
    let peak = daily
        .iter()
        .fold(None::<&(chrono::NaiveDate, i64)>, |best, day| match best {
            Some(b) if b.1 >= day.1 => Some(b),
            _ => Some(day),
        });
    let lowest = daily
        .iter()
        .fold(None::<&(chrono::NaiveDate, i64)>, |best, day| match best {
            Some(b) if b.1 <= day.1 => Some(b),
            _ => Some(day),
        });

    let (Some((peak_date, peak_total)), Some((low_date, low_total))) = (peak, lowest) else {
        return vec!["Not enough data points to determine a clear engagement trend.".to_string()];
    };

    insights.push(format!(
        "Peak engagement occurred on {peak_date} with {peak_total} total engagements, indicating a significant event or campaign around that time."
    ));
    insights.push(format!(
        "Lowest engagement occurred on {low_date} with {low_total} total engagements, potentially due to low activity or off-peak periods."
    ));

    match trend_direction(&daily) {
        Some(TrendDirection::Increasing) => insights.push(
            "Overall, there appears to be an increasing trend in engagements over the analyzed period."
                .to_string(),
        ),
        Some(TrendDirection::Decreasing) => insights.push(
            "Overall, there appears to be a decreasing trend in engagements over the analyzed period."
                .to_string(),
        ),
        Some(TrendDirection::Stable) => {
            insights.push("Engagements show a relatively stable trend over time.".to_string())
        }
        None => {}
    }
    insights
}

fn platform_insights(posts: &[MediaPost]) -> Vec<String> {
    let mut top = engagement_totals(posts, Dimension::Platform);
    top.truncate(3);
    let mut insights = Vec::new();

    if let Some((label, total)) = top.first() {
        insights.push(format!(
            "The platform '{label}' generates the highest engagement with {total} total engagements, making it the most effective channel."
        ));
    }
    if let Some((label, _)) = top.get(1) {
        insights.push(format!(
            "'{label}' is the second highest platform, indicating its significant contribution to overall engagement."
        ));
    }
    if top.len() > 2 {
        insights.push(format!(
            "The top three platforms ('{}', '{}', '{}') collectively capture a large majority of total engagements.",
            top[0].0, top[1].0, top[2].0
        ));
    } else if !top.is_empty() {
        insights.push(
            "Engagement is heavily concentrated on a limited number of platforms.".to_string(),
        );
    }
    insights
}

fn media_type_insights(posts: &[MediaPost]) -> Vec<String> {
    let shares = shares(&value_counts(posts, Dimension::MediaType));
    let mut insights = Vec::new();

    if let Some((label, pct)) = shares.first() {
        insights.push(format!(
            "'{label}' is the most frequently used media type, accounting for {pct:.2}% of content."
        ));
    }
    if let Some((label, _)) = shares.get(1) {
        insights.push(format!(
            "The second most common media type is '{label}', suggesting its importance in content strategy."
        ));
    }
    if shares.len() > 2 {
        insights.push(format!(
            "There's a diverse mix of media types, but the top three ('{}', '{}', '{}') dominate content creation.",
            shares[0].0, shares[1].0, shares[2].0
        ));
    } else if !shares.is_empty() {
        insights.push(
            "The content strategy appears focused on a few primary media types.".to_string(),
        );
    }
    insights
}

fn location_insights(posts: &[MediaPost]) -> Vec<String> {
    let mut top = engagement_totals(posts, Dimension::Location);
    top.truncate(TOP_LOCATIONS);
    let mut insights = Vec::new();

    if let Some((label, total)) = top.first() {
        insights.push(format!(
            "The top location by engagement is '{label}' with {total} total engagements, highlighting a key geographic market."
        ));
    }
    if let Some((label, _)) = top.get(1) {
        insights.push(format!(
            "'{label}' is the second most engaging location, indicating strong audience presence there."
        ));
    }
    if top.len() > 2 {
        insights.push(
            "The top locations show concentrated engagement, suggesting specific regional marketing efforts could be highly effective."
                .to_string(),
        );
    } else if !top.is_empty() {
        insights.push(
            "Engagement is highly concentrated in a very small number of locations.".to_string(),
        );
    }
    insights
}
