//! Dashboard filters: date range plus one selection per categorical dimension.

use crate::error::{MediaError, MediaResult};
use crate::types::{DateBounds, Dimension, MediaPost, ALL_OPTION};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// Active filter selections. `None` on any field means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterCriteria {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2024-01-01")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2024-03-31")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub sentiment: Option<String>,
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub media_type: Option<String>,
}

/// Treat `"All"` (any case) and blank selections as no selection.
pub fn normalize_selection(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_OPTION) {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn deserialize_selection<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_selection(value))
}

impl FilterCriteria {
    pub fn selection(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Platform => self.platform.as_deref(),
            Dimension::Sentiment => self.sentiment.as_deref(),
            Dimension::Location => self.location.as_deref(),
            Dimension::MediaType => self.media_type.as_deref(),
        }
    }

    pub fn validate(&self) -> MediaResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(MediaError::InvalidFilter(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok(())
    }

    /// Date bounds are inclusive whole days.
    pub fn matches(&self, post: &MediaPost) -> bool {
        let day = post.day();
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| day > end) {
            return false;
        }
        Dimension::ALL.iter().all(|dim| match self.selection(*dim) {
            Some(selected) => dim.value(post) == selected,
            None => true,
        })
    }

    pub fn active_count(&self) -> usize {
        let dates = [self.start_date, self.end_date]
            .iter()
            .filter(|d| d.is_some())
            .count();
        let selections = Dimension::ALL
            .iter()
            .filter(|d| self.selection(**d).is_some())
            .count();
        dates + selections
    }

    /// One-line human description, used in reports and logs.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => parts.push(format!("Date: {start} to {end}")),
            (Some(start), None) => parts.push(format!("Date: from {start}")),
            (None, Some(end)) => parts.push(format!("Date: until {end}")),
            (None, None) => {}
        }
        for dim in Dimension::ALL {
            if let Some(selected) = self.selection(dim) {
                parts.push(format!("{}: {}", dim.display_name(), selected));
            }
        }
        if parts.is_empty() {
            "All records".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Apply criteria to a post set, returning the matching posts in input order.
pub fn apply(posts: &[MediaPost], criteria: &FilterCriteria) -> MediaResult<Vec<MediaPost>> {
    criteria.validate()?;
    Ok(posts
        .iter()
        .filter(|post| criteria.matches(post))
        .cloned()
        .collect())
}

/// Selectable values for every filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterOptions {
    pub date_bounds: Option<DateBounds>,
    pub platforms: Vec<String>,
    pub sentiments: Vec<String>,
    pub locations: Vec<String>,
    pub media_types: Vec<String>,
}

impl FilterOptions {
    /// Each list starts with `"All"` followed by the sorted distinct values.
    pub fn from_posts(posts: &[MediaPost]) -> Self {
        let options_for = |dim: Dimension| -> Vec<String> {
            let distinct: BTreeSet<&str> = posts.iter().map(|p| dim.value(p)).collect();
            std::iter::once(ALL_OPTION.to_string())
                .chain(distinct.into_iter().map(str::to_string))
                .collect()
        };
        Self {
            date_bounds: DateBounds::of(posts),
            platforms: options_for(Dimension::Platform),
            sentiments: options_for(Dimension::Sentiment),
            locations: options_for(Dimension::Location),
            media_types: options_for(Dimension::MediaType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn post(day: u32, hour: u32, platform: &str, sentiment: &str) -> MediaPost {
        MediaPost {
            date: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            platform: platform.to_string(),
            sentiment: sentiment.to_string(),
            location: "Jakarta".to_string(),
            engagements: 10,
            media_type: "Video".to_string(),
            influencer_brand: "Brand".to_string(),
            post_type: "Organic".to_string(),
            extra: BTreeMap::new(),
        }
    }

    fn sample() -> Vec<MediaPost> {
        vec![
            post(1, 9, "Instagram", "Positive"),
            post(2, 18, "TikTok", "Negative"),
            post(3, 0, "Instagram", "Neutral"),
            post(4, 12, "Twitter", "Positive"),
        ]
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn test_no_criteria_keeps_everything() {
        let filtered = apply(&sample(), &FilterCriteria::default()).unwrap();
        assert_eq!(filtered.len(), 4);
        assert_eq!(FilterCriteria::default().describe(), "All records");
    }

    #[test]
    fn test_end_date_includes_whole_day() {
        let criteria = FilterCriteria {
            start_date: Some(date(2)),
            end_date: Some(date(2)),
            ..Default::default()
        };
        let filtered = apply(&sample(), &criteria).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].platform, "TikTok");
    }

    #[test]
    fn test_open_ended_ranges() {
        let from = FilterCriteria {
            start_date: Some(date(3)),
            ..Default::default()
        };
        assert_eq!(apply(&sample(), &from).unwrap().len(), 2);

        let until = FilterCriteria {
            end_date: Some(date(1)),
            ..Default::default()
        };
        assert_eq!(apply(&sample(), &until).unwrap().len(), 1);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let criteria = FilterCriteria {
            start_date: Some(date(4)),
            end_date: Some(date(1)),
            ..Default::default()
        };
        assert!(matches!(
            apply(&sample(), &criteria),
            Err(MediaError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_categorical_selections_combine() {
        let criteria = FilterCriteria {
            platform: Some("Instagram".into()),
            sentiment: Some("Neutral".into()),
            ..Default::default()
        };
        let filtered = apply(&sample(), &criteria).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].day(), date(3));
        assert_eq!(criteria.active_count(), 2);
        assert_eq!(criteria.describe(), "Platform: Instagram; Sentiment: Neutral");
    }

    #[test]
    fn test_selection_is_case_sensitive() {
        let criteria = FilterCriteria {
            platform: Some("instagram".into()),
            ..Default::default()
        };
        assert!(apply(&sample(), &criteria).unwrap().is_empty());
    }

    #[test]
    fn test_all_selection_deserializes_to_none() {
        let criteria: FilterCriteria = serde_json::from_str(
            r#"{"platform":"All","sentiment":"all","location":"  ","media_type":"Video","start_date":"2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(criteria.platform, None);
        assert_eq!(criteria.sentiment, None);
        assert_eq!(criteria.location, None);
        assert_eq!(criteria.media_type.as_deref(), Some("Video"));
        assert_eq!(criteria.start_date, Some(date(1)));
    }

    #[test]
    fn test_filter_options() {
        let options = FilterOptions::from_posts(&sample());
        assert_eq!(options.platforms, vec!["All", "Instagram", "TikTok", "Twitter"]);
        assert_eq!(options.sentiments, vec!["All", "Negative", "Neutral", "Positive"]);
        assert_eq!(options.locations, vec!["All", "Jakarta"]);
        let bounds = options.date_bounds.unwrap();
        assert_eq!(bounds.min, date(1));
        assert_eq!(bounds.max, date(4));

        let empty = FilterOptions::from_posts(&[]);
        assert!(empty.date_bounds.is_none());
        assert_eq!(empty.media_types, vec!["All"]);
    }
}
