//! Prompt construction and response parsing for AI analyses.

use crate::error::{truncate_for_error, AiError, AiResult};
use crate::provider::CompletionProvider;
use media_core::types::MediaPost;
use media_reporting::{Analysis, ChartPanel};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const MISSING_SUMMARY: &str = "AI did not provide a summary.";
pub const MISSING_RECOMMENDATIONS: &str = "AI did not provide recommendations.";
pub const MAX_CHART_INSIGHTS: usize = 3;

/// Runs analysis prompts against one completion provider.
#[derive(Clone)]
pub struct AiAnalyst {
    provider: Arc<dyn CompletionProvider>,
    sample_rows: usize,
}

impl AiAnalyst {
    pub fn new(provider: Arc<dyn CompletionProvider>, sample_rows: usize) -> Self {
        Self {
            provider,
            sample_rows: sample_rows.max(1),
        }
    }

    /// Overall summary and campaign recommendations for `posts`.
    pub async fn analyze(&self, posts: &[MediaPost], columns: &[String]) -> AiResult<Analysis> {
        if posts.is_empty() {
            return Err(AiError::EmptyData);
        }

        let prompt = analysis_prompt(posts, columns, self.sample_rows)?;
        let raw = self.provider.complete_json(&prompt).await?;
        let (summary, recommendations) = parse_analysis(&raw)?;

        info!(
            source = %self.provider.source(),
            model = self.provider.model(),
            recommendations = recommendations.len(),
            "AI analysis generated"
        );

        Ok(Analysis::new(
            self.provider.source(),
            Some(self.provider.model().to_string()),
            summary,
            recommendations,
        ))
    }

    /// Up to three insights for a single chart, written by the model.
    pub async fn chart_insights(&self, panel: &ChartPanel) -> AiResult<Vec<String>> {
        if panel.data.is_empty() {
            return Err(AiError::EmptyData);
        }

        let prompt = chart_prompt(panel)?;
        let raw = self.provider.complete_json(&prompt).await?;
        let insights = parse_chart_insights(&raw)?;

        info!(
            chart = panel.kind.slug(),
            model = self.provider.model(),
            count = insights.len(),
            "AI chart insights generated"
        );
        Ok(insights)
    }
}

pub fn analysis_prompt(
    posts: &[MediaPost],
    columns: &[String],
    sample_rows: usize,
) -> AiResult<String> {
    let sample: Vec<Value> = posts
        .iter()
        .take(sample_rows)
        .map(|p| Value::Object(p.to_record()))
        .collect();

    let columns_json = serde_json::to_string_pretty(columns).map_err(prompt_encoding)?;
    let sample_json = serde_json::to_string_pretty(&sample).map_err(prompt_encoding)?;

    Ok(format!(
        "You are an expert media intelligence analyst.\n\
         I will provide you with cleaned social media data. Each entry represents a post with the following details:\n\
         {columns_json}\n\n\
         Analyze the following data and provide a concise overall summary of the media performance and specific campaign recommendations to optimize future strategies.\n\
         Your response MUST be in JSON format, with two keys: \"summary\" (a string) and \"recommendations\" (an array of strings).\n\n\
         Here is a sample of the data (first {} rows):\n\
         {sample_json}\n",
        sample.len()
    ))
}

pub fn chart_prompt(panel: &ChartPanel) -> AiResult<String> {
    let data_json = serde_json::to_string_pretty(&panel.data).map_err(prompt_encoding)?;

    Ok(format!(
        "You are an expert media intelligence analyst.\n\
         Below is the aggregated data behind the \"{}\" chart of a social media campaign dashboard.\n\
         {data_json}\n\n\
         Provide the top {MAX_CHART_INSIGHTS} concise, actionable insights a marketing team should take from this chart.\n\
         Your response MUST be in JSON format, with one key: \"insights\" (an array of strings).\n",
        panel.title
    ))
}

fn prompt_encoding(e: serde_json::Error) -> AiError {
    AiError::PromptEncoding(e.to_string())
}

/// Models often wrap JSON in a markdown fence even when asked not to.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an info string such as `json`, whether or not a newline follows it.
    let body = rest
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn parse_object(raw: &str) -> AiResult<serde_json::Map<String, Value>> {
    let content = strip_code_fences(raw);
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AiError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            truncate_for_error(&other.to_string())
        ))),
        Err(e) => {
            warn!(error = %e, "AI response was not valid JSON");
            Err(AiError::InvalidJson {
                error: e.to_string(),
                raw: truncate_for_error(content),
            })
        }
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

/// Summary and recommendations from a model reply, with fallbacks for
/// missing keys.
pub fn parse_analysis(raw: &str) -> AiResult<(String, Vec<String>)> {
    let map = parse_object(raw)?;

    let summary = map
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| MISSING_SUMMARY.to_string());

    let recommendations = map
        .get("recommendations")
        .and_then(string_list)
        .unwrap_or_else(|| vec![MISSING_RECOMMENDATIONS.to_string()]);

    Ok((summary, recommendations))
}

pub fn parse_chart_insights(raw: &str) -> AiResult<Vec<String>> {
    let map = parse_object(raw)?;
    let mut insights = map
        .get("insights")
        .and_then(string_list)
        .ok_or_else(|| {
            AiError::MalformedResponse("response has no \"insights\" list".to_string())
        })?;
    insights.truncate(MAX_CHART_INSIGHTS);
    Ok(insights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_posts, ScriptedProvider};
    use media_core::types::column_names;
    use media_reporting::{AnalysisSource, ChartKind};

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  ```\n{\"a\":1}```  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON {\"a\":1} ```"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_single_line_fenced_reply() {
        let insights = parse_chart_insights(r#"```json{"insights": ["Video leads"]}```"#).unwrap();
        assert_eq!(insights, vec!["Video leads"]);
    }

    #[test]
    fn test_parse_analysis_fallbacks() {
        let (summary, recs) = parse_analysis("{}").unwrap();
        assert_eq!(summary, MISSING_SUMMARY);
        assert_eq!(recs, vec![MISSING_RECOMMENDATIONS.to_string()]);

        let (summary, recs) =
            parse_analysis(r#"{"summary": "Strong week", "recommendations": ["Post more video", ""]}"#)
                .unwrap();
        assert_eq!(summary, "Strong week");
        assert_eq!(recs, vec!["Post more video".to_string()]);
    }

    #[test]
    fn test_parse_analysis_invalid_json_keeps_raw() {
        match parse_analysis("Sure! Here is the analysis") {
            Err(AiError::InvalidJson { raw, .. }) => assert_eq!(raw, "Sure! Here is the analysis"),
            other => panic!("expected InvalidJson, got {other:?}"),
        }
        assert!(matches!(
            parse_analysis("[1, 2]"),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_chart_insights_truncates() {
        let insights =
            parse_chart_insights(r#"{"insights": ["one", "two", "three", "four"]}"#).unwrap();
        assert_eq!(insights, vec!["one", "two", "three"]);
        assert!(parse_chart_insights(r#"{"summary": "x"}"#).is_err());
    }

    #[test]
    fn test_analysis_prompt_limits_sample() {
        let posts = sample_posts(5);
        let prompt = analysis_prompt(&posts, &column_names(&[]), 2).unwrap();
        assert!(prompt.contains("first 2 rows"));
        assert!(prompt.contains("\"media_type\""));
        assert!(prompt.contains("\"summary\" (a string)"));
        assert_eq!(prompt.matches("\"platform\": ").count(), 2);
    }

    #[tokio::test]
    async fn test_analyze_with_provider() {
        let provider = ScriptedProvider::new(
            AnalysisSource::Gemini,
            "```json\n{\"summary\": \"Video wins\", \"recommendations\": [\"More reels\"]}\n```",
        );
        let analyst = AiAnalyst::new(provider.clone(), 50);
        let analysis = analyst
            .analyze(&sample_posts(3), &column_names(&[]))
            .await
            .unwrap();
        assert_eq!(analysis.source, AnalysisSource::Gemini);
        assert_eq!(analysis.model.as_deref(), Some("scripted-model"));
        assert_eq!(analysis.summary, "Video wins");
        assert_eq!(analysis.recommendations, vec!["More reels".to_string()]);
        assert!(provider.last_prompt().contains("first 3 rows"));
    }

    #[tokio::test]
    async fn test_analyze_empty_data() {
        let provider = ScriptedProvider::new(AnalysisSource::OpenRouter, "{}");
        let analyst = AiAnalyst::new(provider.clone(), 50);
        let err = analyst.analyze(&[], &column_names(&[])).await.unwrap_err();
        assert!(matches!(err, AiError::EmptyData));
        assert!(provider.last_prompt().is_empty());
    }

    #[tokio::test]
    async fn test_chart_insights() {
        let provider = ScriptedProvider::new(
            AnalysisSource::OpenRouter,
            r#"{"insights": ["Instagram leads", "TikTok grows"]}"#,
        );
        let analyst = AiAnalyst::new(provider.clone(), 50);
        let panel = ChartPanel::build(ChartKind::PlatformEngagements, &sample_posts(4));
        let insights = analyst.chart_insights(&panel).await.unwrap();
        assert_eq!(insights, vec!["Instagram leads", "TikTok grows"]);
        assert!(provider.last_prompt().contains(&panel.title));
    }
}
