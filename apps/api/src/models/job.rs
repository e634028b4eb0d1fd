use serde::{de, Deserialize, Deserializer, Serialize};

/// Placeholder text shown for a job whose recommendation is in flight.
pub const ANALYZING_PLACEHOLDER: &str = "Analyzing fit...";

/// A single posting returned by the search service. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub posted_date: Option<String>,
}

/// Fit assessment for one job, keyed by `Job::id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecommendation {
    pub id: String,
    /// 0 – 100. Fractional or out-of-range numbers are rounded and clamped.
    #[serde(deserialize_with = "deserialize_score")]
    pub match_score: u32,
    pub recommendation: String,
}

fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(de::Error::custom("match_score must be a finite number"));
    }
    Ok(raw.round().clamp(0.0, 100.0) as u32)
}

/// Fit state of a job in the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Fit {
    NotAnalyzed,
    Analyzing { recommendation: &'static str },
    Analyzed { match_score: u32, recommendation: String },
}

impl Fit {
    pub fn analyzing() -> Self {
        Fit::Analyzing {
            recommendation: ANALYZING_PLACEHOLDER,
        }
    }
}

/// A job together with its current fit state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobWithRecommendation {
    #[serde(flatten)]
    pub job: Job,
    pub fit: Fit,
}

impl JobWithRecommendation {
    pub fn unscored(job: Job) -> Self {
        Self {
            job,
            fit: Fit::NotAnalyzed,
        }
    }
}

/// Citation backing a page of search results. Identity is the `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSource {
    pub uri: String,
    pub title: String,
}

/// One page returned by the search service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub jobs: Vec<Job>,
    pub sources: Vec<SearchSource>,
}

/// The query/location pair of the current search, kept for pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    pub query: String,
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> Job {
        Job {
            id: "j1".to_string(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Berlin".to_string(),
            description: "Rust services".to_string(),
            url: "https://acme.example/jobs/1".to_string(),
            posted_date: None,
        }
    }

    #[test]
    fn test_analyzing_fit_serializes_placeholder() {
        let value = serde_json::to_value(JobWithRecommendation {
            job: job(),
            fit: Fit::analyzing(),
        })
        .unwrap();
        assert_eq!(value["fit"]["state"], "analyzing");
        assert_eq!(value["fit"]["recommendation"], ANALYZING_PLACEHOLDER);
        assert_eq!(value["title"], "Backend Engineer");
    }

    #[test]
    fn test_analyzed_fit_serializes_score() {
        let entry = JobWithRecommendation {
            job: job(),
            fit: Fit::Analyzed {
                match_score: 72,
                recommendation: "Good match".to_string(),
            },
        };
        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(
            value["fit"],
            json!({"state": "analyzed", "match_score": 72, "recommendation": "Good match"})
        );
    }

    #[test]
    fn test_job_posted_date_is_optional() {
        let parsed: Job = serde_json::from_value(json!({
            "id": "x",
            "title": "t",
            "company": "c",
            "location": "l",
            "description": "d",
            "url": "u"
        }))
        .unwrap();
        assert!(parsed.posted_date.is_none());
    }

    #[test]
    fn test_fractional_scores_are_rounded_and_clamped() {
        let parsed: Vec<JobRecommendation> = serde_json::from_str(
            r#"[
                {"id": "a", "match_score": 78.5, "recommendation": "Apply"},
                {"id": "b", "match_score": 60, "recommendation": "Maybe"},
                {"id": "c", "match_score": 120.2, "recommendation": "Yes"},
                {"id": "d", "match_score": -3, "recommendation": "No"}
            ]"#,
        )
        .unwrap();

        let scores: Vec<u32> = parsed.iter().map(|r| r.match_score).collect();
        assert_eq!(scores, vec![79, 60, 100, 0]);
    }

    #[test]
    fn test_non_numeric_score_is_rejected() {
        let parsed = serde_json::from_value::<JobRecommendation>(json!({
            "id": "a",
            "match_score": "high",
            "recommendation": "Apply"
        }));
        assert!(parsed.is_err());
    }
}
