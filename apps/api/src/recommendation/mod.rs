//! Fit recommendations — pluggable, trait-based recommender that assesses a
//! resume against a page of jobs.
//!
//! Default: `LlmRecommender` (one JSON-mode LLM call per page).
//! Offline: `KeywordRecommender` (pure-Rust, deterministic, fully testable).
//!
//! `AppState` holds an `Arc<dyn Recommender>`, chosen at startup via `RECOMMENDER`.

pub mod keyword;
pub mod prompts;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_RULES;
use crate::llm_client::LlmClient;
use crate::models::job::{Job, JobRecommendation};
use crate::recommendation::prompts::{RECOMMEND_PROMPT_TEMPLATE, RECOMMEND_SYSTEM};
use crate::search::ServiceError;

pub use keyword::KeywordRecommender;

/// The recommender trait. Results are keyed by `Job::id`; callers join by id
/// and must not rely on ordering. A job may be missing from the result.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(
        &self,
        resume_text: &str,
        jobs: &[Job],
    ) -> Result<Vec<JobRecommendation>, ServiceError>;
}

/// Semantic recommender via Claude.
pub struct LlmRecommender(pub LlmClient);

/// Subset of a job sent to the model. The url and date add tokens without
/// informing fit.
#[derive(Serialize)]
struct JobForPrompt<'a> {
    id: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    description: &'a str,
}

#[async_trait]
impl Recommender for LlmRecommender {
    async fn recommend(
        &self,
        resume_text: &str,
        jobs: &[Job],
    ) -> Result<Vec<JobRecommendation>, ServiceError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_recommend_prompt(resume_text, jobs)?;
        let recommendations: Vec<JobRecommendation> =
            self.0.call_json(&prompt, RECOMMEND_SYSTEM).await?;

        let recommendations = normalize(recommendations, jobs);
        info!(
            "LLM recommendations: {}/{} jobs scored",
            recommendations.len(),
            jobs.len()
        );
        Ok(recommendations)
    }
}

fn build_recommend_prompt(resume_text: &str, jobs: &[Job]) -> Result<String, ServiceError> {
    let for_prompt: Vec<JobForPrompt<'_>> = jobs
        .iter()
        .map(|j| JobForPrompt {
            id: &j.id,
            title: &j.title,
            company: &j.company,
            location: &j.location,
            description: &j.description,
        })
        .collect();
    let jobs_json = serde_json::to_string_pretty(&for_prompt)
        .map_err(|e| ServiceError::InvalidResponse(format!("failed to encode jobs: {e}")))?;

    Ok(RECOMMEND_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_RULES)
        .replace("{jobs_json}", &jobs_json)
        .replace("{resume_text}", resume_text.trim()))
}

/// Drops recommendations for unknown ids and clamps scores to 0–100.
fn normalize(recommendations: Vec<JobRecommendation>, jobs: &[Job]) -> Vec<JobRecommendation> {
    recommendations
        .into_iter()
        .filter(|r| {
            let known = jobs.iter().any(|j| j.id == r.id);
            if !known {
                warn!("Dropping recommendation for unknown job id '{}'", r.id);
            }
            known
        })
        .map(|mut r| {
            r.match_score = r.match_score.min(100);
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            title: "Platform Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            description: "Kubernetes and Rust".to_string(),
            url: "https://acme.example".to_string(),
            posted_date: None,
        }
    }

    #[test]
    fn test_recommend_prompt_includes_resume_and_ids() {
        let prompt = build_recommend_prompt("  Ten years of Rust.  ", &[job("a1"), job("b2")]).unwrap();
        assert!(prompt.contains("Ten years of Rust."));
        assert!(prompt.contains("\"id\": \"a1\""));
        assert!(prompt.contains("\"id\": \"b2\""));
        assert!(!prompt.contains("https://acme.example"));
        assert!(prompt.contains("valid JSON only"));
    }

    #[test]
    fn test_normalize_drops_unknown_ids_and_clamps() {
        let recs = vec![
            JobRecommendation {
                id: "a1".to_string(),
                match_score: 140,
                recommendation: "Apply".to_string(),
            },
            JobRecommendation {
                id: "zz".to_string(),
                match_score: 50,
                recommendation: "?".to_string(),
            },
        ];
        let out = normalize(recs, &[job("a1")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].match_score, 100);
    }
}
