//! Job search — pluggable, trait-based searcher returning one page of postings.
//!
//! Default: `LlmJobSearcher` (LLM with the web search server tool).
//! `AppState` holds an `Arc<dyn JobSearcher>`.

pub mod prompts;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::llm_client::prompts::NO_FABRICATION_INSTRUCTION;
use crate::llm_client::{extract_json_array, LlmClient, LlmError, LlmResponse};
use crate::models::job::{Job, SearchPage, SearchSource};
use crate::search::prompts::{JOB_SEARCH_PROMPT_TEMPLATE, JOB_SEARCH_SYSTEM};

/// Number of postings requested per page. A page shorter than this is
/// taken to be the last one.
pub const PAGE_SIZE: usize = 6;

/// Upper bound on web searches the model may run for one page.
const MAX_WEB_SEARCHES: u32 = 5;

/// Failure of an external service call (search or recommendation).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// The job search trait. Implement this to swap search backends without
/// touching the session controller or handlers.
#[async_trait]
pub trait JobSearcher: Send + Sync {
    async fn search_jobs(
        &self,
        query: &str,
        location: &str,
        offset: usize,
    ) -> Result<SearchPage, ServiceError>;
}

/// Searches postings through the LLM with web search enabled.
pub struct LlmJobSearcher(pub LlmClient);

/// Job as emitted by the model: every field is optional so a single sloppy
/// posting does not fail the whole page.
#[derive(Debug, Deserialize)]
struct RawJob {
    id: Option<String>,
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    description: Option<String>,
    url: Option<String>,
    posted_date: Option<String>,
}

#[async_trait]
impl JobSearcher for LlmJobSearcher {
    async fn search_jobs(
        &self,
        query: &str,
        location: &str,
        offset: usize,
    ) -> Result<SearchPage, ServiceError> {
        let prompt = build_search_prompt(query, location, offset);
        let response = self
            .0
            .call_with_web_search(&prompt, JOB_SEARCH_SYSTEM, MAX_WEB_SEARCHES)
            .await?;

        let page = parse_search_response(&response)?;
        info!(
            "Search '{}' in '{}' at offset {}: {} jobs, {} sources",
            query,
            location,
            offset,
            page.jobs.len(),
            page.sources.len()
        );
        Ok(page)
    }
}

fn build_search_prompt(query: &str, location: &str, offset: usize) -> String {
    let query = if query.trim().is_empty() { "any role" } else { query };
    let location = if location.trim().is_empty() { "anywhere" } else { location };

    JOB_SEARCH_PROMPT_TEMPLATE
        .replace("{query}", query)
        .replace("{location}", location)
        .replace("{page_size}", &PAGE_SIZE.to_string())
        .replace("{offset}", &offset.to_string())
        .replace("{page_number}", &(offset / PAGE_SIZE + 1).to_string())
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
}

fn parse_search_response(response: &LlmResponse) -> Result<SearchPage, ServiceError> {
    let text = response.joined_text().ok_or(LlmError::EmptyContent)?;
    let array = extract_json_array(&text).ok_or_else(|| {
        ServiceError::InvalidResponse("search response contained no job list".to_string())
    })?;
    let raw: Vec<RawJob> = serde_json::from_str(array).map_err(LlmError::Parse)?;

    let jobs: Vec<Job> = raw
        .into_iter()
        .filter_map(into_job)
        .take(PAGE_SIZE)
        .collect();

    let sources = response
        .citations()
        .into_iter()
        .filter_map(|c| {
            let uri = c.url.clone()?;
            let title = c.title.clone().unwrap_or_else(|| uri.clone());
            Some(SearchSource { uri, title })
        })
        .collect();

    Ok(SearchPage { jobs, sources })
}

/// Normalizes a model-emitted posting. Postings without a title are dropped;
/// a missing id is replaced by a fresh one.
fn into_job(raw: RawJob) -> Option<Job> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let id = raw
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if raw.url.is_none() {
        debug!("Posting '{}' has no url", title);
    }

    Some(Job {
        id,
        title,
        company: raw.company.unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        url: raw.url.unwrap_or_default(),
        posted_date: raw.posted_date.filter(|d| !d.trim().is_empty()),
    })
}

/// Guarantees unique job ids within a page. The model sometimes reuses
/// ids like "1", "2" across pages, so the session re-keys clashes too.
pub fn ensure_unique_ids(jobs: &mut [Job], taken: &HashSet<String>) {
    let mut seen: HashSet<String> = taken.clone();
    for job in jobs.iter_mut() {
        if !seen.insert(job.id.clone()) {
            job.id = Uuid::new_v4().to_string();
            seen.insert(job.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(text: &str, citations: serde_json::Value) -> LlmResponse {
        serde_json::from_value(json!({
            "content": [{"type": "text", "text": text, "citations": citations}],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }))
        .unwrap()
    }

    #[test]
    fn test_search_prompt_carries_offset_and_page() {
        let prompt = build_search_prompt("rust engineer", "Berlin", 12);
        assert!(prompt.contains("Role / keywords: rust engineer"));
        assert!(prompt.contains("Location: Berlin"));
        assert!(prompt.contains("skipping the first 12"));
        assert!(prompt.contains("page 3"));
        assert!(prompt.contains("exactly 6 postings"));
    }

    #[test]
    fn test_search_prompt_fills_empty_location() {
        let prompt = build_search_prompt("designer", "", 0);
        assert!(prompt.contains("Location: anywhere"));
    }

    #[test]
    fn test_parse_search_response_jobs_and_sources() {
        let text = r#"Found these: [
            {"id": "a", "title": "Rust Dev", "company": "Acme", "location": "Remote",
             "description": "Build things", "url": "https://acme.example/a", "posted_date": "2025-02-01"},
            {"title": "Go Dev"}
        ]"#;
        let page = parse_search_response(&response(
            text,
            json!([{"type": "web_search_result_location", "url": "https://board.example", "title": "Board"}]),
        ))
        .unwrap();

        assert_eq!(page.jobs.len(), 2);
        assert_eq!(page.jobs[0].id, "a");
        assert_eq!(page.jobs[0].posted_date.as_deref(), Some("2025-02-01"));
        assert!(!page.jobs[1].id.is_empty());
        assert_eq!(page.sources.len(), 1);
        assert_eq!(page.sources[0].uri, "https://board.example");
    }

    #[test]
    fn test_parse_search_response_drops_untitled_and_caps_page() {
        let mut items: Vec<serde_json::Value> =
            (0..8).map(|i| json!({"id": i.to_string(), "title": format!("Job {i}")})).collect();
        items.push(json!({"id": "x", "title": "  "}));
        let text = serde_json::to_string(&items).unwrap();

        let page = parse_search_response(&response(&text, json!(null))).unwrap();
        assert_eq!(page.jobs.len(), PAGE_SIZE);
        assert!(page.sources.is_empty());
    }

    #[test]
    fn test_parse_search_response_without_array_is_invalid() {
        let err = parse_search_response(&response("Sorry, nothing found.", json!(null))).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[test]
    fn test_ensure_unique_ids_rekeys_clashes() {
        let job = |id: &str| Job {
            id: id.to_string(),
            title: "t".to_string(),
            company: String::new(),
            location: String::new(),
            description: String::new(),
            url: String::new(),
            posted_date: None,
        };
        let mut jobs = vec![job("1"), job("2"), job("2")];
        let taken: HashSet<String> = ["1".to_string()].into_iter().collect();
        ensure_unique_ids(&mut jobs, &taken);

        assert_ne!(jobs[0].id, "1");
        assert_eq!(jobs[1].id, "2");
        assert_ne!(jobs[2].id, "2");
        let ids: HashSet<&String> = jobs.iter().map(|j| &j.id).collect();
        assert_eq!(ids.len(), 3);
    }
}
