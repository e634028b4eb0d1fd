//! Keyword recommender — offline fit scoring by keyword overlap between a
//! posting and the resume.
//!
//! Algorithm:
//! 1. Extract keywords from the posting: title terms weigh 1.0, description
//!    terms 0.6. A term seen in both keeps the higher weight; repeats in the
//!    description add 0.1 each up to 1.0.
//! 2. A keyword matches when it appears as a term of the resume.
//! 3. match_score = Σ(weight of matched) / Σ(weight) × 100
//! 4. The recommendation text names the top matches and the top gaps.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use crate::models::job::{Job, JobRecommendation};
use crate::recommendation::Recommender;
use crate::search::ServiceError;

const TITLE_WEIGHT: f32 = 1.0;
const DESCRIPTION_WEIGHT: f32 = 0.6;
const REPEAT_BONUS: f32 = 0.1;
const MIN_TERM_LEN: usize = 2;

const STOPWORDS: &[&str] = &[
    "and", "the", "for", "with", "you", "our", "are", "will", "your", "who", "have", "has",
    "from", "this", "that", "into", "their", "they", "them", "not", "but", "all", "any", "can",
    "was", "were", "been", "being", "its", "per", "via", "etc", "about", "also", "more",
    "than", "such", "other", "able", "work", "working", "join", "team", "role", "job", "must",
    "should", "would", "could", "plus", "years", "year", "experience", "strong", "good", "great",
    "new", "well", "who", "what", "where", "when", "how", "why", "on", "in", "of", "to", "a",
    "an", "or", "as", "at", "by", "is", "be", "we", "us", "if", "so", "do", "no",
];

/// Pure-Rust keyword-overlap recommender. Fast, deterministic, no LLM call.
pub struct KeywordRecommender;

#[async_trait]
impl Recommender for KeywordRecommender {
    async fn recommend(
        &self,
        resume_text: &str,
        jobs: &[Job],
    ) -> Result<Vec<JobRecommendation>, ServiceError> {
        let resume_terms: HashSet<String> = tokenize(resume_text).collect();
        Ok(jobs
            .iter()
            .map(|job| score_job(job, &resume_terms))
            .collect())
    }
}

/// Lowercased alphanumeric terms. `+`, `#` and `.` are kept inside terms so
/// "c++", "c#" and "node.js" survive.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| t.chars().count() >= MIN_TERM_LEN && !STOPWORDS.contains(&t.as_str()))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
}

/// Keyword inventory of a posting, ordered by term for deterministic output.
fn keyword_inventory(job: &Job) -> BTreeMap<String, f32> {
    let mut inventory: BTreeMap<String, f32> = BTreeMap::new();

    for term in tokenize(&job.title) {
        inventory.insert(term, TITLE_WEIGHT);
    }
    for term in tokenize(&job.description) {
        inventory
            .entry(term)
            .and_modify(|w| *w = (*w + REPEAT_BONUS).min(TITLE_WEIGHT))
            .or_insert(DESCRIPTION_WEIGHT);
    }
    inventory
}

fn score_job(job: &Job, resume_terms: &HashSet<String>) -> JobRecommendation {
    let inventory = keyword_inventory(job);

    let mut matched: Vec<(&str, f32)> = Vec::new();
    let mut gaps: Vec<(&str, f32)> = Vec::new();
    let mut total_weight = 0.0_f32;
    let mut matched_weight = 0.0_f32;

    for (term, weight) in &inventory {
        total_weight += weight;
        if resume_terms.contains(term) {
            matched_weight += weight;
            matched.push((term.as_str(), *weight));
        } else {
            gaps.push((term.as_str(), *weight));
        }
    }

    let match_score = if total_weight > 0.0 {
        ((matched_weight / total_weight) * 100.0).round() as u32
    } else {
        0
    };

    // Heaviest terms first; the BTreeMap order breaks ties alphabetically.
    matched.sort_by(|a, b| b.1.total_cmp(&a.1));
    gaps.sort_by(|a, b| b.1.total_cmp(&a.1));

    JobRecommendation {
        id: job.id.clone(),
        match_score,
        recommendation: build_recommendation(
            match_score,
            inventory.is_empty(),
            &top_terms(&matched),
            &top_terms(&gaps),
        ),
    }
}

fn top_terms<'a>(terms: &[(&'a str, f32)]) -> Vec<&'a str> {
    terms.iter().take(3).map(|(t, _)| *t).collect()
}

/// Builds a human-readable recommendation from score, matches and gaps.
fn build_recommendation(score: u32, no_keywords: bool, matches: &[&str], gaps: &[&str]) -> String {
    if no_keywords {
        return "The posting has too little detail to assess fit.".to_string();
    }

    let strengths = if matches.is_empty() {
        String::new()
    } else {
        format!(" Matches: {}.", matches.join(", "))
    };
    let missing = if gaps.is_empty() {
        String::new()
    } else {
        format!(" Missing: {}.", gaps.join(", "))
    };

    if score >= 70 {
        format!("Strong fit ({score}/100).{strengths}{missing} Worth applying.")
    } else if score >= 40 {
        format!("Moderate fit ({score}/100).{strengths}{missing} Tailor your resume before applying.")
    } else {
        format!("Low fit ({score}/100).{strengths}{missing}")
    }
}
