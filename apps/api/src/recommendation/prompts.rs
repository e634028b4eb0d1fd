// Prompt constants for the LLM recommender.

/// System prompt for fit recommendations. Sets the recruiter persona; the
/// JSON-only rules come in through `{json_only}` in the template.
pub const RECOMMEND_SYSTEM: &str = "You are an experienced technical recruiter and career coach. \
    You assess how well a candidate's resume fits each job posting.";

/// Recommendation prompt template.
/// Replace: {json_only}, {resume_text}, {jobs_json}
pub const RECOMMEND_PROMPT_TEMPLATE: &str = r#"{json_only}

CANDIDATE RESUME:
{resume_text}

JOB POSTINGS (JSON):
{jobs_json}

For EVERY posting above, assess the candidate's fit. Return a JSON ARRAY with one
object per posting, using the posting's exact "id":
[
  {
    "id": "the-exact-id-from-the-posting",
    "match_score": 78,
    "recommendation": "Two or three sentences: the strongest matching qualifications, the most important gaps, and whether to apply."
  }
]

RULES:
1. `match_score` is an integer from 0 to 100
2. Base the assessment ONLY on the resume and the posting text — do not assume unstated experience
3. Be specific: name the skills or experience that match or are missing
4. Include every posting exactly once"#;
