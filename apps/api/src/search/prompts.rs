// Prompt constants for the job searcher.

/// System prompt for job search. JSON mode cannot be forced while the web
/// search tool is enabled, so the output is parsed leniently.
pub const JOB_SEARCH_SYSTEM: &str = "You are a job search assistant with web search access. \
    Find real, currently open job postings that match the user's query. \
    Respond with a JSON array only.";

/// Job search prompt template.
/// Replace: {query}, {location}, {page_size}, {offset}, {no_fabrication}
pub const JOB_SEARCH_PROMPT_TEMPLATE: &str = r#"Search the web for job postings.

Role / keywords: {query}
Location: {location}

Return exactly {page_size} postings, skipping the first {offset} results you would
otherwise list for this search (this is page {page_number} of the results).
If fewer postings exist, return as many as you found.

{no_fabrication}

Return a JSON ARRAY with this EXACT schema:
[
  {
    "id": "stable-unique-id-for-this-posting",
    "title": "Senior Backend Engineer",
    "company": "Acme Corp",
    "location": "Berlin, Germany (Hybrid)",
    "description": "Two or three sentence summary of the role and its requirements",
    "url": "https://link-to-the-posting",
    "posted_date": "2025-01-15"
  }
]"#;
