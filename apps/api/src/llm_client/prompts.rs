// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_RULES: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps the model from inventing postings or companies.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Only report job postings you actually found. Never invent companies, \
    titles, URLs, or dates. If a field is unknown, use an empty string (or null for dates).";
