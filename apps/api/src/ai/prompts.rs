// All LLM prompt constants for the screening pipeline.

/// System prompt for resume profile extraction — enforces JSON-only output.
pub const PROFILE_SYSTEM: &str = "You are an expert technical recruiter. \
    Extract a structured candidate profile from raw resume text. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent facts not present in the resume.";

/// Profile extraction prompt template. Replace `{resume_text}` before sending.
pub const PROFILE_PROMPT_TEMPLATE: &str = r#"Extract a candidate profile from the resume below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "name": "Full name as written on the resume",
  "email": "Primary email address, or empty string if none",
  "summary": "2-3 sentence professional summary of the candidate",
  "skills": ["skill1", "skill2"]
}

Rules:
- "skills": at most 8 concise technical skills, most relevant first
- Use empty strings / empty arrays for anything the resume does not state
- All strings on a single line; replace internal newlines with spaces

RESUME:
{resume_text}"#;

/// System prompt for match scoring — enforces JSON-only output.
pub const SCORE_SYSTEM: &str = "You are a senior recruiter with deep technical expertise. \
    Judge how well a candidate fits a job description. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Match scoring prompt template.
/// Replace `{job_description}`, `{candidate_summary}`, `{candidate_skills}`.
pub const SCORE_PROMPT_TEMPLATE: &str = r#"Score the candidate below against the job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 75,
  "justification": "One short paragraph explaining the score"
}

Rules:
- "score" MUST be an integer between 0 and 100
- Judge skills and experience match, seniority, and overall fit for the role
- "justification" must be a single paragraph, no line breaks

JOB DESCRIPTION:
{job_description}

CANDIDATE SUMMARY:
{candidate_summary}

CANDIDATE SKILLS:
{candidate_skills}"#;

/// System prompt for outreach drafting — free text out, no schema.
pub const OUTREACH_SYSTEM: &str = "You are a recruiter writing a short, warm, professional \
    outreach email inviting a candidate to interview. Plain text only, no subject line, \
    no markdown, no placeholders left unfilled.";

/// Outreach email prompt template.
/// Replace `{candidate_name}`, `{candidate_summary}`, `{job_description}`.
pub const OUTREACH_PROMPT_TEMPLATE: &str = r#"Write a brief outreach email (under 150 words) to the candidate below about the role described. Mention one specific thing from their background that fits the role. Sign off as "The Hiring Team".

CANDIDATE NAME:
{candidate_name}

CANDIDATE BACKGROUND:
{candidate_summary}

JOB DESCRIPTION:
{job_description}"#;
