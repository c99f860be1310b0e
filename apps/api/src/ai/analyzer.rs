//! CandidateAnalyzer — trait seam over the AI backend.
//!
//! The pipeline and handlers depend on this trait, not on `LlmClient`, so the
//! orchestration logic is testable with a stub backend. Carried in `AppState`
//! as `Arc<dyn CandidateAnalyzer>`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::ai::client::{LlmClient, LlmError};
use crate::ai::prompts::{
    OUTREACH_PROMPT_TEMPLATE, OUTREACH_SYSTEM, PROFILE_PROMPT_TEMPLATE, PROFILE_SYSTEM,
    SCORE_PROMPT_TEMPLATE, SCORE_SYSTEM,
};
use crate::errors::{AppError, StageError};
use crate::models::candidate::{Candidate, MatchResult, ResumeProfile};

/// Skills beyond this are dropped at parse time — the list is display-capped.
const MAX_SKILLS: usize = 5;

#[async_trait]
pub trait CandidateAnalyzer: Send + Sync {
    /// Structured extraction: resume text in, profile out. A malformed or
    /// unparseable backend response is a `StageError::Parsing`.
    async fn parse_resume(&self, resume_text: &str) -> Result<ResumeProfile, StageError>;

    /// Structured scoring: job description + profile in, validated
    /// `MatchResult` out. A missing or out-of-[0,100] score is a
    /// `StageError::Scoring`, never silently coerced to a real-looking zero.
    async fn score_match(
        &self,
        job_description: &str,
        profile: &ResumeProfile,
    ) -> Result<MatchResult, StageError>;

    /// Free-form outreach email. Invoked on demand, outside the batch
    /// pipeline; failures propagate to the caller with no fallback record.
    async fn draft_outreach(
        &self,
        candidate: &Candidate,
        job_description: &str,
    ) -> Result<String, AppError>;
}

/// Raw scoring payload as the backend returns it, before validation.
#[derive(Debug, Deserialize)]
struct ScorePayload {
    score: Option<i64>,
    #[serde(default)]
    justification: String,
}

/// Validates the raw backend score into a `MatchResult`. Absence of a usable
/// score is a scoring failure for that file — "scored zero" and "scoring
/// failed" must stay distinguishable downstream.
fn validate_score(payload: ScorePayload) -> Result<MatchResult, StageError> {
    match payload.score {
        Some(s @ 0..=100) => Ok(MatchResult {
            score: s as u8,
            justification: payload.justification,
        }),
        Some(s) => Err(StageError::Scoring(format!(
            "backend returned score {s}, outside [0, 100]"
        ))),
        None => Err(StageError::Scoring(
            "backend response had no score field".to_string(),
        )),
    }
}

/// Trims profile fields and applies the skills display cap.
fn normalize_profile(mut profile: ResumeProfile) -> ResumeProfile {
    profile.name = profile.name.trim().to_string();
    profile.email = profile.email.trim().to_string();
    profile.summary = profile.summary.trim().to_string();
    profile.skills.retain(|s| !s.trim().is_empty());
    profile.skills.truncate(MAX_SKILLS);
    profile
}

/// The production analyzer: every operation is one `LlmClient` call.
#[derive(Clone)]
pub struct LlmAnalyzer {
    llm: LlmClient,
}

impl LlmAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CandidateAnalyzer for LlmAnalyzer {
    async fn parse_resume(&self, resume_text: &str) -> Result<ResumeProfile, StageError> {
        let prompt = PROFILE_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
        let profile: ResumeProfile = self
            .llm
            .complete_json(&prompt, PROFILE_SYSTEM)
            .await
            .map_err(|e| StageError::Parsing(e.to_string()))?;
        Ok(normalize_profile(profile))
    }

    async fn score_match(
        &self,
        job_description: &str,
        profile: &ResumeProfile,
    ) -> Result<MatchResult, StageError> {
        let prompt = SCORE_PROMPT_TEMPLATE
            .replace("{job_description}", job_description)
            .replace("{candidate_summary}", &profile.summary)
            .replace("{candidate_skills}", &profile.skills.join(", "));

        let payload: ScorePayload = self
            .llm
            .complete_json(&prompt, SCORE_SYSTEM)
            .await
            .map_err(|e| StageError::Scoring(e.to_string()))?;

        validate_score(payload)
    }

    async fn draft_outreach(
        &self,
        candidate: &Candidate,
        job_description: &str,
    ) -> Result<String, AppError> {
        let prompt = OUTREACH_PROMPT_TEMPLATE
            .replace("{candidate_name}", &candidate.name)
            .replace("{candidate_summary}", &candidate.summary)
            .replace("{job_description}", job_description);

        let email = self
            .llm
            .complete(&prompt, OUTREACH_SYSTEM)
            .await
            .map_err(|e: LlmError| AppError::Drafting(e.to_string()))?;

        Ok(email.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_payload_in_range_validates() {
        let payload: ScorePayload =
            serde_json::from_str(r#"{"score": 88, "justification": "Strong match"}"#).unwrap();
        let result = validate_score(payload).unwrap();
        assert_eq!(result.score, 88);
        assert_eq!(result.justification, "Strong match");
    }

    #[test]
    fn test_score_boundaries_are_inclusive() {
        for raw in [0, 100] {
            let result = validate_score(ScorePayload {
                score: Some(raw),
                justification: String::new(),
            })
            .unwrap();
            assert_eq!(result.score as i64, raw);
        }
    }

    #[test]
    fn test_out_of_range_score_is_scoring_error() {
        for raw in [-1, 101, 1000] {
            let err = validate_score(ScorePayload {
                score: Some(raw),
                justification: String::new(),
            })
            .unwrap_err();
            assert!(matches!(err, StageError::Scoring(_)), "score {raw}");
        }
    }

    #[test]
    fn test_missing_score_is_scoring_error_not_zero() {
        let payload: ScorePayload =
            serde_json::from_str(r#"{"justification": "looks fine"}"#).unwrap();
        let err = validate_score(payload).unwrap_err();
        assert!(matches!(err, StageError::Scoring(_)));
    }

    #[test]
    fn test_profile_fixture_deserializes() {
        // Shape the PROFILE prompt declares.
        let json = r#"{
            "name": "Grace Hopper",
            "email": "grace@navy.mil",
            "summary": "Systems engineer and compiler pioneer.",
            "skills": ["COBOL", "Compilers", "Leadership"]
        }"#;
        let profile: ResumeProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name, "Grace Hopper");
        assert_eq!(profile.skills.len(), 3);
    }

    #[test]
    fn test_normalize_caps_skills_at_five() {
        let profile = normalize_profile(ResumeProfile {
            name: "  Ada  ".to_string(),
            email: String::new(),
            summary: String::new(),
            skills: (1..=8).map(|i| format!("skill{i}")).collect(),
        });
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.skills.len(), 5);
        assert_eq!(profile.skills[0], "skill1");
    }

    #[test]
    fn test_normalize_drops_blank_skills() {
        let profile = normalize_profile(ResumeProfile {
            skills: vec!["Rust".to_string(), "  ".to_string(), String::new()],
            ..Default::default()
        });
        assert_eq!(profile.skills, vec!["Rust".to_string()]);
    }
}
