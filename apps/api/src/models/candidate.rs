use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StageError;

/// Score shown for candidates whose processing failed. Failed candidates are
/// distinguished by `status == Error`, never by this value alone.
pub const FAILED_SCORE_SENTINEL: u8 = 0;

/// One uploaded resume file, as received from the client. Immutable once
/// selected; consumed exactly once by a screening run.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content: Bytes,
    /// Declared media type, from the multipart part (or extension fallback).
    pub media_type: String,
}

/// Structured profile extracted from a resume by the AI backend.
///
/// Every field defaults: the backend may omit anything, and a partially empty
/// profile is still a valid parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Validated output of the match-scoring call. `score` is an opaque external
/// judgment in [0, 100] — the pipeline ranks by it but never recomputes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: u8,
    pub justification: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    /// Default for successfully processed candidates.
    New,
    /// Assigned only at creation time, when a pipeline stage failed for this
    /// file. There is no transition into or out of this state.
    Error,
    /// The user confirmed an outreach email was sent. Terminal.
    Contacted,
}

/// Batch progress for the active run. Absent entirely (not zeroed) when no
/// run is active, so consumers can tell "idle" from "running, 0 done".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub processed: usize,
    pub total: usize,
}

/// The merged record driving the candidate list: profile + match result +
/// status. Exactly one exists per uploaded document, failures included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Derived from filename + processing timestamp (+ ordinal), so duplicate
    /// filenames — even ones finishing in the same millisecond — stay unique.
    pub id: String,
    pub filename: String,
    /// Position in the original upload list. Secondary sort key when scores
    /// tie, making the ranking deterministic regardless of which concurrent
    /// task finished first.
    pub ordinal: usize,
    pub name: String,
    pub email: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub score: u8,
    pub justification: String,
    pub status: CandidateStatus,
    pub processed_at: DateTime<Utc>,
}

impl Candidate {
    /// Builds a successfully processed candidate from its pipeline outputs.
    pub fn scored(
        filename: &str,
        ordinal: usize,
        profile: ResumeProfile,
        result: MatchResult,
    ) -> Self {
        let processed_at = Utc::now();
        Candidate {
            id: derive_id(filename, ordinal, processed_at),
            filename: filename.to_string(),
            ordinal,
            name: profile.name,
            email: profile.email,
            summary: profile.summary,
            skills: profile.skills,
            score: result.score,
            justification: result.justification,
            status: CandidateStatus::New,
            processed_at,
        }
    }

    /// Builds the `Error`-status candidate synthesized when any stage fails
    /// for this file: sentinel score, the error message as justification,
    /// empty skills.
    pub fn failed(filename: &str, ordinal: usize, message: String) -> Self {
        let processed_at = Utc::now();
        Candidate {
            id: derive_id(filename, ordinal, processed_at),
            filename: filename.to_string(),
            ordinal,
            name: String::new(),
            email: String::new(),
            summary: String::new(),
            skills: Vec::new(),
            score: FAILED_SCORE_SENTINEL,
            justification: message,
            status: CandidateStatus::Error,
            processed_at,
        }
    }

    pub fn from_stage_error(filename: &str, ordinal: usize, error: &StageError) -> Self {
        Self::failed(filename, ordinal, error.to_string())
    }
}

fn derive_id(filename: &str, ordinal: usize, at: DateTime<Utc>) -> String {
    format!("{}-{}-{}", filename, at.timestamp_millis(), ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> ResumeProfile {
        ResumeProfile {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            summary: "Backend engineer, 8 years of Go and distributed systems".to_string(),
            skills: vec!["Go".to_string(), "Kubernetes".to_string()],
        }
    }

    #[test]
    fn test_scored_candidate_merges_profile_and_result() {
        let candidate = Candidate::scored(
            "ada.pdf",
            2,
            sample_profile(),
            MatchResult {
                score: 87,
                justification: "Strong distributed systems background".to_string(),
            },
        );

        assert_eq!(candidate.filename, "ada.pdf");
        assert_eq!(candidate.ordinal, 2);
        assert_eq!(candidate.name, "Ada Lovelace");
        assert_eq!(candidate.score, 87);
        assert_eq!(candidate.status, CandidateStatus::New);
    }

    #[test]
    fn test_failed_candidate_forces_sentinel_and_empty_skills() {
        let err = StageError::Extraction("corrupt PDF".to_string());
        let candidate = Candidate::from_stage_error("broken.pdf", 0, &err);

        assert_eq!(candidate.status, CandidateStatus::Error);
        assert_eq!(candidate.score, FAILED_SCORE_SENTINEL);
        assert!(candidate.skills.is_empty());
        assert_eq!(candidate.justification, "Text extraction failed: corrupt PDF");
    }

    #[test]
    fn test_ids_unique_for_duplicate_filenames() {
        // Two files with the same name can finish within the same millisecond
        // inside one concurrent batch; the ordinal keeps their ids distinct.
        let a = Candidate::failed("resume.pdf", 0, "x".to_string());
        let b = Candidate::failed("resume.pdf", 1, "x".to_string());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_profile_deserializes_with_missing_fields() {
        let profile: ResumeProfile = serde_json::from_str(r#"{"name": "Bob"}"#).unwrap();
        assert_eq!(profile.name, "Bob");
        assert!(profile.email.is_empty());
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CandidateStatus::Contacted).unwrap(),
            r#""contacted""#
        );
        let status: CandidateStatus = serde_json::from_str(r#""error""#).unwrap();
        assert_eq!(status, CandidateStatus::Error);
    }
}
