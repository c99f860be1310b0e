//! Candidate Store — in-memory ordered collection of candidate records.
//!
//! Owns the status state machine, the sort invariant (descending score,
//! ascending upload ordinal on ties), and the progress lifecycle. Mutations
//! happen under an internal lock and are synchronous and short; the lock is
//! never held across an await point.
//!
//! Every batch merge is announced on a broadcast channel so a push-based
//! consumer (or the tests) can observe incremental results without polling.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use tokio::sync::broadcast;
use tracing::info;

use crate::errors::AppError;
use crate::models::candidate::{Candidate, CandidateStatus, PipelineProgress};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Incremental pipeline notifications, emitted by the store as the
/// orchestrator drives it.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A batch finished and was merged; `candidates` are the new records.
    BatchCompleted {
        candidates: Vec<Candidate>,
        progress: PipelineProgress,
    },
    RunCompleted {
        total: usize,
    },
    RunFailed {
        message: String,
    },
}

#[derive(Default)]
struct StoreInner {
    candidates: Vec<Candidate>,
    /// `Some` exactly while a run is active. `Some { 0, total }` right after
    /// start is distinct from `None` (idle).
    progress: Option<PipelineProgress>,
    /// Job description of the current (or most recent) run, retained so
    /// outreach drafting works after the run ends.
    job_description: String,
    /// Run-level failure from the most recent run, if any.
    run_error: Option<String>,
}

pub struct CandidateStore {
    inner: RwLock<StoreInner>,
    events: broadcast::Sender<PipelineEvent>,
}

impl Default for CandidateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(StoreInner::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is fine; the HTTP surface polls instead.
        let _ = self.events.send(event);
    }

    /// Atomically checks the single-active-run precondition and resets state
    /// for a new run. On `Err(Conflict)` nothing is mutated.
    pub fn begin_run(&self, job_description: String, total: usize) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("candidate store lock poisoned");
        if inner.progress.is_some() {
            return Err(AppError::Conflict(
                "a screening run is already active".to_string(),
            ));
        }
        inner.candidates.clear();
        inner.run_error = None;
        inner.job_description = job_description;
        inner.progress = Some(PipelineProgress {
            processed: 0,
            total,
        });
        Ok(())
    }

    /// Merges one completed batch: append, re-sort the whole collection, and
    /// advance progress by the batch size. Fails if no run is active — the
    /// orchestrator treats that as a run-level inconsistency.
    pub fn merge_batch(&self, batch: Vec<Candidate>) -> Result<PipelineProgress> {
        let mut inner = self.inner.write().expect("candidate store lock poisoned");

        let progress = inner
            .progress
            .as_mut()
            .ok_or_else(|| anyhow!("batch merged with no active run"))?;
        progress.processed += batch.len();
        let progress = *progress;

        inner.candidates.extend(batch.iter().cloned());
        inner
            .candidates
            .sort_by(|a, b| b.score.cmp(&a.score).then(a.ordinal.cmp(&b.ordinal)));

        info!(
            "Merged batch of {} ({}/{} processed)",
            batch.len(),
            progress.processed,
            progress.total
        );

        drop(inner);
        self.emit(PipelineEvent::BatchCompleted {
            candidates: batch,
            progress,
        });
        Ok(progress)
    }

    /// Ends the run normally: progress becomes absent, candidates stay.
    pub fn finish_run(&self) {
        let total = {
            let mut inner = self.inner.write().expect("candidate store lock poisoned");
            let total = inner.progress.map(|p| p.total).unwrap_or_default();
            inner.progress = None;
            total
        };
        self.emit(PipelineEvent::RunCompleted { total });
    }

    /// Ends the run on a run-level error. Already-merged candidates remain
    /// visible; progress is cleared; the message is surfaced to readers.
    pub fn fail_run(&self, message: String) {
        {
            let mut inner = self.inner.write().expect("candidate store lock poisoned");
            inner.progress = None;
            inner.run_error = Some(message.clone());
        }
        self.emit(PipelineEvent::RunFailed { message });
    }

    /// Snapshot for the list endpoint: sorted candidates, progress (absent
    /// when idle), and any run-level error.
    pub fn snapshot(&self) -> (Vec<Candidate>, Option<PipelineProgress>, Option<String>) {
        let inner = self.inner.read().expect("candidate store lock poisoned");
        (
            inner.candidates.clone(),
            inner.progress,
            inner.run_error.clone(),
        )
    }

    /// Looks up a candidate for outreach drafting and returns it with the
    /// run's job description. Error-status candidates are not eligible.
    pub fn draft_context(&self, id: &str) -> Result<(Candidate, String), AppError> {
        let inner = self.inner.read().expect("candidate store lock poisoned");
        let candidate = inner
            .candidates
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;

        if candidate.status == CandidateStatus::Error {
            return Err(AppError::UnprocessableEntity(
                "candidate failed processing and is not eligible for outreach".to_string(),
            ));
        }

        Ok((candidate.clone(), inner.job_description.clone()))
    }

    /// `New → Contacted`, the only legal transition. All other fields are
    /// left untouched.
    pub fn mark_contacted(&self, id: &str) -> Result<Candidate, AppError> {
        let mut inner = self.inner.write().expect("candidate store lock poisoned");
        let candidate = inner
            .candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;

        match candidate.status {
            CandidateStatus::New => {
                candidate.status = CandidateStatus::Contacted;
                Ok(candidate.clone())
            }
            CandidateStatus::Error => Err(AppError::UnprocessableEntity(
                "candidate failed processing and is not eligible for outreach".to_string(),
            )),
            CandidateStatus::Contacted => Err(AppError::UnprocessableEntity(
                "candidate was already marked contacted".to_string(),
            )),
        }
    }

    /// Full pipeline reset — the only way candidates are deleted. Rejected
    /// while a run is active (no mid-run cancellation).
    pub fn reset(&self) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("candidate store lock poisoned");
        if inner.progress.is_some() {
            return Err(AppError::Conflict(
                "cannot reset while a screening run is active".to_string(),
            ));
        }
        inner.candidates.clear();
        inner.run_error = None;
        inner.job_description.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{MatchResult, ResumeProfile};

    fn scored(ordinal: usize, score: u8) -> Candidate {
        Candidate::scored(
            &format!("resume-{ordinal}.pdf"),
            ordinal,
            ResumeProfile::default(),
            MatchResult {
                score,
                justification: String::new(),
            },
        )
    }

    fn store_with_run(total: usize) -> CandidateStore {
        let store = CandidateStore::new();
        store.begin_run("Senior Backend Engineer".to_string(), total).unwrap();
        store
    }

    #[test]
    fn test_merge_sorts_descending_by_score() {
        let store = store_with_run(3);
        store.merge_batch(vec![scored(0, 40), scored(1, 90), scored(2, 70)]).unwrap();

        let (candidates, _, _) = store.snapshot();
        let scores: Vec<u8> = candidates.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![90, 70, 40]);
    }

    #[test]
    fn test_tied_scores_order_by_upload_ordinal() {
        let store = store_with_run(4);
        store.merge_batch(vec![scored(3, 50), scored(1, 50)]).unwrap();
        store.merge_batch(vec![scored(0, 50), scored(2, 80)]).unwrap();

        let (candidates, _, _) = store.snapshot();
        let ordinals: Vec<usize> = candidates.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_progress_advances_per_batch_and_clears_on_finish() {
        let store = store_with_run(5);
        let (_, progress, _) = store.snapshot();
        assert_eq!(progress, Some(PipelineProgress { processed: 0, total: 5 }));

        let p = store.merge_batch(vec![scored(0, 10), scored(1, 20), scored(2, 30)]).unwrap();
        assert_eq!(p.processed, 3);

        let p = store.merge_batch(vec![scored(3, 40), scored(4, 50)]).unwrap();
        assert_eq!(p.processed, 5);

        store.finish_run();
        let (candidates, progress, run_error) = store.snapshot();
        assert_eq!(progress, None);
        assert_eq!(candidates.len(), 5);
        assert!(run_error.is_none());
    }

    #[test]
    fn test_begin_run_while_active_is_conflict_without_mutation() {
        let store = store_with_run(2);
        store.merge_batch(vec![scored(0, 60)]).unwrap();

        let err = store.begin_run("Another role".to_string(), 9).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // The active run's state must be untouched.
        let (candidates, progress, _) = store.snapshot();
        assert_eq!(candidates.len(), 1);
        assert_eq!(progress, Some(PipelineProgress { processed: 1, total: 2 }));
    }

    #[test]
    fn test_merge_without_active_run_errors() {
        let store = CandidateStore::new();
        assert!(store.merge_batch(vec![scored(0, 10)]).is_err());
    }

    #[test]
    fn test_fail_run_preserves_merged_candidates() {
        let store = store_with_run(4);
        store.merge_batch(vec![scored(0, 70), scored(1, 30)]).unwrap();
        store.fail_run("backend unreachable".to_string());

        let (candidates, progress, run_error) = store.snapshot();
        assert_eq!(candidates.len(), 2);
        assert_eq!(progress, None);
        assert_eq!(run_error.as_deref(), Some("backend unreachable"));
    }

    #[test]
    fn test_mark_contacted_only_transitions_new() {
        let store = store_with_run(2);
        let failed = Candidate::failed("bad.pdf", 1, "boom".to_string());
        let failed_id = failed.id.clone();
        store.merge_batch(vec![scored(0, 80), failed]).unwrap();
        store.finish_run();

        let (candidates, _, _) = store.snapshot();
        let new_id = candidates.iter().find(|c| c.ordinal == 0).unwrap().id.clone();

        let updated = store.mark_contacted(&new_id).unwrap();
        assert_eq!(updated.status, CandidateStatus::Contacted);
        // Only the status changed.
        assert_eq!(updated.score, 80);
        assert_eq!(updated.ordinal, 0);

        // Contacted is terminal.
        let err = store.mark_contacted(&new_id).unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));

        // Error candidates are never eligible.
        let err = store.mark_contacted(&failed_id).unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));

        let err = store.mark_contacted("no-such-id").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_draft_context_rejects_error_candidates() {
        let store = store_with_run(2);
        let failed = Candidate::failed("bad.pdf", 1, "boom".to_string());
        let failed_id = failed.id.clone();
        store.merge_batch(vec![scored(0, 55), failed]).unwrap();
        store.finish_run();

        let (candidates, _, _) = store.snapshot();
        let ok_id = candidates.iter().find(|c| c.ordinal == 0).unwrap().id.clone();

        let (candidate, jd) = store.draft_context(&ok_id).unwrap();
        assert_eq!(candidate.score, 55);
        assert_eq!(jd, "Senior Backend Engineer");

        let err = store.draft_context(&failed_id).unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[test]
    fn test_reset_rejected_while_running_allowed_when_idle() {
        let store = store_with_run(1);
        assert!(matches!(store.reset().unwrap_err(), AppError::Conflict(_)));

        store.merge_batch(vec![scored(0, 10)]).unwrap();
        store.finish_run();
        store.reset().unwrap();

        let (candidates, progress, run_error) = store.snapshot();
        assert!(candidates.is_empty());
        assert_eq!(progress, None);
        assert!(run_error.is_none());
    }

    #[test]
    fn test_merge_emits_batch_completed_event() {
        let store = store_with_run(2);
        let mut events = store.subscribe();

        store.merge_batch(vec![scored(0, 90), scored(1, 10)]).unwrap();
        store.finish_run();

        match events.try_recv().unwrap() {
            PipelineEvent::BatchCompleted {
                candidates,
                progress,
            } => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(progress, PipelineProgress { processed: 2, total: 2 });
            }
            other => panic!("expected BatchCompleted, got {other:?}"),
        }
        assert!(matches!(
            events.try_recv().unwrap(),
            PipelineEvent::RunCompleted { total: 2 }
        ));
    }
}
