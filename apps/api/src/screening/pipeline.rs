//! Batch Orchestrator — drives extraction → parsing → scoring for every
//! uploaded file.
//!
//! Documents are processed in fixed-size batches: batches strictly in
//! sequence, documents within a batch concurrently on their own tasks. This
//! caps in-flight AI backend requests at `BATCH_SIZE` and gives the store a
//! merge point per batch — coarse enough to avoid update storms, fine enough
//! that partial results appear while the run is still going.
//!
//! Per-file failures are folded into `Error`-status candidates; they never
//! abort siblings, later batches, or the run.

use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::CandidateAnalyzer;
use crate::errors::AppError;
use crate::extraction::extract_text;
use crate::models::candidate::{Candidate, MatchResult, ResumeProfile, UploadedDocument};
use crate::screening::store::CandidateStore;

/// Documents processed concurrently per batch. Bounds concurrent load on the
/// AI backend while keeping wall-clock time for a full upload reasonable.
pub const BATCH_SIZE: usize = 5;

/// Validates preconditions, reserves the run on the store, and spawns the
/// batch loop. Returns the document count on acceptance; on any error nothing
/// has been mutated and no task is running.
pub fn start_run(
    store: Arc<CandidateStore>,
    analyzer: Arc<dyn CandidateAnalyzer>,
    job_description: String,
    documents: Vec<UploadedDocument>,
) -> Result<usize, AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job description must not be empty".to_string(),
        ));
    }
    if documents.is_empty() {
        return Err(AppError::Validation(
            "at least one resume must be uploaded".to_string(),
        ));
    }

    let total = documents.len();
    store.begin_run(job_description.clone(), total)?;

    info!("Screening run started: {total} documents, batch size {BATCH_SIZE}");
    tokio::spawn(async move {
        match drive_batches(&store, analyzer, &job_description, documents).await {
            Ok(()) => store.finish_run(),
            Err(e) => {
                warn!("Screening run failed: {e:#}");
                store.fail_run(e.to_string());
            }
        }
    });

    Ok(total)
}

/// The batch loop. Only store inconsistencies can fail it — per-file errors
/// are folded into candidates before they get here.
async fn drive_batches(
    store: &CandidateStore,
    analyzer: Arc<dyn CandidateAnalyzer>,
    job_description: &str,
    documents: Vec<UploadedDocument>,
) -> anyhow::Result<()> {
    let mut queue = documents.into_iter().enumerate().peekable();

    while queue.peek().is_some() {
        let batch: Vec<(usize, UploadedDocument)> = queue.by_ref().take(BATCH_SIZE).collect();

        // Spawn every document in the batch, then join them all in upload
        // order. Awaiting each handle collects successes and failures
        // uniformly — one task failing cancels nothing.
        let mut handles = Vec::with_capacity(batch.len());
        for (ordinal, document) in batch {
            let analyzer = Arc::clone(&analyzer);
            let jd = job_description.to_string();
            let filename = document.filename.clone();
            let handle =
                tokio::spawn(
                    async move { process_document(analyzer.as_ref(), &jd, document, ordinal).await },
                );
            handles.push((ordinal, filename, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (ordinal, filename, handle) in handles {
            let candidate = match handle.await {
                Ok(candidate) => candidate,
                // A panicked task still yields its Error candidate.
                Err(e) => {
                    warn!("Processing task for '{filename}' panicked: {e}");
                    Candidate::failed(&filename, ordinal, format!("processing task failed: {e}"))
                }
            };
            results.push(candidate);
        }

        store.merge_batch(results)?;
    }

    Ok(())
}

/// The per-file pipeline: Extract → Parse → Score, each stage starting only
/// after its predecessor succeeded. Any stage failure short-circuits the rest
/// and becomes this document's `Error`-status candidate.
async fn process_document(
    analyzer: &dyn CandidateAnalyzer,
    job_description: &str,
    document: UploadedDocument,
    ordinal: usize,
) -> Candidate {
    match run_stages(analyzer, job_description, &document).await {
        Ok((profile, result)) => Candidate::scored(&document.filename, ordinal, profile, result),
        Err(e) => {
            warn!("'{}' failed: {e}", document.filename);
            Candidate::from_stage_error(&document.filename, ordinal, &e)
        }
    }
}

async fn run_stages(
    analyzer: &dyn CandidateAnalyzer,
    job_description: &str,
    document: &UploadedDocument,
) -> Result<(ResumeProfile, MatchResult), crate::errors::StageError> {
    let text = extract_text(document)?;
    let profile = analyzer.parse_resume(&text).await?;
    let result = analyzer.score_match(job_description, &profile).await?;
    Ok((profile, result))
}
