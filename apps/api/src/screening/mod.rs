// Candidate Processing Pipeline: store (ordering + status lifecycle),
// orchestrator (batched concurrent runs), and the HTTP handlers over both.

pub mod handlers;
pub mod pipeline;
pub mod store;
