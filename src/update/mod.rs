//! Update pipeline: audit, candidate detection, policy filtering, batch
//! execution

mod audit;
mod batch;
mod checker;
mod filter;

pub use audit::SecurityAuditor;
pub use batch::BatchUpdater;
pub use checker::UpdateChecker;
pub use filter::{CandidateFilter, SkipReason};
