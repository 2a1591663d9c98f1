//! Domain types for dependency tracking and updates
//!
//! - [`Ecosystem`] / [`DependencyKind`]: how dependencies are classified
//! - [`DependencyDescriptor`] / [`DependencyCatalog`]: the static catalog
//! - [`DependencyState`]: what a probe observed
//! - [`UpdateCandidate`]: an available update with a confidence grade
//! - [`UpdateResult`] / [`BatchSummary`]: batch-update outcomes
//! - [`UpdateConfig`]: the update policy

mod candidate;
mod config;
mod descriptor;
mod ecosystem;
mod state;
mod update_result;

pub use candidate::{Confidence, UpdateCandidate};
pub use config::UpdateConfig;
pub use descriptor::{DependencyCatalog, DependencyDescriptor};
pub use ecosystem::{DependencyKind, Ecosystem};
pub use state::{DependencyState, InstallMethod};
pub use update_result::{BatchSummary, UpdateResult};
