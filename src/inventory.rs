//! Dependency inventory service
//!
//! Owns the catalog and a TTL-bounded cache of probe results. Probing
//! the full catalog runs bounded-parallel; single probes are served from
//! cache while fresh.

use crate::command::CommandRunner;
use crate::domain::{
    DependencyCatalog, DependencyDescriptor, DependencyKind, DependencyState, Ecosystem,
};
use crate::error::ProbeError;
use crate::manifest;
use crate::probe::probe_for_kind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// How many probes run at once during a full scan
const PROBE_CONCURRENCY: usize = 8;

/// Default freshness window for cached probe results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Catalog plus cached probe results for one project root
pub struct DependencyInventory {
    catalog: DependencyCatalog,
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    cache_ttl: Duration,
    states: HashMap<String, DependencyState>,
}

impl DependencyInventory {
    /// Creates an inventory over a catalog and project root
    pub fn new(
        catalog: DependencyCatalog,
        runner: Arc<dyn CommandRunner>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            runner,
            root: root.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            states: HashMap::new(),
        }
    }

    /// Overrides the cache freshness window (builder pattern)
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Returns the catalog
    pub fn catalog(&self) -> &DependencyCatalog {
        &self.catalog
    }

    /// Returns the cached states gathered so far
    pub fn states(&self) -> &HashMap<String, DependencyState> {
        &self.states
    }

    /// Discovers manifest-declared dependencies and merges them into the
    /// catalog as non-critical entries
    ///
    /// Returns how many new entries the scan added. Static catalog
    /// entries always win over discovered ones.
    pub fn discover(&mut self) -> usize {
        let mut added = 0;
        for dep in manifest::discover_dependencies(&self.root) {
            let kind = match dep.ecosystem {
                Ecosystem::Python => DependencyKind::LanguagePackage,
                Ecosystem::Node => DependencyKind::PackageManagerLocal,
            };
            let descriptor = DependencyDescriptor::new(dep.name, kind, dep.ecosystem);
            if self.catalog.merge(descriptor) {
                added += 1;
            }
        }
        if added > 0 {
            info!(added, "discovered manifest dependencies");
        }
        added
    }

    /// Probes one dependency, returning a cached state while fresh
    pub async fn probe(&mut self, name: &str) -> Result<DependencyState, ProbeError> {
        if let Some(cached) = self.states.get(name) {
            if cached.age().to_std().unwrap_or(Duration::MAX) < self.cache_ttl {
                debug!(name, "serving probe result from cache");
                return Ok(cached.clone());
            }
        }
        let descriptor = self
            .catalog
            .get(name)
            .ok_or_else(|| ProbeError::unknown(name))?
            .clone();
        let state = run_probe(&descriptor, self.runner.clone(), &self.root).await;
        self.states.insert(name.to_string(), state.clone());
        Ok(state)
    }

    /// Probes every catalog entry, bounded-parallel, refreshing the cache
    pub async fn probe_all(&mut self) -> HashMap<String, DependencyState> {
        let semaphore = Arc::new(Semaphore::new(PROBE_CONCURRENCY));
        let mut set = JoinSet::new();

        for descriptor in self.catalog.iter() {
            let descriptor = descriptor.clone();
            let runner = self.runner.clone();
            let root = self.root.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                // Closed only when the semaphore is dropped, which cannot
                // happen while tasks hold a clone
                let _permit = semaphore.acquire().await.expect("semaphore open");
                let state = run_probe(&descriptor, runner, &root).await;
                (descriptor.name, state)
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Ok((name, state)) = joined {
                self.states.insert(name, state);
            }
        }
        info!(count = self.states.len(), "probed dependency catalog");
        self.states.clone()
    }

    /// Drops all cached states so the next probe hits the system again
    pub fn refresh(&mut self) {
        self.states.clear();
    }
}

async fn run_probe(
    descriptor: &DependencyDescriptor,
    runner: Arc<dyn CommandRunner>,
    root: &Path,
) -> DependencyState {
    let probe = probe_for_kind(descriptor.kind, runner, root);
    probe.probe(descriptor).await
}
