//! Mock data collaborators and the source registry.
//!
//! Each source is a synchronous lookup behind an async seam: the
//! contract is "valid JSON record or explicit error", nothing more.
//! Real venue databases or emissions APIs would slot in behind the
//! same [`FetchSource`] trait.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::models::session::EventContext;
use crate::Result;

pub mod policy;
pub mod transport;
pub mod venues;

/// A named data source the fan-out coordinator can invoke.
pub trait FetchSource: Send + Sync {
    /// Stable identifier used in task specs and fetch results.
    fn id(&self) -> &'static str;

    /// Produce a structured record for the given context and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Source`](crate::AppError::Source) when the
    /// lookup fails; the coordinator folds this into a partial result.
    fn fetch(
        &self,
        context: EventContext,
        params: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + 'static>>;
}

/// Registry of fetch sources keyed by id.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<&'static str, Arc<dyn FetchSource>>,
}

impl SourceRegistry {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its own id, replacing any previous entry.
    pub fn register(&mut self, source: Arc<dyn FetchSource>) {
        self.sources.insert(source.id(), source);
    }

    /// Look up a source by id.
    #[must_use]
    pub fn get(&self, source_id: &str) -> Option<Arc<dyn FetchSource>> {
        self.sources.get(source_id).map(Arc::clone)
    }

    /// Ids of all registered sources.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.sources.keys().copied().collect()
    }
}

/// Registry pre-loaded with the three mock collaborators.
#[must_use]
pub fn default_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(venues::GreenVenueSource));
    registry.register(Arc::new(transport::TransportEmissionsSource));
    registry.register(Arc::new(policy::CompanyPolicySource));
    registry
}
