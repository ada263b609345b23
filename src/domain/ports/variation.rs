//! Variation source port: the similarity/variation collaborator boundary.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Proposes derived variations of an idea after it has been evaluated.
///
/// The collaborator creates the new ideas itself (and any `SUBIDEA_OF`
/// edges); the core consumes the returned ids as opaque strings. Newly
/// proposed ideas start untested, so the untested-first selection rule
/// picks them up in later iterations.
#[async_trait]
pub trait VariationSource: Send + Sync {
    async fn propose(&self, idea_id: &str) -> DomainResult<Vec<String>>;
}

/// No-op variation source, the default wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVariationSource;

#[async_trait]
impl VariationSource for NullVariationSource {
    async fn propose(&self, _idea_id: &str) -> DomainResult<Vec<String>> {
        Ok(Vec::new())
    }
}
