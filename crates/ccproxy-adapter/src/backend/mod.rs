//! Completion backend collaborator

pub mod openai;

use async_trait::async_trait;

use crate::error::BackendError;

/// A text-completion engine: prompt in, composed answer out
///
/// Implementations report partial text through `on_fragment` as it is
/// produced (any number of times, possibly never) and return the full
/// answer once generation is finished.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Run one completion
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
    ) -> Result<String, BackendError>;
}
