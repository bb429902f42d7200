//! Background passages fetched before the model sees a question.

pub mod passages;
pub mod schema;

pub use passages::PassageStore;

use crate::error::RetrievalError;
use async_trait::async_trait;

/// Returns passages relevant to a query, best first.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RetrievalError>;
}

/// Retriever that never has anything to add.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

#[async_trait]
impl ContextRetriever for NoContext {
    async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<String>, RetrievalError> {
        Ok(Vec::new())
    }
}
