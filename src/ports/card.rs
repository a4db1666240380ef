use crate::domain::{CardFilter, CardNumber};

#[mockall::automock]
#[async_trait::async_trait]
pub trait CardPort: Send + Sync {
    async fn total_available(&self) -> Result<u64, Error>;
    async fn list_cards(&self, filter: CardFilter, page: u32) -> Result<Vec<CardNumber>, Error>;
    /// Import card numbers from the most recently uploaded spreadsheet
    ///
    /// Returns the message reported by the backend, if any.
    async fn import_cards(&self) -> Result<Option<String>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Rejected(String),

    /// Concrete adapter errors
    #[error("adapter error: {0}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
