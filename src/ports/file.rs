use crate::domain::SpreadsheetFile;

#[mockall::automock]
#[async_trait::async_trait]
pub trait FilePort: Send + Sync {
    async fn upload_file(&self, file: SpreadsheetFile) -> Result<(), Error>;
    async fn fetch_file(&self, file_name: &str, is_generic: bool) -> Result<Vec<u8>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("PDF not found. The admission form may not have been generated yet.")]
    NotFound(String),

    #[error("{0}")]
    Rejected(String),

    /// Concrete adapter errors
    #[error("adapter error: {0}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
