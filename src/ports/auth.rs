/// Source of bearer tokens issued by the identity provider
#[mockall::automock]
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("user not authenticated")]
    NotAuthenticated,

    #[error("adapter error: {0}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
