use crate::domain::{Member, MemberInsert, MemberListing, MemberUpdate, SearchTerms};

#[mockall::automock]
#[async_trait::async_trait]
pub trait MemberPort: Send + Sync {
    /// One page of a listing endpoint, zero-based
    async fn list_members(&self, listing: MemberListing, page: u32) -> Result<Vec<Member>, Error>;
    async fn search_members(
        &self,
        terms: SearchTerms,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Member>, Error>;
    /// Returns the stored member when the backend echoes it back
    async fn insert_member(&self, details: MemberInsert) -> Result<Option<Member>, Error>;
    async fn update_member(&self, id: &str, details: MemberUpdate)
        -> Result<Option<Member>, Error>;
    /// Flag the member as deleted, the row is kept
    async fn soft_delete_member(&self, id: &str) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No member with this id
    #[error("member {0} does not exist")]
    MemberDoesNotExist(String),

    /// The backend refused the operation and explained why
    ///
    /// Business rules are only enforced by the backend, the message is shown as is.
    #[error("{0}")]
    Rejected(String),

    /// Failures of the concrete adapter
    ///
    /// Anything the backend did not explain itself, e.g. an unreachable host or a body that does
    /// not match the schema.
    #[error("adapter error: {0}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
