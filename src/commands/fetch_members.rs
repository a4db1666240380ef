use std::task::{Context, Poll};

use chrono::Utc;
use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::{
    domain::{MemberRow, SearchTerms, StatusFilter},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
    session::MemberAccess,
};

/// One page of the members table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchMembersRequest {
    /// Free-text query, searches by name and surname when not blank
    pub query: Option<String>,
    /// Server-side part of the filter, ignored by text search
    pub filter: StatusFilter,
    /// Zero-based page index
    pub page: u32,
    pub page_size: u32,
}

impl<M, C, F> Service<FetchMembersRequest> for DomainLogic<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    /// Rows of the page, annotated with their status and in backend order
    ///
    /// The local part of the filter is not applied here: continuation relies on the raw page
    /// length.
    type Response = Vec<MemberRow>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FetchMembersRequest) -> Self::Future {
        let members = self.members.clone();
        let access = self.session.roles().member_access();
        Box::pin(async move {
            let terms = req.query.as_deref().and_then(SearchTerms::parse);
            let rows = match (terms, access) {
                (_, MemberAccess::None) => return Err(Error::Forbidden),
                (Some(terms), _) => {
                    tracing::debug!(?terms, page = req.page, "searching members");
                    members
                        .search_members(terms, req.page, req.page_size)
                        .await?
                }
                (None, MemberAccess::Full) => {
                    let listing = req.filter.listing();
                    tracing::debug!(?listing, page = req.page, "listing members");
                    members.list_members(listing, req.page).await?
                }
                // Restricted sessions have to search first
                (None, MemberAccess::SearchOnly) => return Err(Error::Forbidden),
            };

            let now = Utc::now();
            Ok(rows
                .into_iter()
                .map(|member| MemberRow::new(member, now))
                .collect())
        })
    }
}
