use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use crate::session::Session;

pub mod cards;
pub mod delete_member;
pub mod fetch_members;
pub mod import_cards;
pub mod insert_member;
pub mod member_pdf;
pub mod renew_member;
pub mod update_member;

pub use cards::{CardStatsRequest, ListCardsRequest};
pub use delete_member::DeleteMemberRequest;
pub use fetch_members::FetchMembersRequest;
pub use import_cards::ImportCardsRequest;
pub use insert_member::InsertMemberRequest;
pub use member_pdf::FetchPdfRequest;
pub use renew_member::RenewMemberRequest;
pub use update_member::UpdateMemberRequest;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

/// Operations of the console, one [`tower::Service`] implementation per request type
pub struct DomainLogic<M, C, F> {
    members: Arc<M>,
    cards: Arc<C>,
    files: Arc<F>,
    session: Session,
}

impl<M, C, F> DomainLogic<M, C, F> {
    pub fn new(members: M, cards: C, files: F, session: Session) -> Self {
        Self {
            members: Arc::new(members),
            cards: Arc::new(cards),
            files: Arc::new(files),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl<M, C, F> Clone for DomainLogic<M, C, F> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
            cards: self.cards.clone(),
            files: self.files.clone(),
            session: self.session.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("member port error: {0}")]
    Member(#[from] crate::ports::member::Error),
    #[error("card port error: {0}")]
    Card(#[from] crate::ports::card::Error),
    #[error("file port error: {0}")]
    File(#[from] crate::ports::file::Error),

    /// The session roles do not allow this operation
    #[error("operation not allowed for this session")]
    Forbidden,

    /// Client-side validation failure, nothing was sent
    #[error("invalid input: {0}")]
    Validation(Cow<'static, str>),
}

impl Error {
    /// Message suitable for a notification
    ///
    /// Messages coming from the backend are shown without the port prefix.
    pub fn user_message(&self) -> String {
        use crate::ports::{card, file, member};
        match self {
            Error::Member(member::Error::Rejected(message))
            | Error::Card(card::Error::Rejected(message))
            | Error::File(file::Error::Rejected(message)) => message.clone(),
            Error::File(err @ file::Error::NotFound(_)) => err.to_string(),
            Error::Validation(message) => message.to_string(),
            err => err.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for command tests

    use super::*;
    use crate::{
        ports::{
            auth::MockTokenSource, card::MockCardPort, file::MockFilePort,
            member::MockMemberPort,
        },
        session::RoleSet,
    };

    pub fn session(roles: RoleSet) -> Session {
        let mut tokens = MockTokenSource::new();
        tokens
            .expect_access_token()
            .returning(|| Ok("token".to_string()));
        Session::new(Arc::new(tokens), roles)
    }

    pub fn admin() -> RoleSet {
        RoleSet {
            admin: true,
            staff: false,
        }
    }

    pub fn staff() -> RoleSet {
        RoleSet {
            admin: false,
            staff: true,
        }
    }

    pub fn logic(
        members: MockMemberPort,
        cards: MockCardPort,
        files: MockFilePort,
        roles: RoleSet,
    ) -> DomainLogic<MockMemberPort, MockCardPort, MockFilePort> {
        DomainLogic::new(members, cards, files, session(roles))
    }

    pub fn members_only(
        members: MockMemberPort,
        roles: RoleSet,
    ) -> DomainLogic<MockMemberPort, MockCardPort, MockFilePort> {
        logic(members, MockCardPort::new(), MockFilePort::new(), roles)
    }
}
