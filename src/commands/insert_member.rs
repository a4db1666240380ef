use std::task::{Context, Poll};

use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::{
    domain::{Member, MemberInsert},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
};

pub struct InsertMemberRequest {
    pub details: MemberInsert,
}

impl<M, C, F> Service<InsertMemberRequest> for DomainLogic<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    type Response = Option<Member>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: InsertMemberRequest) -> Self::Future {
        let members = self.members.clone();
        Box::pin(async move {
            if let Some(field) = req.details.missing_field() {
                return Err(Error::Validation(format!("{field} is required").into()));
            }
            let member = members.insert_member(req.details.without_blanks()).await?;
            tracing::info!(id = member.as_ref().map(|m| m.id.as_str()), "member inserted");
            Ok(member)
        })
    }
}
