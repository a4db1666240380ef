use std::task::{Context, Poll};

use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::{
    domain::{Member, MemberUpdate},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
};

pub struct UpdateMemberRequest {
    pub id: String,
    pub details: MemberUpdate,
}

impl<M, C, F> Service<UpdateMemberRequest> for DomainLogic<M, C, F>
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

    fn call(&mut self, req: UpdateMemberRequest) -> Self::Future {
        let members = self.members.clone();
        Box::pin(async move {
            let member = members
                .update_member(&req.id, req.details.without_blanks())
                .await?;
            tracing::info!(id = %req.id, "member updated");
            Ok(member)
        })
    }
}
