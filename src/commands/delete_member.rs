use std::task::{Context, Poll};

use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::ports::{card::CardPort, file::FilePort, member::MemberPort};

/// Soft delete: the member is flagged, not removed
pub struct DeleteMemberRequest {
    pub id: String,
}

impl<M, C, F> Service<DeleteMemberRequest> for DomainLogic<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    type Response = ();
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DeleteMemberRequest) -> Self::Future {
        let members = self.members.clone();
        Box::pin(async move {
            members.soft_delete_member(&req.id).await?;
            tracing::info!(id = %req.id, "member deleted");
            Ok(())
        })
    }
}
