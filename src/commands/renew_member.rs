use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::{
    domain::{Member, Renewal},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
};

/// Extend a membership by one year and issue a new card number
pub struct RenewMemberRequest {
    pub id: String,
    /// Expiration currently shown for the member
    pub current_expiration: Option<DateTime<Utc>>,
}

impl<M, C, F> Service<RenewMemberRequest> for DomainLogic<M, C, F>
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

    fn call(&mut self, req: RenewMemberRequest) -> Self::Future {
        let members = self.members.clone();
        let renewal = Renewal::new(req.current_expiration, Utc::now(), &mut rand::thread_rng());
        Box::pin(async move {
            tracing::info!(
                id = %req.id,
                expiration = %renewal.expiration_date,
                "renewing membership"
            );
            let member = members
                .update_member(&req.id, renewal.into_update())
                .await?;
            Ok(member)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::testing::{admin, members_only},
        domain::MemberUpdate,
        ports::member::MockMemberPort,
    };
    use chrono::{Duration, Months};
    use speculoos::prelude::*;
    use std::sync::{Arc, Mutex};
    use tower::{BoxError, ServiceExt};

    #[tokio::test]
    async fn test_renew_sends_renewal() -> Result<(), BoxError> {
        let current = Utc::now() + Duration::days(30);
        let expected = current.checked_add_months(Months::new(12));
        let mut members = MockMemberPort::new();
        members
            .expect_update_member()
            .times(1)
            .withf(move |id, details| {
                id == "3"
                    && details.expiration_date == expected
                    && details.is_active == Some(true)
                    && details.card_number.as_ref().is_some_and(|n| n.len() == 8)
                    && details.name.is_none()
            })
            .returning(|_, _| Ok(None));
        let domain = members_only(members, admin());

        let res = domain
            .clone()
            .oneshot(RenewMemberRequest {
                id: "3".to_string(),
                current_expiration: Some(current),
            })
            .await;

        assert_that!(res).is_ok();
        Ok(())
    }

    #[tokio::test]
    async fn test_lapsed_membership_renews_from_now() -> Result<(), BoxError> {
        let sent: Arc<Mutex<Option<MemberUpdate>>> = Arc::default();
        let mut members = MockMemberPort::new();
        let captured = sent.clone();
        members
            .expect_update_member()
            .times(1)
            .returning(move |_, details| {
                *captured.lock().unwrap() = Some(details);
                Ok(None)
            });
        let domain = members_only(members, admin());

        let before = Utc::now();
        domain
            .clone()
            .oneshot(RenewMemberRequest {
                id: "3".to_string(),
                current_expiration: Some(before - Duration::days(400)),
            })
            .await?;
        let after = Utc::now();

        let expiration = sent.lock().unwrap().take().and_then(|d| d.expiration_date);
        assert_that!(expiration).is_some().matches(|expiration| {
            Some(*expiration) >= before.checked_add_months(Months::new(12))
                && Some(*expiration) <= after.checked_add_months(Months::new(12))
        });
        Ok(())
    }
}
