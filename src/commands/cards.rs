use std::task::{Context, Poll};

use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::{
    domain::{CardFilter, CardNumber, CardStats},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
};

/// One page of the card inventory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListCardsRequest {
    pub filter: CardFilter,
    pub page: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardStatsRequest;

impl<M, C, F> Service<ListCardsRequest> for DomainLogic<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    type Response = Vec<CardNumber>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListCardsRequest) -> Self::Future {
        let cards = self.cards.clone();
        let allowed = self.session.roles().can_view_cards();
        Box::pin(async move {
            if !allowed {
                return Err(Error::Forbidden);
            }
            Ok(cards.list_cards(req.filter, req.page).await?)
        })
    }
}

impl<M, C, F> Service<CardStatsRequest> for DomainLogic<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    type Response = CardStats;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: CardStatsRequest) -> Self::Future {
        let cards = self.cards.clone();
        let allowed = self.session.roles().can_view_cards();
        Box::pin(async move {
            if !allowed {
                return Err(Error::Forbidden);
            }
            let available = cards.total_available().await?;
            Ok(CardStats { available })
        })
    }
}
