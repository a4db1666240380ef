//! Card inventory queries: the paged list and the periodically refreshed availability count.

use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tower::ServiceExt;

use super::{
    cache::{QueryCache, QueryKey},
    pages::{Fetched, SharedPages},
};
use crate::{
    commands::{CardStatsRequest, DomainLogic, Error, ListCardsRequest},
    domain::{CardFilter, CardNumber, CardStats},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct CardsKey {
    filter: CardFilter,
    epoch: u64,
}

/// Infinite card inventory query
///
/// Same accumulation rules as the members table: a short page ends the list, changing the filter
/// or invalidating [`QueryKey::Cards`] starts over.
pub struct CardsQuery<M, C, F> {
    logic: DomainLogic<M, C, F>,
    cache: QueryCache,
    pages: SharedPages<CardsKey, CardNumber>,
}

impl<M, C, F> CardsQuery<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    pub fn new(logic: DomainLogic<M, C, F>, cache: QueryCache, page_size: u32) -> Self {
        let key = CardsKey {
            filter: CardFilter::default(),
            epoch: cache.epoch(QueryKey::Cards),
        };
        Self {
            logic,
            cache,
            pages: SharedPages::new(key, page_size.max(1) as usize),
        }
    }

    pub fn set_filter(&self, filter: CardFilter) {
        if self.pages.key().filter != filter {
            self.pages.reset(CardsKey {
                filter,
                epoch: self.cache.epoch(QueryKey::Cards),
            });
        }
    }

    pub fn cards(&self) -> Vec<CardNumber> {
        self.pages.read(|_, query| query.items().cloned().collect())
    }

    pub fn has_next_page(&self) -> bool {
        self.pages.read(|_, query| query.has_next_page())
    }

    /// Load the first page unless already loaded for the current epoch
    pub async fn load(&self) -> Result<Vec<CardNumber>, Error> {
        let key = self.pages.key();
        let epoch = self.cache.epoch(QueryKey::Cards);
        if key.epoch != epoch {
            self.pages.reset(CardsKey { epoch, ..key });
        }
        if !self.pages.read(|_, query| query.is_fetched()) {
            self.fetch_page().await?;
        }
        Ok(self.cards())
    }

    pub async fn fetch_next_page(&self) -> Result<Vec<CardNumber>, Error> {
        self.fetch_page().await?;
        Ok(self.cards())
    }

    async fn fetch_page(&self) -> Result<Fetched, Error> {
        let logic = self.logic.clone();
        self.pages
            .fetch_next(|key: CardsKey, page| {
                logic.oneshot(ListCardsRequest {
                    filter: key.filter,
                    page,
                })
            })
            .await
    }
}

/// Background refresh of [`CardStats`]
///
/// Fetches right away, then on every tick and whenever [`QueryKey::CardStats`] is invalidated.
/// A failed refresh keeps the last known value. The task stops when the poller is dropped.
pub struct CardStatsPoller {
    stats: watch::Receiver<Option<CardStats>>,
    task: JoinHandle<()>,
}

impl CardStatsPoller {
    /// Start polling, or `None` when the session may not see the inventory
    pub fn spawn<M, C, F>(
        logic: DomainLogic<M, C, F>,
        cache: &QueryCache,
        period: Duration,
    ) -> Option<Self>
    where
        M: MemberPort + 'static,
        C: CardPort + 'static,
        F: FilePort + 'static,
    {
        if !logic.session().roles().can_view_cards() {
            return None;
        }
        let (tx, stats) = watch::channel(None);
        let mut invalidated = cache.subscribe(QueryKey::CardStats);
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticks.tick() => {}
                    changed = invalidated.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
                match logic.clone().oneshot(CardStatsRequest).await {
                    Ok(fresh) => {
                        if tx.send(Some(fresh)).is_err() {
                            return;
                        }
                    }
                    Err(err) => tracing::warn!(%err, "failed to refresh card stats"),
                }
            }
        });
        Some(Self { stats, task })
    }

    /// Last known stats, `None` until the first successful fetch
    pub fn current(&self) -> Option<CardStats> {
        *self.stats.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CardStats>> {
        self.stats.clone()
    }
}

impl Drop for CardStatsPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
