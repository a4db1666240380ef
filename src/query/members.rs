//! Members table query: search or listing, page accumulation and status filtering.

use tokio::sync::watch;
use tower::ServiceExt;

use super::{
    cache::{QueryCache, QueryKey},
    pages::{Fetched, SharedPages},
};
use crate::{
    commands::{DomainLogic, Error, FetchMembersRequest},
    domain::{MemberRow, SearchTerms, StatusFilter},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
    session::MemberAccess,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct MembersKey {
    /// Debounced search input, `None` until the user typed something
    query: Option<String>,
    filter: StatusFilter,
    /// Cache epoch the pages were loaded under
    epoch: u64,
}

impl MembersKey {
    fn has_terms(&self) -> bool {
        self.query.as_deref().and_then(SearchTerms::parse).is_some()
    }
}

/// What the members table shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MembersView {
    Rows(Vec<MemberRow>),
    /// Restricted sessions see nothing until they search
    SearchToBegin,
    /// The session may not read members at all
    Unauthorized,
}

impl MembersView {
    pub fn rows(&self) -> &[MemberRow] {
        match self {
            MembersView::Rows(rows) => rows,
            _ => &[],
        }
    }
}

/// Infinite members query
///
/// Pages are accumulated in memory and annotated with their status. The `expired` filter is
/// applied to the accumulated rows, every other filter is served by the backend. Changing the
/// search or the filter, or invalidating [`QueryKey::Members`], starts over from the first page
/// and discards responses still in flight.
pub struct MembersQuery<M, C, F> {
    logic: DomainLogic<M, C, F>,
    cache: QueryCache,
    page_size: u32,
    pages: SharedPages<MembersKey, MemberRow>,
}

impl<M, C, F> MembersQuery<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    pub fn new(logic: DomainLogic<M, C, F>, cache: QueryCache, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let key = MembersKey {
            epoch: cache.epoch(QueryKey::Members),
            ..Default::default()
        };
        Self {
            logic,
            cache,
            page_size,
            pages: SharedPages::new(key, page_size as usize),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Set the debounced search input
    pub fn set_search(&self, query: Option<String>) {
        let key = self.pages.key();
        if key.query != query {
            self.restart(MembersKey { query, ..key });
        }
    }

    /// Follow a debounced search input, e.g. [`Debouncer::subscribe`](super::Debouncer::subscribe)
    ///
    /// Every settled value restarts the query and loads its first screen. Load failures are
    /// logged and the previous rows are dropped. Returns once the input is closed.
    pub async fn follow(&self, mut search: watch::Receiver<Option<String>>) {
        while search.changed().await.is_ok() {
            let query = search.borrow_and_update().clone();
            self.set_search(query);
            if let Err(err) = self.load().await {
                tracing::warn!(%err, "members search failed");
            }
        }
    }

    pub fn set_filter(&self, filter: StatusFilter) {
        let key = self.pages.key();
        if key.filter != filter {
            self.restart(MembersKey { filter, ..key });
        }
    }

    fn restart(&self, key: MembersKey) {
        let key = MembersKey {
            epoch: self.cache.epoch(QueryKey::Members),
            ..key
        };
        let generation = self.pages.reset(key);
        tracing::debug!(generation, "members query restarted");
    }

    fn access(&self, key: &MembersKey) -> Option<MembersView> {
        match self.logic.session().roles().member_access() {
            MemberAccess::Full => None,
            MemberAccess::SearchOnly if key.has_terms() => None,
            MemberAccess::SearchOnly => Some(MembersView::SearchToBegin),
            MemberAccess::None => Some(MembersView::Unauthorized),
        }
    }

    /// Rows fetched so far, after the local part of the filter
    pub fn view(&self) -> MembersView {
        self.pages.read(|key, query| match self.access(key) {
            Some(view) => view,
            None => MembersView::Rows(
                query
                    .items()
                    .filter(|row| key.filter.retains(row))
                    .cloned()
                    .collect(),
            ),
        })
    }

    pub fn has_next_page(&self) -> bool {
        self.pages.read(|_, query| query.has_next_page())
    }

    /// Load the first page if needed and fill the first screen
    pub async fn load(&self) -> Result<MembersView, Error> {
        let key = self.pages.key();
        if let Some(view) = self.access(&key) {
            return Ok(view);
        }
        if key.epoch != self.cache.epoch(QueryKey::Members) {
            self.restart(key);
        }
        self.fill().await?;
        Ok(self.view())
    }

    /// Fetch one more page, e.g. when scrolled to the bottom
    pub async fn fetch_next_page(&self) -> Result<MembersView, Error> {
        let key = self.pages.key();
        if let Some(view) = self.access(&key) {
            return Ok(view);
        }
        if self.fetch_page().await? == Fetched::Applied {
            self.fill().await?;
        }
        Ok(self.view())
    }

    /// Keep fetching while fewer rows than a page are visible and more pages exist
    async fn fill(&self) -> Result<(), Error> {
        loop {
            let (fetched, visible, has_next) = self.pages.read(|key, query| {
                let visible = query.items().filter(|row| key.filter.retains(row)).count();
                (query.is_fetched(), visible, query.has_next_page())
            });
            if fetched && (visible >= self.page_size as usize || !has_next) {
                return Ok(());
            }
            if self.fetch_page().await? != Fetched::Applied {
                return Ok(());
            }
        }
    }

    async fn fetch_page(&self) -> Result<Fetched, Error> {
        let logic = self.logic.clone();
        let page_size = self.page_size;
        self.pages
            .fetch_next(|key: MembersKey, page| {
                logic.oneshot(FetchMembersRequest {
                    query: key.query,
                    filter: key.filter,
                    page,
                    page_size,
                })
            })
            .await
    }
}
