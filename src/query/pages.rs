use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Claim on the next page of an [`InfiniteQuery`]
///
/// Carries the generation it was issued under: once the query is reset, older tickets can no
/// longer append pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page: u32,
}

/// Append-only sequence of pages with a continuation cursor
///
/// A page shorter than the page size ends the sequence, whatever totals the backend reports.
#[derive(Debug)]
pub struct InfiniteQuery<T> {
    page_size: usize,
    pages: Vec<Vec<T>>,
    next_page: Option<u32>,
    generation: u64,
    in_flight: Option<PageTicket>,
}

impl<T> InfiniteQuery<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            pages: Vec::new(),
            next_page: Some(0),
            generation: 0,
            in_flight: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop every page and start over from page zero
    ///
    /// Responses to requests sent before the reset are discarded.
    pub fn reset(&mut self) -> u64 {
        self.generation += 1;
        self.pages.clear();
        self.next_page = Some(0);
        self.in_flight = None;
        self.generation
    }

    /// Claim the next page, unless there is none or it is already being fetched
    pub fn begin(&mut self) -> Option<PageTicket> {
        let ticket = PageTicket {
            generation: self.generation,
            page: self.next_page?,
        };
        if self.in_flight == Some(ticket) {
            return None;
        }
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Append a fetched page
    ///
    /// Returns `false` and drops the rows when the ticket is stale.
    pub fn apply(&mut self, ticket: PageTicket, rows: Vec<T>) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        self.next_page = (rows.len() == self.page_size).then_some(ticket.page + 1);
        self.pages.push(rows);
        true
    }

    /// Release a ticket whose request failed, so the page can be fetched again
    pub fn fail(&mut self, ticket: PageTicket) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn next_page(&self) -> Option<u32> {
        self.next_page
    }

    pub fn is_fetched(&self) -> bool {
        !self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Vec<T>] {
        &self.pages
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to a page fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fetched {
    /// The page was appended
    Applied,
    /// The query was reset while the request was in flight
    Stale,
    /// Nothing to fetch: no further page, or the page is already in flight
    Idle,
}

/// [`InfiniteQuery`] shared between concurrent callers, together with the key it was loaded for
///
/// The key and the pages are swapped under the same lock, so a request always runs with the key
/// of the generation it was issued under. The lock is never held across a request.
#[derive(Debug)]
pub struct SharedPages<K, T> {
    inner: Mutex<(K, InfiniteQuery<T>)>,
}

impl<K: Clone, T> SharedPages<K, T> {
    pub fn new(key: K, page_size: usize) -> Self {
        Self {
            inner: Mutex::new((key, InfiniteQuery::new(page_size))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, (K, InfiniteQuery<T>)> {
        // The state stays consistent between calls, a panic elsewhere does not corrupt it
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn key(&self) -> K {
        self.lock().0.clone()
    }

    /// Switch to `key` and drop every page fetched so far
    pub fn reset(&self, key: K) -> u64 {
        let mut guard = self.lock();
        guard.0 = key;
        guard.1.reset()
    }

    pub fn read<R>(&self, f: impl FnOnce(&K, &InfiniteQuery<T>) -> R) -> R {
        let guard = self.lock();
        f(&guard.0, &guard.1)
    }

    /// Fetch the next page with `fetch` and append it if still current
    pub async fn fetch_next<Fut, E>(
        &self,
        fetch: impl FnOnce(K, u32) -> Fut,
    ) -> Result<Fetched, E>
    where
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let claimed = {
            let mut guard = self.lock();
            let (key, query) = &mut *guard;
            query.begin().map(|ticket| (key.clone(), ticket))
        };
        let Some((key, ticket)) = claimed else {
            return Ok(Fetched::Idle);
        };
        match fetch(key, ticket.page).await {
            Ok(rows) => {
                if self.lock().1.apply(ticket, rows) {
                    Ok(Fetched::Applied)
                } else {
                    tracing::debug!(?ticket, "discarding stale page");
                    Ok(Fetched::Stale)
                }
            }
            Err(err) => {
                self.lock().1.fail(ticket);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case(20, Some(1))]
    #[case(19, None)]
    #[case(0, None)]
    fn test_continuation(#[case] rows: usize, #[case] expected: Option<u32>) {
        let mut query = InfiniteQuery::new(20);
        let ticket = query.begin().unwrap();

        assert_that!(query.apply(ticket, vec![(); rows])).is_true();
        assert_that!(query.next_page()).is_equal_to(expected);
    }

    #[test]
    fn test_stale_ticket_is_dropped() {
        let mut query = InfiniteQuery::new(2);
        let stale = query.begin().unwrap();
        query.reset();

        assert_that!(query.apply(stale, vec![1, 2])).is_false();
        assert_that!(query.is_fetched()).is_false();

        let fresh = query.begin().unwrap();
        assert_that!(fresh.generation).is_equal_to(1);
        assert_that!(query.apply(fresh, vec![3, 4])).is_true();
        assert_that!(query.items().copied().collect::<Vec<_>>()).is_equal_to(vec![3, 4]);
    }

    #[test]
    fn test_in_flight_page_is_not_requested_twice() {
        let mut query = InfiniteQuery::<u8>::new(2);
        let ticket = query.begin();
        assert_that!(ticket).is_some();
        assert_that!(query.begin()).is_none();

        query.fail(ticket.unwrap());
        assert_that!(query.begin()).is_equal_to(ticket);
    }

    #[test]
    fn test_pages_accumulate() {
        let mut query = InfiniteQuery::new(2);
        for rows in [vec![1, 2], vec![3, 4], vec![5]] {
            let ticket = query.begin().unwrap();
            query.apply(ticket, rows);
        }
        assert_that!(query.len()).is_equal_to(5);
        assert_that!(query.pages().len()).is_equal_to(3);
        assert_that!(query.has_next_page()).is_false();
        assert_that!(query.begin()).is_none();
    }

    #[tokio::test]
    async fn test_shared_fetch_next() {
        let pages = SharedPages::new("anna", 3);
        let res: Result<_, ()> = pages
            .fetch_next(|key, page| async move {
                assert_eq!(key, "anna");
                Ok(vec![page; 3])
            })
            .await;
        assert_that!(res).is_ok().is_equal_to(Fetched::Applied);

        let res: Result<_, &str> = pages.fetch_next(|_, _| async { Err("offline") }).await;
        assert_that!(res).is_err();
        // The failed page can be fetched again
        assert_that!(pages.read(|_, query| query.next_page())).is_equal_to(Some(1));

        pages.reset("rossi");
        assert_that!(pages.key()).is_equal_to("rossi");
        assert_that!(pages.read(|_, query| query.is_fetched())).is_false();
    }
}
