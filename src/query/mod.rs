//! Client-side query state: accumulated pages, invalidation and debounced search input.

pub mod cache;
pub mod cards;
pub mod debounce;
pub mod members;
pub mod pages;

pub use cache::{QueryCache, QueryKey};
pub use cards::{CardStatsPoller, CardsQuery};
pub use debounce::Debouncer;
pub use members::{MembersQuery, MembersView};
pub use pages::{Fetched, InfiniteQuery, PageTicket, SharedPages};
