pub mod card;
pub mod client;
pub mod file;
pub mod member;
pub mod schema;

pub use card::RestCards;
pub use client::{Error, RestClient};
pub use file::RestFiles;
pub use member::RestMembers;

use crate::{commands::DomainLogic, config::ApiConfig, session::Session};

/// Commands backed by the REST adapters, sharing one HTTP client
pub fn connect(
    api: &ApiConfig,
    session: Session,
) -> DomainLogic<RestMembers, RestCards, RestFiles> {
    let client = RestClient::new(api.full_url()).with_session(session.clone());
    DomainLogic::new(
        RestMembers::new(client.clone()),
        RestCards::new(client.clone()),
        RestFiles::new(client),
        session,
    )
}
