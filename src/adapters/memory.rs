use crate::{
    domain::{
        generate_card_number, next_expiration, Member, MemberInsert, MemberListing, MemberUpdate,
        SearchTerms,
    },
    ports::member::{Error, MemberPort},
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory stand-in for the members backend
///
/// Mirrors the backend rules closely enough for offline use and tests: listings are paged with
/// a fixed page size, search matches name and surname case-insensitively, deletes are soft.
#[derive(Clone, Debug)]
pub struct MemoryMembers {
    members: Arc<Mutex<Vec<Member>>>,
    page_size: usize,
}

impl MemoryMembers {
    pub fn new(page_size: usize) -> Self {
        Self {
            members: Arc::new(Mutex::new(Vec::new())),
            page_size: page_size.max(1),
        }
    }

    pub fn with_members(page_size: usize, members: Vec<Member>) -> Self {
        Self {
            members: Arc::new(Mutex::new(members)),
            page_size: page_size.max(1),
        }
    }

    fn page(&self, rows: Vec<Member>, page: u32) -> Vec<Member> {
        rows.into_iter()
            .skip(page as usize * self.page_size)
            .take(self.page_size)
            .collect()
    }
}

impl Default for MemoryMembers {
    fn default() -> Self {
        Self::new(20)
    }
}

fn in_listing(member: &Member, listing: MemberListing, now: DateTime<Utc>) -> bool {
    match listing {
        MemberListing::All => true,
        MemberListing::Active => member.is_active && !member.is_deleted,
        MemberListing::Inactive => !member.is_active && !member.is_deleted,
        MemberListing::Suspended => {
            !member.is_deleted && member.suspended_till.is_some_and(|till| till > now)
        }
        MemberListing::Deleted => member.is_deleted,
    }
}

fn matches_terms(member: &Member, terms: &SearchTerms) -> bool {
    let contains = |field: &str, term: &str| field.to_lowercase().contains(&term.to_lowercase());
    contains(&member.name, &terms.name) || contains(&member.surname, &terms.surname)
}

fn apply(member: &mut Member, details: MemberUpdate) {
    macro_rules! set {
        ($($field:ident),*) => {
            $(if let Some(value) = details.$field { member.$field = value; })*
        };
    }
    macro_rules! set_optional {
        ($($field:ident),*) => {
            $(if let Some(value) = details.$field { member.$field = Some(value); })*
        };
    }
    set!(name, surname, province, is_active, is_deleted);
    set_optional!(
        birth_date,
        birth_place,
        email,
        doc_type,
        doc_id,
        card_number,
        expiration_date,
        note,
        country,
        suspended_till,
        measure
    );
}

#[async_trait::async_trait]
impl MemberPort for MemoryMembers {
    async fn list_members(&self, listing: MemberListing, page: u32) -> Result<Vec<Member>, Error> {
        let now = Utc::now();
        let rows = self
            .members
            .lock()?
            .iter()
            .filter(|member| in_listing(member, listing, now))
            .cloned()
            .collect();
        Ok(self.page(rows, page))
    }

    async fn search_members(
        &self,
        terms: SearchTerms,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Member>, Error> {
        let page_size = page_size.max(1) as usize;
        let rows = self
            .members
            .lock()?
            .iter()
            .filter(|member| matches_terms(member, &terms))
            .skip(page as usize * page_size)
            .take(page_size)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn insert_member(&self, details: MemberInsert) -> Result<Option<Member>, Error> {
        let details = details.without_blanks();
        let now = Utc::now();
        let mut members = self.members.lock()?;
        let member = Member {
            id: (members.len() + 1).to_string(),
            name: details.name,
            surname: details.surname,
            province: details.province,
            birth_date: Some(details.birth_date),
            birth_place: details.birth_place,
            email: details.email,
            doc_type: details.doc_type,
            doc_id: details.doc_id,
            country: details.country,
            card_number: details
                .card_number
                .or_else(|| Some(generate_card_number(&mut rand::thread_rng()))),
            registration_date: Some(now.date_naive()),
            expiration_date: Some(next_expiration(None, now)),
            suspended_till: None,
            is_active: true,
            is_deleted: false,
            note: details.note,
            measure: details.measure,
        };
        members.push(member.clone());
        Ok(Some(member))
    }

    async fn update_member(
        &self,
        id: &str,
        details: MemberUpdate,
    ) -> Result<Option<Member>, Error> {
        let mut members = self.members.lock()?;
        let member = members
            .iter_mut()
            .find(|member| member.id == id)
            .ok_or_else(|| Error::MemberDoesNotExist(id.to_string()))?;
        apply(member, details.without_blanks());
        Ok(Some(member.clone()))
    }

    async fn soft_delete_member(&self, id: &str) -> Result<(), Error> {
        let mut members = self.members.lock()?;
        let member = members
            .iter_mut()
            .find(|member| member.id == id)
            .ok_or_else(|| Error::MemberDoesNotExist(id.to_string()))?;
        member.is_deleted = true;
        Ok(())
    }
}

/// A panic while the member store was locked
///
/// Only the message survives: the guard inside [`PoisonError`] cannot travel in a
/// `Send` adapter error.
#[derive(Debug, thiserror::Error)]
#[error("member store poisoned: {0}")]
pub struct StorePoisoned(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(StorePoisoned(err.to_string())))
    }
}
