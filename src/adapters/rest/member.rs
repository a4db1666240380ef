use serde_json::Value;

use super::{
    client::{Error as RestError, RestClient},
    schema::{
        member_from_value, rows_from_value, ApiMember, ApiMemberInsert, ApiMemberUpdate,
        ApiSearchRequest,
    },
};
use crate::{
    domain::{Member, MemberInsert, MemberListing, MemberUpdate, SearchTerms},
    ports::member::{Error, MemberPort},
};

/// Members endpoints of the REST backend
#[derive(Clone, Debug)]
pub struct RestMembers {
    client: RestClient,
}

impl RestMembers {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

fn into_members(value: Value) -> Result<Vec<Member>, RestError> {
    let rows = rows_from_value::<ApiMember>(value)?;
    Ok(rows.into_iter().map(Member::from).collect())
}

#[async_trait::async_trait]
impl MemberPort for RestMembers {
    async fn list_members(&self, listing: MemberListing, page: u32) -> Result<Vec<Member>, Error> {
        let value: Value = self
            .client
            .get(&format!("/member/{}/{page}", listing.path_segment()))
            .await?;
        Ok(into_members(value)?)
    }

    async fn search_members(
        &self,
        terms: SearchTerms,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Member>, Error> {
        let request = ApiSearchRequest::new(terms, page, page_size);
        let value: Value = self.client.post("/member/getMembers", &request).await?;
        Ok(into_members(value)?)
    }

    async fn insert_member(&self, details: MemberInsert) -> Result<Option<Member>, Error> {
        let payload = ApiMemberInsert::from(details);
        let value: Value = self.client.post("/member", &payload).await?;
        Ok(member_from_value(value)?)
    }

    async fn update_member(
        &self,
        id: &str,
        details: MemberUpdate,
    ) -> Result<Option<Member>, Error> {
        let payload = ApiMemberUpdate::from(details);
        let value: Value = self.client.put(&format!("/member/{id}"), &payload).await?;
        Ok(member_from_value(value)?)
    }

    async fn soft_delete_member(&self, id: &str) -> Result<(), Error> {
        let value: Value = self
            .client
            .delete(&format!("/member/soft-delete/{id}"))
            .await?;
        // Only surfaces an embedded `error` field
        member_from_value(value)?;
        Ok(())
    }
}

/// Messages from the backend are business-rule violations, anything else is an adapter error.
impl From<RestError> for Error {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Api { message, .. } => Self::Rejected(message),
            err => Self::Adapter(Box::new(err)),
        }
    }
}
