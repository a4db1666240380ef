use serde_json::Value;

use super::{
    client::{Error as RestError, RestClient},
    schema::{rows_from_value, ApiCardNumber, ApiMessage},
};
use crate::{
    domain::{CardFilter, CardNumber},
    ports::card::{CardPort, Error},
};

/// Card inventory endpoints of the REST backend
#[derive(Clone, Debug)]
pub struct RestCards {
    client: RestClient,
}

impl RestCards {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CardPort for RestCards {
    async fn total_available(&self) -> Result<u64, Error> {
        // Plain number, not JSON
        let text = self.client.get_text("/cardNumber/totalAvailable").await?;
        let total = leading_number(&text).ok_or_else(|| RestError::UnexpectedBody(text.clone()))?;
        Ok(total)
    }

    async fn list_cards(&self, filter: CardFilter, page: u32) -> Result<Vec<CardNumber>, Error> {
        let value: Value = self
            .client
            .get(&format!("/cardNumber/{}/{page}", filter.path_segment()))
            .await?;
        let cards = rows_from_value::<ApiCardNumber>(value)?;
        Ok(cards.into_iter().map(CardNumber::from).collect())
    }

    async fn import_cards(&self) -> Result<Option<String>, Error> {
        let response: Option<ApiMessage> = self
            .client
            .post("/cardNumber/", &serde_json::json!({}))
            .await?;
        let response = response.unwrap_or_default();
        if let Some(error) = response.error.filter(|error| !error.is_empty()) {
            return Err(Error::Rejected(error));
        }
        Ok(response.message)
    }
}

/// Leading run of digits after optional whitespace, anything after it is ignored
fn leading_number(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

impl From<RestError> for Error {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Api { message, .. } => Self::Rejected(message),
            err => Self::Adapter(Box::new(err)),
        }
    }
}
