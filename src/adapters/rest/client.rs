//! Generic JSON client for the membership backend.

use reqwest::{header, multipart::Form, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{ports::auth, session::Session};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never got a response
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status with a readable message in the body
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Non-success status without a readable message
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),

    #[error("access token unavailable: {0}")]
    Token(#[from] auth::Error),
}

impl Error {
    /// HTTP status of a non-success response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Http { status } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Build the error for a non-success response from its body
///
/// Prefers the `error` field of a JSON body, then `message`, then falls back to a generic
/// message carrying the status code.
pub fn error_from_body(status: StatusCode, body: &[u8]) -> Error {
    let message = serde_json::from_slice::<Value>(body).ok().and_then(|value| {
        ["error", "message"].into_iter().find_map(|key| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(str::to_owned)
        })
    });
    match message {
        Some(message) => Error::Api {
            status: status.as_u16(),
            message,
        },
        None => Error::Http {
            status: status.as_u16(),
        },
    }
}

/// Async client for the versioned REST API
///
/// ```rust,no_run
/// use membership_console::{adapters::rest::RestClient, session::Session};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::from_jwt("eyJ...")?;
/// let rest = RestClient::new("https://members.example.org/api/v1").with_session(session);
/// let first_page: serde_json::Value = rest.get("/member/all/0").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RestClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            session: None,
        }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    async fn builder(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "sending request");
        let builder = self.client.request(method, url);
        match &self.session {
            Some(session) => {
                let token = session.access_token().await?;
                Ok(builder.bearer_auth(token))
            }
            None => Ok(builder),
        }
    }

    /// Return the response if successful, or the normalized error
    async fn check(path: &str, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await.unwrap_or_default();
        let err = error_from_body(status, &body);
        tracing::warn!(path, status = status.as_u16(), error = %err, "request failed");
        Err(err)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let mut req = self.builder(method, path).await?;
        if let Some(body) = body {
            req = req
                .header(header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }
        let resp = req.send().await?;
        Self::check(path, resp).await
    }

    /// Send a JSON request and parse the JSON response
    ///
    /// An empty success body is parsed as `null`.
    pub async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let body = body.map(serde_json::to_value).transpose()?;
        let resp = self.send(method, path, body.as_ref()).await?;
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, Value>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, Value>(Method::DELETE, path, None).await
    }

    // ── Non-JSON endpoints ────────────────────────────────────────────────────

    /// GET a plain-text body
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let resp = self.send(Method::GET, path, None).await?;
        Ok(resp.text().await?)
    }

    /// POST a JSON body and return the raw response bytes
    pub async fn post_for_bytes<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<u8>> {
        let body = serde_json::to_value(body)?;
        let resp = self.send(Method::POST, path, Some(&body)).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// POST a multipart form, the boundary header is set by reqwest
    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<()> {
        let resp = self
            .builder(Method::POST, path)
            .await?
            .multipart(form)
            .send()
            .await?;
        Self::check(path, resp).await?;
        Ok(())
    }
}
