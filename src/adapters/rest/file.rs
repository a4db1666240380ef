use reqwest::multipart::{Form, Part};

use super::{
    client::{Error as RestError, RestClient},
    schema::ApiFileRequest,
};
use crate::{
    domain::SpreadsheetFile,
    ports::file::{Error, FilePort},
};

/// File storage endpoints of the REST backend
#[derive(Clone, Debug)]
pub struct RestFiles {
    client: RestClient,
}

impl RestFiles {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FilePort for RestFiles {
    async fn upload_file(&self, file: SpreadsheetFile) -> Result<(), Error> {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type).map_err(RestError::from)?;
        }
        let form = Form::new().part("file", part);
        self.client.post_multipart("/file/upload", form).await?;
        Ok(())
    }

    async fn fetch_file(&self, file_name: &str, is_generic: bool) -> Result<Vec<u8>, Error> {
        let request = ApiFileRequest {
            file_name,
            is_generic_file: is_generic,
        };
        self.client
            .post_for_bytes("/file/", &request)
            .await
            .map_err(|err| match err.status() {
                Some(404) => Error::NotFound(file_name.to_string()),
                _ => err.into(),
            })
    }
}

impl From<RestError> for Error {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Api { message, .. } => Self::Rejected(message),
            err => Self::Adapter(Box::new(err)),
        }
    }
}
