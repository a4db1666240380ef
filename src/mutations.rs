//! Mutation boundary: runs a write, refreshes the affected queries and reports the outcome.
//!
//! Errors stop here. They are logged and turned into an error [`Notification`], and no query is
//! invalidated, so whatever was shown before stays as it was.

use chrono::{DateTime, Utc};
use tower::{Service, ServiceExt};

use crate::{
    commands::{
        DeleteMemberRequest, DomainLogic, Error, ImportCardsRequest, InsertMemberRequest,
        RenewMemberRequest, UpdateMemberRequest,
    },
    domain::{MemberInsert, MemberUpdate, SpreadsheetFile},
    i18n::{Catalog, MessageKey},
    ports::{card::CardPort, file::FilePort, member::MemberPort},
    query::{QueryCache, QueryKey},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// Toast shown to the user after a mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == Level::Success
    }
}

pub struct Mutations<M, C, F> {
    logic: DomainLogic<M, C, F>,
    cache: QueryCache,
    catalog: Catalog,
}

impl<M, C, F> Mutations<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    pub fn new(logic: DomainLogic<M, C, F>, cache: QueryCache, catalog: Catalog) -> Self {
        Self {
            logic,
            cache,
            catalog,
        }
    }

    /// Run `req`, then invalidate `keys` on success
    async fn run<R>(
        &self,
        req: R,
        keys: &[QueryKey],
    ) -> Result<<DomainLogic<M, C, F> as Service<R>>::Response, Error>
    where
        DomainLogic<M, C, F>: Service<R, Error = Error>,
    {
        let res = self.logic.clone().oneshot(req).await?;
        for key in keys {
            self.cache.invalidate(*key);
        }
        Ok(res)
    }

    fn report<T>(
        &self,
        res: Result<T, Error>,
        success: MessageKey,
        failure: MessageKey,
        name: &str,
    ) -> Notification {
        let args = [("name", name)];
        match res {
            Ok(_) => Notification::success(self.catalog.message(success, &args)),
            Err(err) => {
                tracing::error!(%err, key = %failure, name, "mutation failed");
                Notification::error(self.catalog.message(failure, &args))
            }
        }
    }

    /// `name` is the display name used in the notification
    pub async fn insert(&self, details: MemberInsert, name: &str) -> Notification {
        let res = self
            .run(InsertMemberRequest { details }, &[QueryKey::Members])
            .await;
        self.report(res, MessageKey::InsertSuccess, MessageKey::InsertError, name)
    }

    pub async fn update(&self, id: &str, details: MemberUpdate, name: &str) -> Notification {
        let req = UpdateMemberRequest {
            id: id.to_string(),
            details,
        };
        let res = self.run(req, &[QueryKey::Members]).await;
        self.report(res, MessageKey::UpdateSuccess, MessageKey::UpdateError, name)
    }

    /// Renewals are reported like any other update
    pub async fn renew(
        &self,
        id: &str,
        current_expiration: Option<DateTime<Utc>>,
        name: &str,
    ) -> Notification {
        let req = RenewMemberRequest {
            id: id.to_string(),
            current_expiration,
        };
        let res = self.run(req, &[QueryKey::Members]).await;
        self.report(res, MessageKey::UpdateSuccess, MessageKey::UpdateError, name)
    }

    pub async fn delete(&self, id: &str, name: &str) -> Notification {
        let req = DeleteMemberRequest { id: id.to_string() };
        let res = self.run(req, &[QueryKey::Members]).await;
        self.report(res, MessageKey::DeleteSuccess, MessageKey::DeleteError, name)
    }

    /// Upload and import a spreadsheet of card numbers
    ///
    /// The success message is the one reported by the backend when there is one.
    pub async fn import_cards(&self, file: SpreadsheetFile) -> Notification {
        if !file.is_spreadsheet() {
            tracing::warn!(file_name = %file.file_name, "rejected card import file");
            return Notification::error(self.catalog.message(MessageKey::InvalidFileType, &[]));
        }
        let res = self
            .run(
                ImportCardsRequest { file },
                &[QueryKey::Cards, QueryKey::CardStats],
            )
            .await;
        match res {
            Ok(Some(message)) if !message.is_empty() => Notification::success(message),
            Ok(_) => Notification::success(self.catalog.message(MessageKey::ImportSuccess, &[])),
            Err(err) => {
                tracing::error!(%err, "card import failed");
                let error = err.user_message();
                Notification::error(
                    self.catalog
                        .message(MessageKey::ImportError, &[("error", error.as_str())]),
                )
            }
        }
    }
}
