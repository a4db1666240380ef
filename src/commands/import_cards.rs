use std::task::{Context, Poll};

use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::{
    domain::SpreadsheetFile,
    ports::{card::CardPort, file::FilePort, member::MemberPort},
};

/// Upload a spreadsheet of card numbers and import it
pub struct ImportCardsRequest {
    pub file: SpreadsheetFile,
}

impl<M, C, F> Service<ImportCardsRequest> for DomainLogic<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    /// Message reported by the backend, e.g. how many cards were imported
    type Response = Option<String>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ImportCardsRequest) -> Self::Future {
        let cards = self.cards.clone();
        let files = self.files.clone();
        Box::pin(async move {
            if !req.file.is_spreadsheet() {
                return Err(Error::Validation(
                    format!("{} is not a spreadsheet", req.file.file_name).into(),
                ));
            }
            let file_name = req.file.file_name.clone();
            files.upload_file(req.file).await?;
            tracing::info!(%file_name, "spreadsheet uploaded, importing cards");
            // The backend imports from the most recently uploaded file
            Ok(cards.import_cards().await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::testing::{admin, logic},
        ports::{
            card::MockCardPort,
            file::{self, MockFilePort},
            member::MockMemberPort,
        },
    };
    use mockall::Sequence;
    use speculoos::prelude::*;
    use tower::{BoxError, ServiceExt};

    #[tokio::test]
    async fn test_upload_then_import() -> Result<(), BoxError> {
        let mut seq = Sequence::new();
        let mut files = MockFilePort::new();
        let mut cards = MockCardPort::new();
        files
            .expect_upload_file()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|file| file.file_name == "cards.xlsx")
            .returning(|_| Ok(()));
        cards
            .expect_import_cards()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("Imported 125 cards successfully".to_string())));
        let domain = logic(MockMemberPort::new(), cards, files, admin());

        let res = domain
            .clone()
            .oneshot(ImportCardsRequest {
                file: SpreadsheetFile::new("cards.xlsx", vec![0x50, 0x4b]),
            })
            .await;

        assert_that!(res)
            .is_ok()
            .is_equal_to(Some("Imported 125 cards successfully".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_other_files() -> Result<(), BoxError> {
        let domain = logic(
            MockMemberPort::new(),
            MockCardPort::new(),
            MockFilePort::new(),
            admin(),
        );

        let res = domain
            .clone()
            .oneshot(ImportCardsRequest {
                file: SpreadsheetFile::new("cards.csv", Vec::new()),
            })
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_upload_skips_import() -> Result<(), BoxError> {
        let mut files = MockFilePort::new();
        files
            .expect_upload_file()
            .returning(|_| Err(file::Error::Rejected("Upload failed".to_string())));
        let domain = logic(MockMemberPort::new(), MockCardPort::new(), files, admin());

        let res = domain
            .clone()
            .oneshot(ImportCardsRequest {
                file: SpreadsheetFile::new("cards.xlsx", Vec::new()),
            })
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.user_message() == "Upload failed");
        Ok(())
    }
}
