use std::task::{Context, Poll};

use tower::Service;

use super::{BoxFuture, DomainLogic, Error};
use crate::{
    domain::PdfFile,
    ports::{card::CardPort, file::FilePort, member::MemberPort},
};

pub struct FetchPdfRequest {
    pub file: PdfFile,
}

impl<M, C, F> Service<FetchPdfRequest> for DomainLogic<M, C, F>
where
    M: MemberPort + 'static,
    C: CardPort + 'static,
    F: FilePort + 'static,
{
    /// Raw PDF bytes
    type Response = Vec<u8>;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FetchPdfRequest) -> Self::Future {
        let files = self.files.clone();
        Box::pin(async move {
            let file_name = req.file.file_name();
            tracing::debug!(%file_name, "fetching pdf");
            Ok(files
                .fetch_file(&file_name, req.file.is_generic())
                .await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::testing::{logic, staff},
        ports::{
            card::MockCardPort,
            file::{self, MockFilePort},
            member::MockMemberPort,
        },
    };
    use chrono::NaiveDate;
    use speculoos::prelude::*;
    use tower::{BoxError, ServiceExt};

    fn form() -> PdfFile {
        PdfFile::MemberForm {
            name: "Anna Maria".to_string(),
            surname: "Rossi".to_string(),
            registration_date: NaiveDate::from_ymd_opt(2025, 12, 27).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_fetch_member_form() -> Result<(), BoxError> {
        let mut files = MockFilePort::new();
        files
            .expect_fetch_file()
            .times(1)
            .withf(|name, generic| name == "[2025-12-27]Anna_MariaRossi.pdf" && !*generic)
            .returning(|_, _| Ok(b"%PDF-1.7".to_vec()));
        let domain = logic(MockMemberPort::new(), MockCardPort::new(), files, staff());

        let res = domain.clone().oneshot(FetchPdfRequest { file: form() }).await;

        assert_that!(res).is_ok().is_equal_to(b"%PDF-1.7".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_form() -> Result<(), BoxError> {
        let mut files = MockFilePort::new();
        files
            .expect_fetch_file()
            .returning(|name, _| Err(file::Error::NotFound(name.to_string())));
        let domain = logic(MockMemberPort::new(), MockCardPort::new(), files, staff());

        let res = domain.clone().oneshot(FetchPdfRequest { file: form() }).await;

        assert_that!(res).is_err().matches(|err| {
            err.user_message() == "PDF not found. The admission form may not have been generated yet."
        });
        Ok(())
    }
}
