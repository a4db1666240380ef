use chrono::NaiveDate;

/// A file stored by the backend and rendered on demand
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PdfFile {
    /// Admission form generated for a member
    MemberForm {
        name: String,
        surname: String,
        registration_date: NaiveDate,
    },
    /// Any other file, by name
    Generic(String),
}

impl PdfFile {
    pub fn file_name(&self) -> String {
        match self {
            PdfFile::MemberForm {
                name,
                surname,
                registration_date,
            } => member_pdf_filename(
                name,
                surname,
                &registration_date.format("%Y-%m-%d").to_string(),
            ),
            PdfFile::Generic(name) => name.clone(),
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, PdfFile::Generic(_))
    }
}

/// Name under which the backend stores a member's admission form
///
/// `[{registration_date}]{name}{surname}.pdf`, with spaces replaced by underscores. Name and
/// surname are concatenated without a separator.
pub fn member_pdf_filename(name: &str, surname: &str, registration_date: &str) -> String {
    format!(
        "[{registration_date}]{}{}.pdf",
        name.replace(' ', "_"),
        surname.replace(' ', "_")
    )
}
