use std::path::Path;

use chrono::NaiveDate;

/// A unit of the access-card inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardNumber {
    pub card_number: String,
    pub insert_date: Option<NaiveDate>,
    /// Set by the backend when the card is bound to a member
    pub day_of_use: Option<NaiveDate>,
    /// `true` once the card is assigned
    pub is_active: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CardFilter {
    #[default]
    Available,
    All,
}

impl CardFilter {
    pub fn path_segment(&self) -> &'static str {
        match self {
            CardFilter::Available => "available",
            CardFilter::All => "all",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardStats {
    /// Number of cards not yet assigned to a member
    pub available: u64,
}

/// Spreadsheet of card numbers to import
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadsheetFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

const SPREADSHEET_TYPES: [&str; 2] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

impl SpreadsheetFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = match extension(&file_name).as_deref() {
            Some("xlsx") => Some(SPREADSHEET_TYPES[0].to_string()),
            Some("xls") => Some(SPREADSHEET_TYPES[1].to_string()),
            _ => None,
        };
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Accepts `.xlsx` and `.xls` files, by MIME type or by extension
    pub fn is_spreadsheet(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|content_type| SPREADSHEET_TYPES.contains(&content_type));
        by_type || matches!(extension(&self.file_name).as_deref(), Some("xlsx" | "xls"))
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
