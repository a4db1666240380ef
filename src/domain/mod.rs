pub mod card;
pub mod file;
pub mod member;
pub mod search;

pub use card::{CardFilter, CardNumber, CardStats, SpreadsheetFile};
pub use file::{member_pdf_filename, PdfFile};
pub use member::{
    derive_status, generate_card_number, next_expiration, start_of_day, Member, MemberInsert,
    MemberRow, MemberStatus, MemberUpdate, Renewal,
};
pub use search::{MemberListing, SearchTerms, StatusFilter};
