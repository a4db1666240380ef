use std::{fmt, str::FromStr};

use super::member::{MemberRow, MemberStatus};

/// Name and surname sent to the search endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTerms {
    pub name: String,
    pub surname: String,
}

impl SearchTerms {
    /// Split a free-text query into search terms
    ///
    /// The first word is the name and the second the surname. A single word is used for both.
    /// Any further words are ignored. Returns `None` for a blank query.
    pub fn parse(query: &str) -> Option<Self> {
        let mut words = query.split_whitespace();
        let name = words.next()?;
        let surname = words.next().unwrap_or(name);
        Some(Self {
            name: name.to_string(),
            surname: surname.to_string(),
        })
    }
}

/// Listing endpoints exposed by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberListing {
    All,
    Active,
    Inactive,
    Suspended,
    Deleted,
}

impl MemberListing {
    pub fn path_segment(&self) -> &'static str {
        match self {
            MemberListing::All => "all",
            MemberListing::Active => "active",
            MemberListing::Inactive => "inactive",
            MemberListing::Suspended => "suspended",
            MemberListing::Deleted => "deleted",
        }
    }
}

/// Status filter selected for the members table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    Expired,
    Suspended,
    Deleted,
}

impl StatusFilter {
    /// Listing endpoint backing this filter
    ///
    /// `Expired` has no endpoint of its own: it reads the unfiltered listing and is applied
    /// locally, see [`StatusFilter::retains`].
    pub fn listing(&self) -> MemberListing {
        match self {
            StatusFilter::All | StatusFilter::Expired => MemberListing::All,
            StatusFilter::Active => MemberListing::Active,
            StatusFilter::Inactive => MemberListing::Inactive,
            StatusFilter::Suspended => MemberListing::Suspended,
            StatusFilter::Deleted => MemberListing::Deleted,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, StatusFilter::Expired)
    }

    /// Whether an already fetched row is kept by the local part of the filter
    pub fn retains(&self, row: &MemberRow) -> bool {
        !self.is_local() || row.status == MemberStatus::Expired
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Inactive => "inactive",
            StatusFilter::Expired => "expired",
            StatusFilter::Suspended => "suspended",
            StatusFilter::Deleted => "deleted",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown status filter: {0}")]
pub struct UnknownFilter(String);

impl FromStr for StatusFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            "expired" => Ok(StatusFilter::Expired),
            "suspended" => Ok(StatusFilter::Suspended),
            "deleted" => Ok(StatusFilter::Deleted),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Member;
    use chrono::Utc;
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case("Anna", "Anna", "Anna")]
    #[case("Anna Rossi", "Anna", "Rossi")]
    #[case("Anna Maria Rossi", "Anna", "Maria")]
    #[case("  Anna \t  Rossi  ", "Anna", "Rossi")]
    fn test_parse_terms(#[case] query: &str, #[case] name: &str, #[case] surname: &str) {
        assert_that!(SearchTerms::parse(query)).is_equal_to(Some(SearchTerms {
            name: name.to_string(),
            surname: surname.to_string(),
        }));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_parse_blank(#[case] query: &str) {
        assert_that!(SearchTerms::parse(query)).is_none();
    }

    #[rstest]
    #[case(StatusFilter::All, MemberListing::All)]
    #[case(StatusFilter::Expired, MemberListing::All)]
    #[case(StatusFilter::Active, MemberListing::Active)]
    #[case(StatusFilter::Inactive, MemberListing::Inactive)]
    #[case(StatusFilter::Suspended, MemberListing::Suspended)]
    #[case(StatusFilter::Deleted, MemberListing::Deleted)]
    fn test_listing(#[case] filter: StatusFilter, #[case] listing: MemberListing) {
        assert_that!(filter.listing()).is_equal_to(listing);
    }

    #[test]
    fn test_retains_only_filters_expired() {
        let row = MemberRow::new(
            Member {
                is_active: true,
                ..Default::default()
            },
            Utc::now(),
        );
        assert_that!(StatusFilter::Active.retains(&row)).is_true();
        assert_that!(StatusFilter::Expired.retains(&row)).is_false();
    }

    #[test]
    fn test_filter_from_str() {
        assert_that!("expired".parse::<StatusFilter>())
            .is_ok()
            .is_equal_to(StatusFilter::Expired);
        assert_that!("gone".parse::<StatusFilter>()).is_err();
    }
}
