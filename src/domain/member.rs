use std::fmt;

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use rand::Rng;

/// A member as returned by the backend
///
/// The membership status is not part of this type: it is derived at read time through
/// [`derive_status`] and never sent back to the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Member {
    /// Identifier assigned by the backend on insert
    pub id: String,
    pub name: String,
    pub surname: String,
    pub province: String,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub email: Option<String>,
    pub doc_type: Option<String>,
    pub doc_id: Option<String>,
    pub country: Option<String>,
    pub card_number: Option<String>,
    pub registration_date: Option<NaiveDate>,
    /// The membership is expired once this instant has passed
    pub expiration_date: Option<DateTime<Utc>>,
    /// The member is suspended until this instant
    pub suspended_till: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Soft-delete flag, the row is kept by the backend
    pub is_deleted: bool,
    pub note: Option<String>,
    pub measure: Option<String>,
}

impl Member {
    pub fn status(&self, now: DateTime<Utc>) -> MemberStatus {
        derive_status(self, now)
    }

    /// Full name as shown in notifications
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberStatus {
    Active,
    Inactive,
    Expired,
    Suspended,
    Deleted,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Expired => "expired",
            MemberStatus::Suspended => "suspended",
            MemberStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the status of a member at the instant `now`
///
/// Later rules override earlier ones: inactive, active, expired, suspended, deleted.
/// Deadlines are compared as instants with strict inequalities, so a member whose
/// expiration instant equals `now` is not expired yet.
pub fn derive_status(member: &Member, now: DateTime<Utc>) -> MemberStatus {
    let mut status = MemberStatus::Inactive;
    if member.is_active {
        status = MemberStatus::Active;
    }
    if member
        .expiration_date
        .is_some_and(|deadline| deadline < now)
    {
        status = MemberStatus::Expired;
    }
    if member
        .suspended_till
        .is_some_and(|deadline| deadline > now)
    {
        status = MemberStatus::Suspended;
    }
    if member.is_deleted {
        status = MemberStatus::Deleted;
    }
    status
}

/// Midnight UTC at the start of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// A member annotated with its derived status
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRow {
    pub member: Member,
    pub status: MemberStatus,
}

impl MemberRow {
    pub fn new(member: Member, now: DateTime<Utc>) -> Self {
        let status = derive_status(&member, now);
        Self { member, status }
    }
}

/// Details for a new member
///
/// The backend assigns the identifier, registration and expiration dates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberInsert {
    pub name: String,
    pub surname: String,
    pub province: String,
    pub birth_date: NaiveDate,
    pub birth_place: Option<String>,
    pub email: Option<String>,
    pub doc_type: Option<String>,
    pub doc_id: Option<String>,
    pub card_number: Option<String>,
    pub note: Option<String>,
    pub country: Option<String>,
    pub measure: Option<String>,
}

impl MemberInsert {
    /// Turn blank optional fields into absent ones
    pub fn without_blanks(self) -> Self {
        Self {
            birth_place: non_blank(self.birth_place),
            email: non_blank(self.email),
            doc_type: non_blank(self.doc_type),
            doc_id: non_blank(self.doc_id),
            card_number: non_blank(self.card_number),
            note: non_blank(self.note),
            country: non_blank(self.country),
            measure: non_blank(self.measure),
            ..self
        }
    }

    /// Name of the first required field left blank, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("surname", &self.surname),
            ("province", &self.province),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// Partial update of a member
///
/// Fields set to `None` are not transmitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub province: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub email: Option<String>,
    pub doc_type: Option<String>,
    pub doc_id: Option<String>,
    pub card_number: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub country: Option<String>,
    pub is_active: Option<bool>,
    pub is_deleted: Option<bool>,
    pub suspended_till: Option<DateTime<Utc>>,
    pub measure: Option<String>,
}

impl MemberUpdate {
    /// Turn empty strings into absent fields, so that blank form inputs are not sent as `""`
    pub fn without_blanks(self) -> Self {
        Self {
            name: non_blank(self.name),
            surname: non_blank(self.surname),
            province: non_blank(self.province),
            birth_place: non_blank(self.birth_place),
            email: non_blank(self.email),
            doc_type: non_blank(self.doc_type),
            doc_id: non_blank(self.doc_id),
            card_number: non_blank(self.card_number),
            note: non_blank(self.note),
            country: non_blank(self.country),
            measure: non_blank(self.measure),
            ..self
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Outcome of a membership renewal, before it is sent to the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Renewal {
    pub card_number: String,
    pub expiration_date: DateTime<Utc>,
}

impl Renewal {
    pub fn new<R: Rng + ?Sized>(
        current_expiration: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        Self {
            card_number: generate_card_number(rng),
            expiration_date: next_expiration(current_expiration, now),
        }
    }

    pub fn into_update(self) -> MemberUpdate {
        MemberUpdate {
            card_number: Some(self.card_number),
            expiration_date: Some(self.expiration_date),
            is_active: Some(true),
            ..Default::default()
        }
    }
}

/// Expiration instant after a renewal
///
/// One year from the later of the current expiration and `now`, so that renewing a long expired
/// membership does not produce a deadline that is already in the past.
pub fn next_expiration(current: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let base = current.map_or(now, |current| current.max(now));
    // Only fails past the end of the representable calendar
    base.checked_add_months(Months::new(12)).unwrap_or(base)
}

/// Random 8-digit card number, zero-padded
pub fn generate_card_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:08}", rng.gen_range(0..100_000_000u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::*;
    use speculoos::prelude::*;

    fn day(value: &str) -> DateTime<Utc> {
        start_of_day(NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap())
    }

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        at("2025-06-15T10:00:00Z")
    }

    fn member() -> Member {
        Member {
            id: "1".to_string(),
            name: "Anna".to_string(),
            surname: "Rossi".to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    fn test_inactive_by_default(now: DateTime<Utc>) {
        assert_that!(derive_status(&member(), now)).is_equal_to(MemberStatus::Inactive);
    }

    #[rstest]
    fn test_active(now: DateTime<Utc>) {
        let member = Member {
            is_active: true,
            expiration_date: Some(day("2026-01-01")),
            ..member()
        };
        assert_that!(derive_status(&member, now)).is_equal_to(MemberStatus::Active);
    }

    #[rstest]
    fn test_expired(now: DateTime<Utc>, #[values(true, false)] is_active: bool) {
        let member = Member {
            is_active,
            expiration_date: Some(day("2025-06-14")),
            ..member()
        };
        assert_that!(derive_status(&member, now)).is_equal_to(MemberStatus::Expired);
    }

    #[rstest]
    #[case("2025-06-15T23:00:00Z", MemberStatus::Active)]
    #[case("2025-06-15T09:59:59Z", MemberStatus::Expired)]
    #[case("2025-06-15T00:00:00Z", MemberStatus::Expired)]
    fn test_deadline_later_today(
        now: DateTime<Utc>,
        #[case] expiration: &str,
        #[case] expected: MemberStatus,
    ) {
        let member = Member {
            is_active: true,
            expiration_date: Some(at(expiration)),
            ..member()
        };
        assert_that!(derive_status(&member, now)).is_equal_to(expected);
    }

    #[rstest]
    fn test_suspended_overrides_expired(now: DateTime<Utc>) {
        let member = Member {
            is_active: true,
            expiration_date: Some(day("2024-01-01")),
            suspended_till: Some(day("2025-07-01")),
            ..member()
        };
        assert_that!(derive_status(&member, now)).is_equal_to(MemberStatus::Suspended);
    }

    #[rstest]
    fn test_suspension_ends_at_its_instant(now: DateTime<Utc>) {
        let member = Member {
            is_active: true,
            suspended_till: Some(at("2025-06-15T18:30:00Z")),
            ..member()
        };
        assert_that!(derive_status(&member, now)).is_equal_to(MemberStatus::Suspended);
        assert_that!(derive_status(&member, at("2025-06-15T18:30:01Z")))
            .is_equal_to(MemberStatus::Active);
    }

    #[rstest]
    fn test_past_suspension_is_ignored(now: DateTime<Utc>) {
        let member = Member {
            is_active: true,
            suspended_till: Some(day("2025-06-01")),
            ..member()
        };
        assert_that!(derive_status(&member, now)).is_equal_to(MemberStatus::Active);
    }

    #[rstest]
    fn test_deleted_masks_everything(
        now: DateTime<Utc>,
        #[values(true, false)] is_active: bool,
        #[values(None, Some("2020-01-01"), Some("2030-01-01"))] expiration: Option<&str>,
        #[values(None, Some("2020-01-01"), Some("2030-01-01"))] suspension: Option<&str>,
    ) {
        let member = Member {
            is_active,
            is_deleted: true,
            expiration_date: expiration.map(day),
            suspended_till: suspension.map(day),
            ..member()
        };
        assert_that!(derive_status(&member, now)).is_equal_to(MemberStatus::Deleted);
    }

    #[test]
    fn test_boundaries_are_strict() {
        let deadline = at("2025-06-15T14:45:30Z");
        let member = Member {
            is_active: true,
            expiration_date: Some(deadline),
            suspended_till: Some(deadline),
            ..member()
        };

        // Exactly at the deadline: neither expired nor suspended
        assert_that!(derive_status(&member, deadline)).is_equal_to(MemberStatus::Active);
        // One second later the membership is expired
        assert_that!(derive_status(&member, deadline + Duration::seconds(1)))
            .is_equal_to(MemberStatus::Expired);
        // One second earlier the suspension is still running
        assert_that!(derive_status(&member, deadline - Duration::seconds(1)))
            .is_equal_to(MemberStatus::Suspended);
    }

    #[rstest]
    #[case(Some("2025-09-01T08:00:00Z"), "2025-06-15T10:00:00Z", "2026-09-01T08:00:00Z")]
    #[case(Some("2024-02-29T00:00:00Z"), "2024-01-10T10:00:00Z", "2025-02-28T00:00:00Z")]
    #[case(Some("2023-01-01T00:00:00Z"), "2025-06-15T10:00:00Z", "2026-06-15T10:00:00Z")]
    #[case(None, "2025-06-15T10:00:00Z", "2026-06-15T10:00:00Z")]
    fn test_next_expiration(
        #[case] current: Option<&str>,
        #[case] now: &str,
        #[case] expected: &str,
    ) {
        assert_that!(next_expiration(current.map(at), at(now))).is_equal_to(at(expected));
    }

    #[test]
    fn test_card_number_is_eight_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let number = generate_card_number(&mut rng);
            assert_that!(number.len()).is_equal_to(8);
            assert_that!(number.chars().all(|c| c.is_ascii_digit())).is_true();
        }
    }

    #[test]
    fn test_renewal_update() {
        let mut rng = StdRng::seed_from_u64(1);
        let renewal = Renewal::new(Some(day("2025-01-01")), day("2025-06-15"), &mut rng);
        let update = renewal.clone().into_update();

        assert_that!(update.expiration_date).is_equal_to(Some(day("2026-06-15")));
        assert_that!(update.card_number).is_equal_to(Some(renewal.card_number));
        assert_that!(update.is_active).is_equal_to(Some(true));
        assert_that!(update.name).is_none();
    }

    #[test]
    fn test_update_without_blanks() {
        let update = MemberUpdate {
            email: Some(String::new()),
            note: Some("keep".to_string()),
            ..Default::default()
        }
        .without_blanks();

        assert_that!(update.email).is_none();
        assert_that!(update.note).is_equal_to(Some("keep".to_string()));
    }

    #[test]
    fn test_insert_missing_field() {
        let insert = MemberInsert {
            name: "Anna".to_string(),
            surname: " ".to_string(),
            province: "MI".to_string(),
            ..Default::default()
        };
        assert_that!(insert.missing_field()).is_equal_to(Some("surname"));
    }
}
