//! Wire schema of the backend and its mapping to domain types.
//!
//! The backend speaks camelCase JSON. Every field mapping lives here, declared through serde
//! attributes, so the rest of the crate only sees domain types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::client::{Error, Result};
use crate::domain::{start_of_day, CardNumber, Member, MemberInsert, MemberUpdate, SearchTerms};

const DATE_FORMAT: &str = "%Y-%m-%d";
/// Timestamp without an offset, as serialized for a Java `LocalDateTime`
const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMember {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub province: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_till: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
}

/// Unreadable dates are dropped with a warning, the rest of the member is kept
impl From<ApiMember> for Member {
    fn from(api: ApiMember) -> Self {
        Self {
            birth_date: read_field("birthDate", api.birth_date, parse_date),
            registration_date: read_field("registrationDate", api.registration_date, parse_date),
            expiration_date: read_field("expirationDate", api.expiration_date, parse_instant),
            suspended_till: read_field("suspendedTill", api.suspended_till, parse_instant),
            id: api.id,
            name: api.name,
            surname: api.surname,
            province: api.province,
            birth_place: api.birth_place,
            email: api.email,
            doc_type: api.doc_type,
            doc_id: api.doc_id,
            country: api.country,
            card_number: api.card_number,
            is_active: api.is_active.unwrap_or_default(),
            is_deleted: api.is_deleted.unwrap_or_default(),
            note: api.note,
            measure: api.measure,
        }
    }
}

impl From<&Member> for ApiMember {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            surname: member.surname.clone(),
            province: member.province.clone(),
            birth_date: member.birth_date.map(format_date),
            birth_place: member.birth_place.clone(),
            email: member.email.clone(),
            doc_type: member.doc_type.clone(),
            doc_id: member.doc_id.clone(),
            card_number: member.card_number.clone(),
            registration_date: member.registration_date.map(format_date),
            expiration_date: member.expiration_date.map(format_instant),
            note: member.note.clone(),
            country: member.country.clone(),
            is_active: Some(member.is_active),
            is_deleted: Some(member.is_deleted),
            suspended_till: member.suspended_till.map(format_instant),
            measure: member.measure.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMemberInsert {
    pub name: String,
    pub surname: String,
    pub province: String,
    pub birth_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
}

impl From<MemberInsert> for ApiMemberInsert {
    fn from(details: MemberInsert) -> Self {
        let details = details.without_blanks();
        Self {
            name: details.name,
            surname: details.surname,
            province: details.province,
            birth_date: format_date(details.birth_date),
            birth_place: details.birth_place,
            email: details.email,
            doc_type: details.doc_type,
            doc_id: details.doc_id,
            card_number: details.card_number,
            note: details.note,
            country: details.country,
            measure: details.measure,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_till: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
}

impl From<MemberUpdate> for ApiMemberUpdate {
    fn from(details: MemberUpdate) -> Self {
        let details = details.without_blanks();
        Self {
            name: details.name,
            surname: details.surname,
            province: details.province,
            birth_date: details.birth_date.map(format_date),
            birth_place: details.birth_place,
            email: details.email,
            doc_type: details.doc_type,
            doc_id: details.doc_id,
            card_number: details.card_number,
            expiration_date: details.expiration_date.map(format_instant),
            note: details.note,
            country: details.country,
            is_active: details.is_active,
            is_deleted: details.is_deleted,
            suspended_till: details.suspended_till.map(format_instant),
            measure: details.measure,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchRequest {
    pub name: String,
    pub surname: String,
    pub page_number: u32,
    pub page_size: u32,
}

impl ApiSearchRequest {
    pub fn new(terms: SearchTerms, page_number: u32, page_size: u32) -> Self {
        Self {
            name: terms.name,
            surname: terms.surname,
            page_number,
            page_size,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCardNumber {
    pub card_number: String,
    #[serde(default)]
    pub insert_date: Option<String>,
    #[serde(default)]
    pub day_of_use: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<ApiCardNumber> for CardNumber {
    fn from(api: ApiCardNumber) -> Self {
        Self {
            insert_date: read_field("insertDate", api.insert_date, parse_date),
            day_of_use: read_field("dayOfUse", api.day_of_use, parse_date),
            card_number: api.card_number,
            is_active: api.is_active.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFileRequest<'a> {
    pub file_name: &'a str,
    pub is_generic_file: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Rows of a list response
///
/// The backend answers either with a bare array, a paged object (`content`) or a wrapped
/// object (`data`). Anything else is an empty page. A non-empty `error` field is an error even
/// on a success status.
pub fn rows_from_value<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut map) => {
            if let Some(message) = embedded_error(&map) {
                return Err(message);
            }
            for key in ["content", "data"] {
                if let Some(rows @ Value::Array(_)) = map.remove(key) {
                    return Ok(serde_json::from_value(rows)?);
                }
            }
            Ok(Vec::new())
        }
        _ => Ok(Vec::new()),
    }
}

/// Member echoed back by a mutation, bare or wrapped in `data`
pub fn member_from_value(value: Value) -> Result<Option<Member>> {
    let Value::Object(mut map) = value else {
        return Ok(None);
    };
    if let Some(message) = embedded_error(&map) {
        return Err(message);
    }
    let member = match map.remove("data") {
        Some(data @ Value::Object(_)) => data,
        Some(_) => return Ok(None),
        None if map.contains_key("id") => Value::Object(map),
        None => return Ok(None),
    };
    let api: ApiMember = serde_json::from_value(member)?;
    Ok(Some(Member::from(api)))
}

fn embedded_error(map: &serde_json::Map<String, Value>) -> Option<Error> {
    map.get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(|message| Error::Api {
            status: 200,
            message: message.to_string(),
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// RFC 3339 in UTC with milliseconds, e.g. `2026-06-15T10:00:00.000Z`
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar date of a `yyyy-MM-dd` value, or the date as written in a timestamp
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, LOCAL_DATE_TIME_FORMAT).map(|dt| dt.date())
        })
        .ok()
}

/// Instant of a deadline
///
/// RFC 3339 timestamps keep their time and offset. Timestamps without an offset are read as UTC,
/// and a bare `yyyy-MM-dd` is midnight UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, LOCAL_DATE_TIME_FORMAT).map(|dt| dt.and_utc())
        })
        .or_else(|_| NaiveDate::parse_from_str(value, DATE_FORMAT).map(start_of_day))
        .ok()
}

/// Read an optional date field
///
/// Blank values are absent. Values `parse` cannot read are logged and treated as absent.
fn read_field<T>(
    field: &'static str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    let value = value.filter(|value| !value.trim().is_empty())?;
    let parsed = parse(&value);
    if parsed.is_none() {
        tracing::warn!(field, value = %value, "ignoring unreadable date");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive_status, MemberStatus};
    use rstest::*;
    use serde_json::json;
    use speculoos::prelude::*;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    fn member() -> Member {
        Member {
            id: "64f1".to_string(),
            name: "Anna Maria".to_string(),
            surname: "Rossi".to_string(),
            province: "MI".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 3, 4),
            email: Some("anna@example.org".to_string()),
            card_number: Some("00012345".to_string()),
            registration_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            expiration_date: Some(at("2026-01-10T17:30:00Z")),
            suspended_till: Some(at("2025-02-01T00:00:00Z")),
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_member_round_trip() {
        let member = member();
        let json = serde_json::to_value(ApiMember::from(&member)).unwrap();
        let api: ApiMember = serde_json::from_value(json).unwrap();
        assert_that!(Member::from(api)).is_equal_to(member);
    }

    #[test]
    fn test_member_field_names() {
        let json = serde_json::to_value(ApiMember::from(&member())).unwrap();
        for key in [
            "birthDate",
            "cardNumber",
            "registrationDate",
            "expirationDate",
            "suspendedTill",
            "isActive",
            "isDeleted",
        ] {
            assert_that!(json.get(key)).is_some();
        }
        assert_that!(json["birthDate"]).is_equal_to(json!("1990-03-04"));
        assert_that!(json["expirationDate"]).is_equal_to(json!("2026-01-10T17:30:00.000Z"));
    }

    #[test]
    fn test_update_drops_blank_fields() {
        let update = MemberUpdate {
            email: Some(String::new()),
            ..Default::default()
        };
        let json = serde_json::to_value(ApiMemberUpdate::from(update)).unwrap();
        assert_that!(json).is_equal_to(json!({}));
    }

    #[test]
    fn test_insert_payload() {
        let insert = MemberInsert {
            name: "Anna".to_string(),
            surname: "Rossi".to_string(),
            province: "MI".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 3, 4).unwrap(),
            note: Some(String::new()),
            doc_id: Some("AB123".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(ApiMemberInsert::from(insert)).unwrap();
        assert_that!(json).is_equal_to(json!({
            "name": "Anna",
            "surname": "Rossi",
            "province": "MI",
            "birthDate": "1990-03-04",
            "docId": "AB123",
        }));
    }

    #[test]
    fn test_search_request() {
        let terms = SearchTerms::parse("Anna Rossi").unwrap();
        let json = serde_json::to_value(ApiSearchRequest::new(terms, 2, 20)).unwrap();
        assert_that!(json).is_equal_to(json!({
            "name": "Anna",
            "surname": "Rossi",
            "pageNumber": 2,
            "pageSize": 20,
        }));
    }

    #[rstest]
    #[case(json!([{"id": "1"}, {"id": "2"}]), 2)]
    #[case(json!({"content": [{"id": "1"}], "totalElements": 40}), 1)]
    #[case(json!({"data": [{"id": "1"}, {"id": "2"}, {"id": "3"}]}), 3)]
    #[case(json!({"totalElements": 40}), 0)]
    #[case(json!(null), 0)]
    fn test_rows_from_value(#[case] value: Value, #[case] expected: usize) {
        let rows: Result<Vec<ApiMember>> = rows_from_value(value);
        assert_that!(rows).is_ok().has_length(expected);
    }

    #[test]
    fn test_rows_with_error() {
        let rows: Result<Vec<ApiMember>> = rows_from_value(json!({"error": "boom"}));
        assert_that!(rows)
            .is_err()
            .matches(|err| err.to_string() == "boom");
    }

    #[rstest]
    #[case(json!({"data": {"id": "9", "name": "Anna"}}), Some("9"))]
    #[case(json!({"id": "9", "name": "Anna"}), Some("9"))]
    #[case(json!({"message": "ok"}), None)]
    #[case(json!(null), None)]
    fn test_member_from_value(#[case] value: Value, #[case] expected: Option<&str>) {
        let member = member_from_value(value).unwrap();
        assert_that!(member.map(|m| m.id)).is_equal_to(expected.map(str::to_string));
    }

    #[rstest]
    #[case("2025-12-27", NaiveDate::from_ymd_opt(2025, 12, 27))]
    #[case("2025-12-27T00:00:00.000Z", NaiveDate::from_ymd_opt(2025, 12, 27))]
    #[case("2025-12-27T23:30:00-05:00", NaiveDate::from_ymd_opt(2025, 12, 27))]
    #[case("2025-12-27T08:15:00", NaiveDate::from_ymd_opt(2025, 12, 27))]
    #[case("27/12/2025", None)]
    fn test_parse_date(#[case] value: &str, #[case] expected: Option<NaiveDate>) {
        assert_that!(parse_date(value)).is_equal_to(expected);
    }

    #[rstest]
    #[case("2026-01-10", Some("2026-01-10T00:00:00Z"))]
    #[case("2026-01-10T23:00:00Z", Some("2026-01-10T23:00:00Z"))]
    #[case("2026-01-10T23:00:00.250Z", Some("2026-01-10T23:00:00.250Z"))]
    #[case("2026-01-10T01:00:00+02:00", Some("2026-01-09T23:00:00Z"))]
    #[case("2026-01-10T00:00:00", Some("2026-01-10T00:00:00Z"))]
    #[case("2026-01-10T09:30:00.5", Some("2026-01-10T09:30:00.500Z"))]
    #[case("next year", None)]
    fn test_parse_instant(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_that!(parse_instant(value)).is_equal_to(expected.map(at));
    }

    #[test]
    fn test_timestamped_deadline_keeps_its_time() {
        let api: ApiMember = serde_json::from_value(json!({
            "id": "1",
            "isActive": true,
            "expirationDate": "2025-06-15T23:00:00Z",
        }))
        .unwrap();
        let member = Member::from(api);

        assert_that!(derive_status(&member, at("2025-06-15T10:00:00Z")))
            .is_equal_to(MemberStatus::Active);
        assert_that!(derive_status(&member, at("2025-06-15T23:00:01Z")))
            .is_equal_to(MemberStatus::Expired);
    }

    #[test]
    fn test_unreadable_dates_keep_the_row() {
        let rows: Vec<ApiMember> = rows_from_value(json!({
            "content": [
                {"id": "1", "expirationDate": "2026-01-10"},
                {"id": "2", "expirationDate": "2026-01-10T00:00:00"},
                {"id": "3", "expirationDate": "soon", "birthDate": "04/03/1990"},
                {"id": "4", "suspendedTill": ""},
            ]
        }))
        .unwrap();
        let members: Vec<Member> = rows.into_iter().map(Member::from).collect();

        let deadline = Some(at("2026-01-10T00:00:00Z"));
        assert_that!(members.len()).is_equal_to(4);
        assert_that!(members[0].expiration_date).is_equal_to(deadline);
        assert_that!(members[1].expiration_date).is_equal_to(deadline);
        assert_that!(members[2].expiration_date).is_none();
        assert_that!(members[2].birth_date).is_none();
        assert_that!(members[3].suspended_till).is_none();
    }

    #[test]
    fn test_card_with_unreadable_date() {
        let api: ApiCardNumber = serde_json::from_value(json!({
            "cardNumber": "00000042",
            "insertDate": "2025-01-15T09:00:00",
            "dayOfUse": "n/a",
            "isActive": true,
        }))
        .unwrap();
        let card = CardNumber::from(api);

        assert_that!(card.insert_date).is_equal_to(NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_that!(card.day_of_use).is_none();
        assert_that!(card.is_active).is_true();
    }
}
