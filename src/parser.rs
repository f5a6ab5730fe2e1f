use crate::error::{FormError, Result};
use crate::model::{
    COL_DATE_COMPLETED, COL_PROBLEM_DESCRIPTION, COL_SITE_NAME, COL_SITE_NO, ParsedFields,
    RawRecord,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const SEGMENT_DELIMITER: &str = " - ";
const EDN_PREFIX: &str = "EDN";
const ISO_DATE: &str = "%Y-%m-%d";

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
];

const DATE_FORMATS: [&str; 6] = [
    ISO_DATE,
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// The three parts of a problem description such as
/// `DB-1-9-4 BELOW DB TRUNKING IS OVERFILLED - EDN OPS193-1310220234-001`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionParts {
    pub edn: String,
    pub db_id: String,
    pub description: String,
}

/// Splits a free-text problem description into EDN, DB identifier and text.
///
/// The EDN is only recognised as the last `" - "` segment, and the DB
/// identifier is whatever precedes the first space. Inputs that do not follow
/// that shape are split anyway; this never fails.
pub fn parse_description(text: &str) -> DescriptionParts {
    if text.is_empty() {
        return DescriptionParts::default();
    }

    let segments: Vec<&str> = text.split(SEGMENT_DELIMITER).collect();
    let mut edn = String::new();
    let mut remainder = text.to_string();

    if let [head @ .., last] = segments.as_slice()
        && !head.is_empty()
    {
        let last = last.trim();
        if last.starts_with(EDN_PREFIX) {
            edn = last.to_string();
            remainder = head.join(SEGMENT_DELIMITER);
        }
    }

    let (db_id, description) = match remainder.find(' ') {
        Some(idx) => (
            remainder[..idx].trim().to_string(),
            remainder[idx..].trim().to_string(),
        ),
        None => (remainder, String::new()),
    };

    DescriptionParts {
        edn,
        db_id,
        description,
    }
}

/// Reformats a completion date to `YYYY-MM-DD`.
///
/// Timestamps with an offset are converted to UTC first; naive timestamps
/// keep their calendar date.
pub fn normalize_date(raw: &str) -> Result<String> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).format(ISO_DATE).to_string());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Ok(dt.format(ISO_DATE).to_string());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.format(ISO_DATE).to_string())
        .ok_or_else(|| FormError::InvalidDate(raw.to_string()))
}

/// Maps one dataset row onto the fields a selection fills in.
///
/// Missing columns become empty strings. The only failure is a completion
/// date that cannot be read.
pub fn map_record_to_fields(record: &RawRecord) -> Result<ParsedFields> {
    let parts = parse_description(record.get(COL_PROBLEM_DESCRIPTION).unwrap_or_default());

    let site_no = record.get(COL_SITE_NO).unwrap_or_default();
    let site_name = record.get(COL_SITE_NAME).unwrap_or_default();

    let date_completed = match record.get(COL_DATE_COMPLETED) {
        Some(raw) => normalize_date(raw)?,
        None => String::new(),
    };

    Ok(ParsedFields {
        won: record.work_order().unwrap_or_default().to_string(),
        store_number_name: format!("{} {}", site_no, site_name).trim().to_string(),
        edn_number: parts.edn,
        db_id: parts.db_id,
        description: parts.description,
        date_completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(edn: &str, db_id: &str, description: &str) -> DescriptionParts {
        DescriptionParts {
            edn: edn.into(),
            db_id: db_id.into(),
            description: description.into(),
        }
    }

    #[test]
    fn empty_description() {
        assert_eq!(parse_description(""), parts("", "", ""));
    }

    #[test]
    fn full_description_with_edn() {
        assert_eq!(
            parse_description(
                "DB-1-9-4 BELOW DB TRUNKING IS OVERFILLED - EDN OPS193-1310220234-001"
            ),
            parts(
                "EDN OPS193-1310220234-001",
                "DB-1-9-4",
                "BELOW DB TRUNKING IS OVERFILLED"
            )
        );
    }

    #[test]
    fn single_token() {
        assert_eq!(
            parse_description("SINGLE-TOKEN-ONLY"),
            parts("", "SINGLE-TOKEN-ONLY", "")
        );
    }

    #[test]
    fn hyphen_without_edn_keeps_whole_text() {
        assert_eq!(
            parse_description("Some text without any EDN suffix - but with a hyphen"),
            parts("", "Some", "text without any EDN suffix - but with a hyphen")
        );
    }

    #[test]
    fn delimiter_inside_text_is_rejoined() {
        assert_eq!(
            parse_description("DB2 LIGHTS - FLOOR 1 - EDN 77"),
            parts("EDN 77", "DB2", "LIGHTS - FLOOR 1")
        );
    }

    #[test]
    fn edn_tag_is_trimmed() {
        assert_eq!(
            parse_description("DB3 FAULT -   EDN 12  "),
            parts("EDN 12", "DB3", "FAULT")
        );
        assert_eq!(
            parse_description("DB3 FAULT -EDN 12"),
            parts("", "DB3", "FAULT -EDN 12")
        );
    }

    #[test]
    fn edn_only_leaves_empty_remainder() {
        assert_eq!(parse_description(" - EDN 5"), parts("EDN 5", "", ""));
    }

    #[test]
    fn lowercase_edn_is_not_recognised() {
        assert_eq!(
            parse_description("DB1 TEXT - edn 5"),
            parts("", "DB1", "TEXT - edn 5")
        );
    }

    #[test]
    fn leading_space_gives_empty_db_id() {
        assert_eq!(parse_description(" leading"), parts("", "", "leading"));
    }

    #[test]
    fn reparsing_a_description_does_not_fail() {
        let first = parse_description("DB-1 SOME WORK - EDN 1");
        let second = parse_description(&first.description);
        assert_eq!(second, parts("", "SOME", "WORK"));
        let third = parse_description(&second.description);
        assert_eq!(third, parts("", "WORK", ""));
        assert_eq!(parse_description(&third.description), parts("", "", ""));
    }

    #[test]
    fn map_missing_columns_gives_empty_strings() {
        let fields = map_record_to_fields(&RawRecord::default()).unwrap();
        assert_eq!(fields, ParsedFields::default());
    }

    #[test]
    fn map_full_record() {
        let record: RawRecord = [
            ("WO #", "WO-100"),
            ("Site No.", "193"),
            ("Site Name", "Sheffield"),
            (
                "Problem Description",
                "DB-1-9-4 BELOW DB TRUNKING IS OVERFILLED - EDN OPS193-1310220234-001",
            ),
            ("Date Completed", "2024-03-05"),
            ("Priority", "P3"),
        ]
        .into_iter()
        .collect();

        let fields = map_record_to_fields(&record).unwrap();
        assert_eq!(fields.won, "WO-100");
        assert_eq!(fields.store_number_name, "193 Sheffield");
        assert_eq!(fields.edn_number, "EDN OPS193-1310220234-001");
        assert_eq!(fields.db_id, "DB-1-9-4");
        assert_eq!(fields.description, "BELOW DB TRUNKING IS OVERFILLED");
        assert_eq!(fields.date_completed, "2024-03-05");
    }

    #[test]
    fn store_name_has_no_dangling_space() {
        let only_no: RawRecord = [("Site No.", "12")].into_iter().collect();
        assert_eq!(map_record_to_fields(&only_no).unwrap().store_number_name, "12");
        let only_name: RawRecord = [("Site Name", "Hull")].into_iter().collect();
        assert_eq!(map_record_to_fields(&only_name).unwrap().store_number_name, "Hull");
    }

    #[test]
    fn unreadable_date_fails_mapping() {
        let record: RawRecord = [("Date Completed", "next tuesday")].into_iter().collect();
        assert!(matches!(
            map_record_to_fields(&record),
            Err(FormError::InvalidDate(raw)) if raw == "next tuesday"
        ));
    }

    #[test]
    fn date_formats() {
        assert_eq!(normalize_date("2024-03-05").unwrap(), "2024-03-05");
        assert_eq!(normalize_date("2024-03-05T10:30:00Z").unwrap(), "2024-03-05");
        assert_eq!(normalize_date("2024-03-05T23:30:00-02:00").unwrap(), "2024-03-06");
        assert_eq!(normalize_date("2024-03-05 14:22").unwrap(), "2024-03-05");
        assert_eq!(normalize_date("03/05/2024").unwrap(), "2024-03-05");
        assert_eq!(normalize_date("03/05/2024 09:15").unwrap(), "2024-03-05");
        assert_eq!(normalize_date("5 Mar 2024").unwrap(), "2024-03-05");
        assert_eq!(normalize_date("March 5, 2024").unwrap(), "2024-03-05");
        assert!(normalize_date("2024-13-40").is_err());
    }
}
