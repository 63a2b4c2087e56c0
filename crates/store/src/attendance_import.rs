use std::io::Read;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::info;

use opsdesk_core::{AttendanceRecord, AttendanceStatus, UserId, Validate};

const EXPECTED_HEADER: [&str; 6] =
    ["employee_id", "date", "check_in", "check_out", "notes", "location"];

#[derive(Debug, Error)]
pub enum AttendanceImportError {
    #[error("could not read csv input: {0}")]
    Read(#[from] csv::Error),
    #[error("unexpected header: expected `{expected}`, got `{actual}`")]
    BadHeader { expected: String, actual: String },
}

/// One bad row. The rest of the file still imports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportRowError {
    /// 1-based line number in the file, header included.
    pub line: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct AttendanceImportReport {
    pub imported: Vec<AttendanceRecord>,
    pub errors: Vec<ImportRowError>,
}

/// Parses the 6-column attendance CSV. A malformed row is collected as
/// an error and skipped; only a missing or reordered header aborts the
/// whole import. Rows without a check-in come through as absences.
pub fn import_attendance_csv(
    input: impl Read,
) -> Result<AttendanceImportReport, AttendanceImportError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);

    let header = reader.headers()?.clone();
    let actual: Vec<&str> = header.iter().collect();
    if actual != EXPECTED_HEADER {
        return Err(AttendanceImportError::BadHeader {
            expected: EXPECTED_HEADER.join(","),
            actual: actual.join(","),
        });
    }

    let mut report = AttendanceImportReport::default();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                let line = error.position().map(|p| p.line()).unwrap_or(0);
                report.errors.push(ImportRowError { line, message: error.to_string() });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        match parse_row(&record) {
            Ok(parsed) => report.imported.push(parsed),
            Err(message) => report.errors.push(ImportRowError { line, message }),
        }
    }

    info!(
        imported = report.imported.len(),
        rejected = report.errors.len(),
        "attendance csv import finished"
    );
    Ok(report)
}

fn parse_row(record: &csv::StringRecord) -> Result<AttendanceRecord, String> {
    let field = |index: usize| record.get(index).unwrap_or_default();

    let employee_id = field(0);
    let date = parse_date(field(1))?;
    let check_in = parse_time("check_in", field(2))?;
    let check_out = parse_time("check_out", field(3))?;
    let notes = optional(field(4));
    let location = optional(field(5));

    let status = if check_in.is_some() { AttendanceStatus::Present } else { AttendanceStatus::Absent };

    let parsed = AttendanceRecord {
        id: format!("ATT-{employee_id}-{date}"),
        employee_id: UserId(employee_id.to_owned()),
        date,
        check_in,
        check_out,
        status,
        notes,
        location,
    };
    parsed.validate().map_err(|errors| errors.to_string())?;
    Ok(parsed)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("date `{raw}` is not YYYY-MM-DD"))
}

fn parse_time(column: &str, raw: &str) -> Result<Option<NaiveTime>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map(Some)
        .map_err(|_| format!("{column} `{raw}` is not HH:MM"))
}

fn optional(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_owned())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use opsdesk_core::AttendanceStatus;

    use super::{import_attendance_csv, AttendanceImportError};

    const HEADER: &str = "employee_id,date,check_in,check_out,notes,location\n";

    #[test]
    fn well_formed_rows_import() {
        let csv = format!(
            "{HEADER}u-dana,2024-03-04,09:00,17:30,,studio\nu-omar,2024-03-04,09:45:12,18:00:00,client visit,\n"
        );
        let report = import_attendance_csv(csv.as_bytes()).expect("import");

        assert!(report.errors.is_empty());
        assert_eq!(report.imported.len(), 2);

        let dana = &report.imported[0];
        assert_eq!(dana.id, "ATT-u-dana-2024-03-04");
        assert_eq!(dana.date, NaiveDate::from_ymd_opt(2024, 3, 4).expect("date"));
        assert_eq!(dana.check_in, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(dana.status, AttendanceStatus::Present);
        assert_eq!(dana.location.as_deref(), Some("studio"));

        assert_eq!(report.imported[1].notes.as_deref(), Some("client visit"));
    }

    #[test]
    fn missing_check_in_becomes_an_absence() {
        let csv = format!("{HEADER}u-dana,2024-03-05,,,sick day,\n");
        let report = import_attendance_csv(csv.as_bytes()).expect("import");

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].status, AttendanceStatus::Absent);
        assert_eq!(report.imported[0].check_in, None);
    }

    #[test]
    fn bad_rows_are_collected_without_stopping_the_file() {
        let csv = format!(
            "{HEADER}u-dana,04/03/2024,09:00,17:00,,\nu-omar,2024-03-04,nine,17:00,,\nu-lee,2024-03-04,09:00,17:00,,\n"
        );
        let report = import_attendance_csv(csv.as_bytes()).expect("import");

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].employee_id.0, "u-lee");

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].line, 2);
        assert!(report.errors[0].message.contains("not YYYY-MM-DD"));
        assert_eq!(report.errors[1].line, 3);
        assert!(report.errors[1].message.contains("check_in"));
    }

    #[test]
    fn check_out_before_check_in_is_a_row_error() {
        let csv = format!("{HEADER}u-dana,2024-03-04,17:00,09:00,,\n");
        let report = import_attendance_csv(csv.as_bytes()).expect("import");

        assert!(report.imported.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("check_out"));
    }

    #[test]
    fn a_reordered_header_aborts_the_import() {
        let csv = "date,employee_id,check_in,check_out,notes,location\n2024-03-04,u-dana,09:00,17:00,,\n";
        let error = import_attendance_csv(csv.as_bytes()).expect_err("bad header");
        assert!(matches!(error, AttendanceImportError::BadHeader { .. }));
    }
}
