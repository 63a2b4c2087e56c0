use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::validation::{FieldErrors, Validate};

/// Categorical day status. Unlike the workflow entities this is not a
/// progression; a day simply is one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    Remote,
    OnLeave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::HalfDay => "half_day",
            Self::Remote => "remote",
            Self::OnLeave => "on_leave",
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            "half_day" => Ok(Self::HalfDay),
            "remote" => Ok(Self::Remote),
            "on_leave" => Ok(Self::OnLeave),
            other => Err(format!("unknown attendance status `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub employee_id: UserId,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub location: Option<String>,
}

impl Validate for AttendanceRecord {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.employee_id.0.trim().is_empty() {
            errors.add("employee_id", "is required");
        }
        if let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) {
            if check_out < check_in {
                errors.add("check_out", "must not be before check-in");
            }
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use crate::domain::user::UserId;
    use crate::validation::Validate;

    use super::{AttendanceRecord, AttendanceStatus};

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            id: "ATT-1".to_owned(),
            employee_id: UserId("u-emp".to_owned()),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date"),
            check_in: NaiveTime::from_hms_opt(9, 0, 0),
            check_out: NaiveTime::from_hms_opt(17, 30, 0),
            status: AttendanceStatus::Present,
            notes: None,
            location: Some("studio".to_owned()),
        }
    }

    #[test]
    fn status_round_trips_through_its_tag() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Late,
            AttendanceStatus::HalfDay,
            AttendanceStatus::Remote,
            AttendanceStatus::OnLeave,
        ] {
            let parsed: AttendanceStatus = status.as_str().parse().expect("round trip");
            assert_eq!(parsed, status);
        }
        assert!("sabbatical".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn check_out_before_check_in_is_refused() {
        let mut record = record();
        record.check_out = NaiveTime::from_hms_opt(8, 0, 0);
        let errors = record.validate().expect_err("check-out precedes check-in");
        assert_eq!(errors.field("check_out"), ["must not be before check-in"]);
    }

    #[test]
    fn open_ended_day_is_valid() {
        let mut record = record();
        record.check_out = None;
        assert!(record.validate().is_ok());
    }
}
