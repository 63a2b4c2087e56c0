use std::io::Read;

use chrono::NaiveDate;
use tracing::info;

use opsdesk_core::{AttendanceRecord, Role, ServiceError, User, Validate};

use crate::attendance_import::{import_attendance_csv, AttendanceImportReport};
use crate::repositories::{Repository, Stores};

use super::{ensure_role, storage};

pub struct AttendanceService {
    stores: Stores,
}

impl AttendanceService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Manual entry; saving is an upsert, so correcting a day is just
    /// recording it again.
    pub async fn record(
        &self,
        record: AttendanceRecord,
        actor: &User,
    ) -> Result<AttendanceRecord, ServiceError> {
        ensure_role(
            actor,
            &[Role::Admin, Role::GeneralManager, Role::HrManager],
            "record attendance",
        )?;
        record.validate()?;
        self.stores.attendance.save(record.clone()).await.map_err(storage)?;
        Ok(record)
    }

    /// Bulk CSV import. Valid rows are persisted; bad rows come back in
    /// the report without blocking the rest.
    pub async fn import_csv(
        &self,
        input: impl Read,
        actor: &User,
    ) -> Result<AttendanceImportReport, ServiceError> {
        ensure_role(
            actor,
            &[Role::Admin, Role::GeneralManager, Role::HrManager],
            "import attendance",
        )?;

        let report = import_attendance_csv(input)
            .map_err(|error| ServiceError::Storage(error.to_string()))?;
        for record in &report.imported {
            self.stores.attendance.save(record.clone()).await.map_err(storage)?;
        }
        info!(
            imported = report.imported.len(),
            rejected = report.errors.len(),
            actor = %actor.username,
            "attendance imported"
        );
        Ok(report)
    }

    pub async fn for_employee(&self, employee_id: &str) -> Vec<AttendanceRecord> {
        self.stores.attendance.list_where(|r| r.employee_id.0 == employee_id).await
    }

    pub async fn for_date(&self, date: NaiveDate) -> Vec<AttendanceRecord> {
        self.stores.attendance.list_where(|r| r.date == date).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use opsdesk_core::{AttendanceRecord, AttendanceStatus, Role, ServiceError, User, UserId};

    use crate::repositories::Stores;

    use super::AttendanceService;

    fn user(name: &str, role: Role) -> User {
        User {
            id: UserId(format!("u-{name}")),
            username: name.to_owned(),
            display_name: name.to_owned(),
            email: format!("{name}@agency.test"),
            role,
            active: true,
        }
    }

    fn record(employee: &str, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("ATT-u-{employee}-2024-03-{day:02}"),
            employee_id: UserId(format!("u-{employee}")),
            date: NaiveDate::from_ymd_opt(2024, 3, day).expect("date"),
            check_in: NaiveTime::from_hms_opt(9, 0, 0),
            check_out: NaiveTime::from_hms_opt(17, 0, 0),
            status: AttendanceStatus::Present,
            notes: None,
            location: None,
        }
    }

    fn service() -> (Stores, AttendanceService) {
        let stores = Stores::default();
        let service = AttendanceService::new(stores.clone());
        (stores, service)
    }

    #[tokio::test]
    async fn manual_entry_upserts_by_id() {
        let (_, service) = service();
        let hr = user("hana", Role::HrManager);

        service.record(record("dana", 4), &hr).await.expect("record");
        let mut corrected = record("dana", 4);
        corrected.status = AttendanceStatus::HalfDay;
        service.record(corrected, &hr).await.expect("correct");

        let days = service.for_employee("u-dana").await;
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].status, AttendanceStatus::HalfDay);
    }

    #[tokio::test]
    async fn employees_cannot_write_attendance() {
        let (_, service) = service();
        let error = service
            .record(record("dana", 5), &user("dana", Role::Employee))
            .await
            .expect_err("employee refused");
        assert!(matches!(error, ServiceError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn csv_import_persists_only_the_valid_rows() {
        let (_, service) = service();
        let hr = user("hana", Role::HrManager);
        let csv = "employee_id,date,check_in,check_out,notes,location\n\
                   u-dana,2024-03-06,09:00,17:00,,\n\
                   u-omar,not-a-date,09:00,17:00,,\n\
                   u-omar,2024-03-06,,,sick,\n";

        let report = service.import_csv(csv.as_bytes(), &hr).await.expect("import");
        assert_eq!(report.imported.len(), 2);
        assert_eq!(report.errors.len(), 1);

        let that_day = service
            .for_date(NaiveDate::from_ymd_opt(2024, 3, 6).expect("date"))
            .await;
        assert_eq!(that_day.len(), 2);
        assert!(that_day
            .iter()
            .any(|r| r.employee_id.0 == "u-omar" && r.status == AttendanceStatus::Absent));
    }
}
