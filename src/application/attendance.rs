use super::collection::Collection;
use crate::domain::attendance::{AttendanceRecord, AttendanceStatus};
use crate::domain::ports::SharedStore;
use crate::error::Outcome;
use chrono::NaiveDate;
use tracing::info;

/// Daily attendance per teacher. Starts empty; records are not removed when
/// their teacher is deleted.
pub struct AttendanceBook {
    records: Collection<AttendanceRecord>,
}

impl AttendanceBook {
    pub fn new(store: SharedStore) -> Self {
        Self {
            records: Collection::new(store),
        }
    }

    pub async fn list(&self) -> Outcome<Vec<AttendanceRecord>> {
        self.records.list().await
    }

    /// Records the teacher's status for the day, replacing an earlier mark
    /// for the same date.
    pub async fn mark(
        &self,
        teacher_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Outcome<AttendanceRecord> {
        info!(teacher_id, %date, %status, "Attendance marked");
        self.records
            .upsert(AttendanceRecord {
                teacher_id: teacher_id.to_string(),
                date,
                status,
            })
            .await
    }

    pub async fn for_teacher(&self, teacher_id: &str) -> Outcome<Vec<AttendanceRecord>> {
        self.list()
            .await
            .map(|all| all.into_iter().filter(|r| r.teacher_id == teacher_id).collect())
    }

    pub async fn on_date(&self, date: NaiveDate) -> Outcome<Vec<AttendanceRecord>> {
        self.list()
            .await
            .map(|all| all.into_iter().filter(|r| r.date == date).collect())
    }

    /// The teacher's mark for one day, if any.
    pub async fn get(
        &self,
        teacher_id: &str,
        date: NaiveDate,
    ) -> Outcome<Option<AttendanceRecord>> {
        self.list().await.map(|all| {
            all.into_iter()
                .find(|r| r.teacher_id == teacher_id && r.date == date)
        })
    }
}
