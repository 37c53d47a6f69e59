use super::record::Record;
use crate::error::DeskError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Leave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Leave => "leave",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeskError::Validation(format!("unknown attendance status `{}`", s)))
    }
}

/// One teacher's attendance on one day. A teacher has at most one record
/// per date; marking again replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub teacher_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl Record for AttendanceRecord {
    const KEY: &'static str = "attendance";
    type Patch = AttendanceStatus;

    /// `<teacherId>@<date>`; records carry no id of their own.
    fn id(&self) -> Cow<'_, str> {
        Cow::Owned(attendance_key(&self.teacher_id, self.date))
    }

    fn apply(&mut self, status: AttendanceStatus) {
        self.status = status;
    }

    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

pub fn attendance_key(teacher_id: &str, date: NaiveDate) -> String {
    format!("{}@{}", teacher_id, date)
}
