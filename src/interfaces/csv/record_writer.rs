use crate::domain::attendance::AttendanceRecord;
use crate::domain::class::Class;
use crate::domain::payment::Payment;
use crate::domain::teacher::Teacher;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Flat CSV view of a class with its teacher resolved to a display name.
#[derive(Debug, Serialize)]
struct ClassRow<'a> {
    id: &'a str,
    name: &'a str,
    subject: &'a str,
    teacher: &'a str,
    schedule: &'a str,
    room: &'a str,
}

/// Flat CSV view of a payment; every row carries the same columns.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRow<'a> {
    id: &'a str,
    teacher: &'a str,
    class: &'a str,
    amount: String,
    date: String,
    status: &'a str,
    description: &'a str,
    transaction_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceRow<'a> {
    teacher_id: &'a str,
    teacher: &'a str,
    date: String,
    status: &'a str,
}

/// Writes registry listings as CSV with a header row.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_teachers(&mut self, teachers: &[Teacher]) -> Result<()> {
        if teachers.is_empty() {
            self.writer.write_record([
                "id",
                "name",
                "email",
                "phone",
                "subject",
                "joinDate",
                "profileImage",
            ])?;
        }
        for teacher in teachers {
            self.writer.serialize(teacher)?;
        }
        self.flush()
    }

    /// `teacher_names` maps teacher ids to names; unknown ids show as
    /// "Unassigned".
    pub fn write_classes(
        &mut self,
        classes: &[Class],
        teacher_names: &HashMap<String, String>,
    ) -> Result<()> {
        if classes.is_empty() {
            self.writer
                .write_record(["id", "name", "subject", "teacher", "schedule", "room"])?;
        }
        for class in classes {
            self.writer.serialize(ClassRow {
                id: &class.id,
                name: &class.name,
                subject: &class.subject,
                teacher: label(teacher_names, &class.teacher_id),
                schedule: &class.schedule,
                room: &class.room,
            })?;
        }
        self.flush()
    }

    pub fn write_payments(
        &mut self,
        payments: &[Payment],
        teacher_names: &HashMap<String, String>,
        class_names: &HashMap<String, String>,
    ) -> Result<()> {
        if payments.is_empty() {
            self.writer.write_record([
                "id",
                "teacher",
                "class",
                "amount",
                "date",
                "status",
                "description",
                "transactionId",
            ])?;
        }
        for payment in payments {
            self.writer.serialize(PaymentRow {
                id: &payment.id,
                teacher: label(teacher_names, &payment.teacher_id),
                class: label(class_names, &payment.class_id),
                amount: payment.amount.to_string(),
                date: payment.date.to_string(),
                status: payment.status.as_str(),
                description: &payment.description,
                transaction_id: payment.transaction_id.as_deref().unwrap_or(""),
            })?;
        }
        self.flush()
    }

    pub fn write_attendance(
        &mut self,
        records: &[AttendanceRecord],
        teacher_names: &HashMap<String, String>,
    ) -> Result<()> {
        if records.is_empty() {
            self.writer
                .write_record(["teacherId", "teacher", "date", "status"])?;
        }
        for record in records {
            self.writer.serialize(AttendanceRow {
                teacher_id: &record.teacher_id,
                teacher: label(teacher_names, &record.teacher_id),
                date: record.date.to_string(),
                status: record.status.as_str(),
            })?;
        }
        self.flush()
    }

    /// Writes a single serializable row with its header, e.g. a summary.
    pub fn write_one<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.writer.serialize(row)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn label<'a>(names: &'a HashMap<String, String>, id: &str) -> &'a str {
    names
        .get(id)
        .map(String::as_str)
        .unwrap_or(crate::application::desk::UNASSIGNED)
}
