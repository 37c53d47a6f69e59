use crate::domain::teacher::NewTeacher;
use crate::domain::validation;
use crate::error::{DeskError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeacherRow {
    name: String,
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    subject: String,
    join_date: String,
    #[serde(default)]
    profile_image: String,
}

impl TryFrom<TeacherRow> for NewTeacher {
    type Error = DeskError;

    fn try_from(row: TeacherRow) -> Result<Self> {
        Ok(NewTeacher {
            name: validation::required("name", &row.name)?,
            email: validation::email(&row.email)?,
            phone: row.phone,
            subject: row.subject,
            join_date: validation::date(&row.join_date)?,
            profile_image: row.profile_image,
        })
    }
}

/// Reads teachers for bulk import from a CSV source.
///
/// Expects a header row with `name,email,phone,subject,joinDate,profileImage`;
/// each row is validated the same way a single `teachers add` is.
pub struct TeacherReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TeacherReader<R> {
    /// Creates a new `TeacherReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one validated teacher (or the reason it was rejected)
    /// per data row.
    pub fn teachers(self) -> impl Iterator<Item = Result<NewTeacher>> {
        self.reader.into_deserialize().map(|result| {
            let row: TeacherRow = result.map_err(DeskError::from)?;
            NewTeacher::try_from(row)
        })
    }
}
