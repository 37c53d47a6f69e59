//! Command-line surface over the registries.
//!
//! Listings go to `out` as CSV; storage warnings and rejected rows go to
//! `err`. A lookup miss becomes [`DeskError::NotFound`] so the binary exits
//! non-zero.

use crate::application::desk::Desk;
use crate::config::{DeskConfig, IdStrategy, StorageConfig};
use crate::domain::attendance::AttendanceStatus;
use crate::domain::class::{ClassPatch, NewClass};
use crate::domain::payment::{Amount, PaymentPatch, PaymentStatus};
use crate::domain::teacher::{NewTeacher, TeacherPatch};
use crate::domain::validation;
use crate::error::{DeskError, Outcome, Result};
use crate::interfaces::csv::record_writer::RecordWriter;
use crate::interfaces::csv::teacher_reader::TeacherReader;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "School administration desk: teachers, classes and payments", long_about = None)]
pub struct Cli {
    /// Directory holding the JSON snapshots. Without it, data lives only for
    /// this invocation.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to a RocksDB database (requires the `storage-rocksdb` feature).
    #[arg(long, global = true, conflicts_with = "data_dir")]
    pub db_path: Option<PathBuf>,

    /// Seed for the payment processor's random source.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Probability that processing a payment succeeds.
    #[arg(long, global = true, default_value_t = crate::application::payments::DEFAULT_SUCCESS_PROBABILITY)]
    pub success_rate: f64,

    /// How new record ids are generated.
    #[arg(long, global = true, value_enum, default_value_t = IdStrategy::Timestamp)]
    pub ids: IdStrategy,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn config(&self) -> DeskConfig {
        let storage = match (&self.data_dir, &self.db_path) {
            (Some(dir), _) => StorageConfig::Files(dir.clone()),
            (None, Some(path)) => StorageConfig::RocksDb(path.clone()),
            (None, None) => StorageConfig::InMemory,
        };
        DeskConfig {
            storage,
            id_strategy: self.ids,
            rng_seed: self.seed,
            success_probability: self.success_rate,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage teachers
    #[command(subcommand)]
    Teachers(TeacherCommand),
    /// Manage classes
    #[command(subcommand)]
    Classes(ClassCommand),
    /// Manage payments
    #[command(subcommand)]
    Payments(PaymentCommand),
    /// Mark and review teacher attendance
    #[command(subcommand)]
    Attendance(AttendanceCommand),
    /// Print dashboard figures
    Summary,
}

#[derive(Subcommand, Debug)]
pub enum TeacherCommand {
    List {
        /// Only teachers whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    Add(TeacherFields),
    /// Bulk-add teachers from a CSV file
    Import { file: PathBuf },
    Update {
        id: String,
        #[command(flatten)]
        fields: TeacherUpdate,
    },
    /// Delete a teacher together with their classes and payments
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct TeacherFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub subject: String,
    /// YYYY-MM-DD; defaults to today
    #[arg(long)]
    pub join_date: Option<String>,
    #[arg(long, default_value = "")]
    pub profile_image: String,
}

#[derive(Args, Debug)]
pub struct TeacherUpdate {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub join_date: Option<String>,
    #[arg(long)]
    pub profile_image: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ClassCommand {
    List {
        /// Only classes whose name, subject or room contains this text
        #[arg(long)]
        search: Option<String>,
    },
    Add(ClassFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: ClassUpdate,
    },
    /// Delete a class together with its payments
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct ClassFields {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub subject: String,
    #[arg(long, default_value = "")]
    pub teacher_id: String,
    #[arg(long, default_value = "")]
    pub schedule: String,
    #[arg(long, default_value = "")]
    pub room: String,
}

#[derive(Args, Debug)]
pub struct ClassUpdate {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub teacher_id: Option<String>,
    #[arg(long)]
    pub schedule: Option<String>,
    #[arg(long)]
    pub room: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommand {
    List {
        #[arg(long)]
        teacher_id: Option<String>,
        #[arg(long)]
        class_id: Option<String>,
        /// Only payments whose description, teacher or class name contains
        /// this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Record a new pending payment
    Initiate {
        #[arg(long)]
        teacher_id: String,
        #[arg(long)]
        class_id: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        description: String,
    },
    /// Run the simulated processor on a pending payment
    Process { id: String },
    /// Administrative edit; any status may be set
    Update {
        id: String,
        #[arg(long)]
        teacher_id: Option<String>,
        #[arg(long)]
        class_id: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum AttendanceCommand {
    /// Record present, absent or leave for a teacher; replaces an earlier
    /// mark for the same date
    Mark {
        #[arg(long)]
        teacher_id: String,
        #[arg(long)]
        status: String,
        /// YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    List {
        #[arg(long)]
        teacher_id: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
}

/// Runs one command against a freshly configured desk.
pub async fn run<O: Write, E: Write>(cli: Cli, out: &mut O, err: &mut E) -> Result<()> {
    let (desk, notice) = cli.config().build()?;
    if let Some(notice) = notice {
        writeln!(err, "{}", notice)?;
    }
    execute(&desk, cli.command, out, err).await
}

pub async fn execute<O: Write, E: Write>(
    desk: &Desk,
    command: Command,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    match command {
        Command::Teachers(cmd) => teachers(desk, cmd, out, err).await,
        Command::Classes(cmd) => classes(desk, cmd, out, err).await,
        Command::Payments(cmd) => payments(desk, cmd, out, err).await,
        Command::Attendance(cmd) => attendance(desk, cmd, out, err).await,
        Command::Summary => {
            let summary = report(desk.summary().await, err)?;
            RecordWriter::new(out).write_one(&summary)
        }
    }
}

async fn teachers<O: Write, E: Write>(
    desk: &Desk,
    cmd: TeacherCommand,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    match cmd {
        TeacherCommand::List { search } => {
            let teachers = match search {
                Some(text) => report(desk.teachers.search(&text).await, err)?,
                None => report(desk.teachers.list().await, err)?,
            };
            RecordWriter::new(out).write_teachers(&teachers)
        }
        TeacherCommand::Add(fields) => {
            let new = new_teacher(fields, desk.today())?;
            let teacher = report(desk.teachers.create(new).await, err)?;
            writeln!(out, "{}", teacher.id)?;
            Ok(())
        }
        TeacherCommand::Import { file } => {
            let reader = TeacherReader::new(File::open(file)?);
            let mut imported = 0usize;
            for (row, result) in reader.teachers().enumerate() {
                match result {
                    Ok(new) => {
                        let teacher = report(desk.teachers.create(new).await, err)?;
                        writeln!(out, "{}", teacher.id)?;
                        imported += 1;
                    }
                    Err(e) => writeln!(err, "Skipping row {}: {}", row + 1, e)?,
                }
            }
            tracing::info!(imported, "Teacher import finished");
            Ok(())
        }
        TeacherCommand::Update { id, fields } => {
            let patch = teacher_patch(fields)?;
            let teacher = found("teacher", &id, report(desk.teachers.update(&id, patch).await, err)?)?;
            RecordWriter::new(out).write_teachers(&[teacher])
        }
        TeacherCommand::Delete { id } => {
            let summary = found("teacher", &id, report(desk.teachers.delete(&id).await, err)?)?;
            writeln!(
                out,
                "Deleted teacher {} ({} classes, {} payments removed)",
                id, summary.classes_removed, summary.payments_removed
            )?;
            Ok(())
        }
    }
}

async fn classes<O: Write, E: Write>(
    desk: &Desk,
    cmd: ClassCommand,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    match cmd {
        ClassCommand::List { search } => {
            let classes = match search {
                Some(text) => report(desk.classes.search(&text).await, err)?,
                None => report(desk.classes.list().await, err)?,
            };
            let names = teacher_names(desk, err).await?;
            RecordWriter::new(out).write_classes(&classes, &names)
        }
        ClassCommand::Add(fields) => {
            let new = NewClass {
                name: validation::required("name", &fields.name)?,
                subject: fields.subject,
                teacher_id: fields.teacher_id,
                schedule: fields.schedule,
                room: fields.room,
            };
            let class = report(desk.classes.create(new).await, err)?;
            writeln!(out, "{}", class.id)?;
            Ok(())
        }
        ClassCommand::Update { id, fields } => {
            let patch = ClassPatch {
                name: fields
                    .name
                    .map(|n| validation::required("name", &n))
                    .transpose()?,
                subject: fields.subject,
                teacher_id: fields.teacher_id,
                schedule: fields.schedule,
                room: fields.room,
            };
            let class = found("class", &id, report(desk.classes.update(&id, patch).await, err)?)?;
            let names = teacher_names(desk, err).await?;
            RecordWriter::new(out).write_classes(&[class], &names)
        }
        ClassCommand::Delete { id } => {
            let summary = found("class", &id, report(desk.classes.delete(&id).await, err)?)?;
            writeln!(
                out,
                "Deleted class {} ({} payments removed)",
                id, summary.payments_removed
            )?;
            Ok(())
        }
    }
}

async fn payments<O: Write, E: Write>(
    desk: &Desk,
    cmd: PaymentCommand,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    let single = match cmd {
        PaymentCommand::List {
            teacher_id,
            class_id,
            search,
        } => {
            let mut payments = match search {
                Some(text) => report(desk.search_payments(&text).await, err)?,
                None => report(desk.payments.list().await, err)?,
            };
            payments.retain(|p| {
                teacher_id.as_ref().is_none_or(|t| &p.teacher_id == t)
                    && class_id.as_ref().is_none_or(|c| &p.class_id == c)
            });
            let teachers = teacher_names(desk, err).await?;
            let classes = class_names(desk, err).await?;
            return RecordWriter::new(out).write_payments(&payments, &teachers, &classes);
        }
        PaymentCommand::Initiate {
            teacher_id,
            class_id,
            amount,
            description,
        } => {
            let teacher_id = validation::required("teacher", &teacher_id)?;
            let class_id = validation::required("class", &class_id)?;
            let amount: Amount = amount.parse()?;
            let description = validation::required("description", &description)?;
            report(
                desk.payments
                    .initiate(&teacher_id, &class_id, amount, &description)
                    .await,
                err,
            )?
        }
        PaymentCommand::Process { id } => {
            found("payment", &id, report(desk.payments.process(&id).await, err)??)?
        }
        PaymentCommand::Update {
            id,
            teacher_id,
            class_id,
            amount,
            date,
            status,
            description,
        } => {
            let patch = PaymentPatch {
                teacher_id,
                class_id,
                amount: amount.map(|a| a.parse::<Amount>()).transpose()?,
                date: date.map(|d| validation::date(&d)).transpose()?,
                status: status.map(|s| s.parse::<PaymentStatus>()).transpose()?,
                description,
            };
            found("payment", &id, report(desk.payments.update(&id, patch).await, err)?)?
        }
        PaymentCommand::Delete { id } => {
            if !report(desk.payments.delete(&id).await, err)? {
                return Err(not_found("payment", &id));
            }
            writeln!(out, "Deleted payment {}", id)?;
            return Ok(());
        }
    };

    let teachers = teacher_names(desk, err).await?;
    let classes = class_names(desk, err).await?;
    RecordWriter::new(out).write_payments(&[single], &teachers, &classes)
}

async fn attendance<O: Write, E: Write>(
    desk: &Desk,
    cmd: AttendanceCommand,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    let records = match cmd {
        AttendanceCommand::Mark {
            teacher_id,
            status,
            date,
        } => {
            let status: AttendanceStatus = status.parse()?;
            let date = match date {
                Some(date) => validation::date(&date)?,
                None => desk.today(),
            };
            if report(desk.teachers.get(&teacher_id).await, err)?.is_none() {
                return Err(not_found("teacher", &teacher_id));
            }
            vec![report(desk.attendance.mark(&teacher_id, date, status).await, err)?]
        }
        AttendanceCommand::List { teacher_id, date } => {
            let date = date.map(|d| validation::date(&d)).transpose()?;
            let mut records = report(desk.attendance.list().await, err)?;
            records.retain(|r| {
                teacher_id.as_ref().is_none_or(|t| &r.teacher_id == t)
                    && date.is_none_or(|d| r.date == d)
            });
            records
        }
    };

    let teachers = teacher_names(desk, err).await?;
    RecordWriter::new(out).write_attendance(&records, &teachers)
}

fn new_teacher(fields: TeacherFields, today: NaiveDate) -> Result<NewTeacher> {
    Ok(NewTeacher {
        name: validation::required("name", &fields.name)?,
        email: validation::email(&fields.email)?,
        phone: fields.phone,
        subject: fields.subject,
        join_date: match fields.join_date {
            Some(date) => validation::date(&date)?,
            None => today,
        },
        profile_image: fields.profile_image,
    })
}

fn teacher_patch(fields: TeacherUpdate) -> Result<TeacherPatch> {
    Ok(TeacherPatch {
        name: fields
            .name
            .map(|n| validation::required("name", &n))
            .transpose()?,
        email: fields.email.map(|e| validation::email(&e)).transpose()?,
        phone: fields.phone,
        subject: fields.subject,
        join_date: fields
            .join_date
            .map(|d| validation::date(&d))
            .transpose()?,
        profile_image: fields.profile_image,
    })
}

async fn teacher_names<E: Write>(desk: &Desk, err: &mut E) -> Result<HashMap<String, String>> {
    let teachers = report(desk.teachers.list().await, err)?;
    Ok(teachers.into_iter().map(|t| (t.id, t.name)).collect())
}

async fn class_names<E: Write>(desk: &Desk, err: &mut E) -> Result<HashMap<String, String>> {
    let classes = report(desk.classes.list().await, err)?;
    Ok(classes.into_iter().map(|c| (c.id, c.name)).collect())
}

/// Prints any storage faults as warnings and hands back the value.
fn report<T, E: Write>(outcome: Outcome<T>, err: &mut E) -> Result<T> {
    for fault in &outcome.faults {
        writeln!(err, "warning: {}", fault)?;
    }
    Ok(outcome.value)
}

fn found<T>(kind: &'static str, id: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| not_found(kind, id))
}

fn not_found(kind: &'static str, id: &str) -> DeskError {
    DeskError::NotFound {
        kind,
        id: id.to_string(),
    }
}
