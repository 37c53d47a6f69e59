pub mod record_writer;
pub mod teacher_reader;
