//! Outer surfaces: the command line and CSV import/export.

pub mod cli;
pub mod csv;
