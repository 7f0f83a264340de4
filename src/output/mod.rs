//! Output module: analysis reports and their formatters

pub mod report;
pub mod formatter;
