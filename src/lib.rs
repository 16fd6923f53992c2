pub mod api;
pub mod app;
pub mod config;
pub mod document;
pub mod record;
pub mod report;
pub mod report_error;
pub mod scanner;
pub mod series;
pub mod template;
pub mod writer;

pub use report::{MeterReport, ReportOptions, RunSummary};
pub use report_error::ReportError;
