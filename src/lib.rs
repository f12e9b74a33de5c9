pub mod config;
pub mod engine;
pub mod output;
pub mod parser;
pub mod stats;
pub mod table;

pub use config::ReportConfig;
pub use engine::analyzer::{ProcessOptions, ProcessOutcome, process_workbook};
