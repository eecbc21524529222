//! Per-target result records, the run summary, and tabular export.

pub mod export;
pub mod record;

pub use export::{CSV_HEADER, default_output_path, write_csv, write_records};
pub use record::{RecordFields, ResultRecord, RunSummary, record, summarize};
