pub mod recording;
pub mod run_report;
