//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod format;
pub mod text_report;
pub mod tsv_report;
