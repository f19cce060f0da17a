//! Concrete adapter implementations for ports.

pub mod console_report;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod npy_adapter;
