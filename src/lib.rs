pub mod config;
pub mod dataset;
pub mod error;
pub mod load;
pub mod process;
pub mod report;
