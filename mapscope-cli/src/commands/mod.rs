pub mod chart;
pub mod common;
pub mod report;
