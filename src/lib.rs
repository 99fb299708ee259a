pub mod aggregate;
pub mod chart;
pub mod dispatch;
pub mod records;
pub mod report;
pub mod store;
