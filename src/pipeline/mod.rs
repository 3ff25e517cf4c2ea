// src/pipeline/mod.rs

pub mod driver;
pub mod metrics;

pub use driver::Driver;
pub use metrics::MetricsSummary;
