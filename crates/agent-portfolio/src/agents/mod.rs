//! Agents exposed through the `Agent` trait

pub mod report;
pub mod summary;

pub use report::ReportGenerationAgent;
pub use summary::NaturalLanguageSummaryAgent;
