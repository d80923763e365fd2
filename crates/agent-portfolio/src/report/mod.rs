//! Report composition: voting, templates and Markdown rendering

pub mod composer;
pub mod markdown;
pub mod templates;
pub mod voting;

pub use composer::{
    AttributedRecommendation, InvestmentReport, ReportComposer, merge_metrics, merge_risks,
    overall_confidence,
};
pub use markdown::MarkdownBuilder;
pub use templates::ReportTemplates;
pub use voting::{VoteOutcome, VoteTally, tally_recommendations};
