//! MiniJinja templates for narrative paragraphs
//!
//! Rendering never fails the caller: [`ReportTemplates::render_or`] logs the
//! template error and returns a plain-text fallback instead.

use minijinja::Environment;
use serde::Serialize;
use tracing::warn;

pub const EXECUTIVE_SUMMARY: &str = "executive_summary";
pub const PORTFOLIO_SUMMARY: &str = "portfolio_summary";

const EXECUTIVE_SUMMARY_TEMPLATE: &str = "\
Across {{ source_count }} {% if source_count == 1 %}analysis{% else %}analyses{% endif %}, \
the overall view on {{ subject }} is **{{ dominant }}** with {{ confidence | pct }} weighted confidence. \
{% if short_term_votes > 0 %}Short-term signals favour {{ short_term }} ({{ short_term_votes }} weighted votes). {% endif %}\
{% if long_term_votes > 0 %}Longer-term signals favour {{ long_term }} ({{ long_term_votes }} weighted votes).{% endif %}";

const PORTFOLIO_SUMMARY_TEMPLATE: &str = "\
{% if vix is none %}No VIX reading was supplied, so the plan assumes a level of {{ effective_vix }}{% else %}The VIX stands at {{ vix }} and is {{ trend }}{% endif %}: \
{{ regime_description }}. \
The {{ regime }} regime plan puts {{ income | pct }} in option-ETF income, \
{{ short_term | pct }} in short-term treasuries and {{ long_duration | pct }} in long-duration treasuries.";

/// Named templates used in reports and summaries
#[derive(Debug)]
pub struct ReportTemplates {
    env: Environment<'static>,
}

impl Default for ReportTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportTemplates {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_filter("pct", |value: f64| format!("{:.1}%", value * 100.0));

        for (name, source) in [
            (EXECUTIVE_SUMMARY, EXECUTIVE_SUMMARY_TEMPLATE),
            (PORTFOLIO_SUMMARY, PORTFOLIO_SUMMARY_TEMPLATE),
        ] {
            if let Err(e) = env.add_template(name, source) {
                warn!(template = name, error = %e, "failed to compile template");
            }
        }

        Self { env }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Render `name`, falling back to `fallback()` on any template error
    pub fn render_or<S: Serialize>(&self, name: &str, ctx: S, fallback: impl FnOnce() -> String) -> String {
        match self.render(name, ctx) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(template = name, error = %e, "template render failed, using plain text");
                fallback()
            }
        }
    }
}
