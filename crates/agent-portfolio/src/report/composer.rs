//! Report composer
//!
//! Merges the outputs of several analyses into one [`InvestmentReport`]:
//! a weighted overall confidence, a conviction-weighted dominant action and
//! a Markdown document. Composition is pure and never fails.

use crate::config::{ReportConfig, SourceWeights};
use crate::model::{Action, AnalysisSource, Recommendation, ReportRequest, SourcedOutput};
use crate::report::markdown::MarkdownBuilder;
use crate::report::templates::{EXECUTIVE_SUMMARY, ReportTemplates};
use crate::report::voting::{VoteOutcome, tally_recommendations};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// A recommendation together with the analysis that made it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedRecommendation {
    pub source: AnalysisSource,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}

/// Composed investment report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReport {
    pub subject: String,
    pub generated_at: DateTime<Utc>,
    pub dominant_action: Action,
    pub short_term_action: Action,
    pub long_term_action: Action,
    pub overall_confidence: f64,
    pub votes: VoteOutcome,
    /// Weight applied to each source that contributed
    pub source_weights: BTreeMap<String, f64>,
    pub sources: Vec<AnalysisSource>,
    pub recommendations: Vec<AttributedRecommendation>,
    pub risks: Vec<String>,
    /// Metrics keyed `<source>.<metric>`
    pub metrics: BTreeMap<String, Value>,
    pub markdown: String,
}

/// Weighted mean of output confidences
///
/// Falls back to the plain mean when every present source has zero weight,
/// and to 0 when there are no outputs.
pub fn overall_confidence(outputs: &[SourcedOutput], weights: &SourceWeights) -> f64 {
    if outputs.is_empty() {
        return 0.0;
    }

    let confidences: Vec<(f64, f64)> = outputs
        .iter()
        .map(|o| {
            let c = o.output.confidence;
            (weights.weight(o.source).max(0.0), if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 })
        })
        .collect();

    let weight_sum: f64 = confidences.iter().map(|(w, _)| w).sum();
    let value = if weight_sum > 0.0 {
        confidences.iter().map(|(w, c)| w * c).sum::<f64>() / weight_sum
    } else {
        confidences.iter().map(|(_, c)| c).sum::<f64>() / confidences.len() as f64
    };

    if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

/// Risks in first-seen order, blank and duplicate entries removed
pub fn merge_risks(outputs: &[SourcedOutput]) -> Vec<String> {
    let mut seen = HashSet::new();
    outputs
        .iter()
        .flat_map(|o| o.output.risks.iter())
        .map(|r| r.trim())
        .filter(|r| !r.is_empty() && seen.insert(r.to_string()))
        .map(str::to_string)
        .collect()
}

/// Metrics from every output, prefixed with the source key
///
/// A source that appears more than once gets a numbered prefix from its
/// second output on (`technical_2.rsi`), so no metric is overwritten.
pub fn merge_metrics(outputs: &[SourcedOutput]) -> BTreeMap<String, Value> {
    let mut seen: HashMap<AnalysisSource, usize> = HashMap::new();
    let mut merged = BTreeMap::new();
    for o in outputs {
        let occurrence = seen.entry(o.source).or_default();
        *occurrence += 1;
        let prefix = if *occurrence == 1 {
            o.source.key().to_string()
        } else {
            debug!(
                source = o.source.key(),
                occurrence = *occurrence,
                "repeated source; numbering its metric keys"
            );
            format!("{}_{occurrence}", o.source.key())
        };
        for (k, v) in &o.output.metrics {
            merged.insert(format!("{prefix}.{k}"), v.clone());
        }
    }
    merged
}

#[derive(Debug, Default)]
pub struct ReportComposer {
    config: ReportConfig,
    templates: ReportTemplates,
}

impl ReportComposer {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            templates: ReportTemplates::new(),
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn compose_request(&self, request: &ReportRequest, generated_at: DateTime<Utc>) -> InvestmentReport {
        self.compose(&request.subject, &request.outputs, generated_at)
    }

    /// Compose a report from the given analysis outputs
    pub fn compose(
        &self,
        subject: &str,
        outputs: &[SourcedOutput],
        generated_at: DateTime<Utc>,
    ) -> InvestmentReport {
        let outputs: Vec<SourcedOutput> = outputs
            .iter()
            .map(|o| SourcedOutput::new(o.source, o.output.clone().normalized()))
            .collect();

        let weights = &self.config.source_weights;
        let confidence = overall_confidence(&outputs, weights);
        let votes = tally_recommendations(outputs.iter().flat_map(|o| o.output.recommendations.iter()));
        debug!(
            subject,
            sources = outputs.len(),
            confidence,
            dominant = %votes.dominant,
            "composing report"
        );

        let mut sources = Vec::new();
        let mut source_weights = BTreeMap::new();
        for o in &outputs {
            if !sources.contains(&o.source) {
                sources.push(o.source);
                source_weights.insert(o.source.key().to_string(), weights.weight(o.source));
            }
        }

        let recommendations = outputs
            .iter()
            .flat_map(|o| {
                o.output.recommendations.iter().map(|r| AttributedRecommendation {
                    source: o.source,
                    recommendation: r.clone(),
                })
            })
            .collect::<Vec<_>>();

        let mut report = InvestmentReport {
            subject: subject.to_string(),
            generated_at,
            dominant_action: votes.dominant,
            short_term_action: votes.short_term,
            long_term_action: votes.long_term,
            overall_confidence: confidence,
            votes,
            source_weights,
            sources,
            recommendations,
            risks: merge_risks(&outputs),
            metrics: merge_metrics(&outputs),
            markdown: String::new(),
        };
        report.markdown = self.render_markdown(&report, &outputs);
        report
    }

    fn executive_summary(&self, report: &InvestmentReport, source_count: usize) -> String {
        if source_count == 0 {
            return format!(
                "No analyses were available for {}; the report defaults to HOLD.",
                report.subject
            );
        }

        let ctx = json!({
            "subject": report.subject,
            "source_count": source_count,
            "dominant": report.dominant_action.as_str(),
            "confidence": report.overall_confidence,
            "short_term": report.short_term_action.as_str(),
            "short_term_votes": report.votes.short_term_votes,
            "long_term": report.long_term_action.as_str(),
            "long_term_votes": report.votes.long_term_votes,
        });
        self.templates.render_or(EXECUTIVE_SUMMARY, ctx, || {
            format!(
                "The overall view on {} is {} with {} weighted confidence.",
                report.subject,
                report.dominant_action,
                pct(report.overall_confidence)
            )
        })
    }

    fn render_markdown(&self, report: &InvestmentReport, outputs: &[SourcedOutput]) -> String {
        let weights = &self.config.source_weights;

        let mut doc = MarkdownBuilder::new()
            .title(format!("{}: {}", self.config.title_prefix, report.subject))
            .line(format!(
                "*Generated {}*",
                report.generated_at.format("%Y-%m-%d %H:%M UTC")
            ))
            .section("Executive Summary")
            .paragraph(self.executive_summary(report, outputs.len()))
            .blank_line()
            .field("Dominant action", report.dominant_action.as_str())
            .field("Overall confidence", pct(report.overall_confidence))
            .field("Short-term action", report.short_term_action.as_str())
            .field("Long-term action", report.long_term_action.as_str())
            .section("Analyst Perspectives");

        if outputs.is_empty() {
            doc = doc.paragraph("No analyst output was provided.");
        }
        for o in outputs {
            doc = doc
                .subsection(o.source.title())
                .line(format!(
                    "**Confidence**: {} (weight {:.2})",
                    pct(o.output.confidence),
                    weights.weight(o.source)
                ))
                .blank_line()
                .paragraph(&o.output.summary)
                .when_with(!o.output.detailed_analysis.trim().is_empty(), |b| {
                    b.blank_line().paragraph(&o.output.detailed_analysis)
                });
        }

        doc = doc.section("Recommendations");
        doc = if report.recommendations.is_empty() {
            doc.paragraph("No recommendations were made; the default action is HOLD.")
        } else {
            doc.table(
                ["Source", "Action", "Symbol", "Timeframe", "Conviction", "Rationale"],
                report.recommendations.iter().map(|r| {
                    let rec = &r.recommendation;
                    vec![
                        r.source.key().to_string(),
                        rec.action.to_string(),
                        if rec.symbol.is_empty() { report.subject.clone() } else { rec.symbol.clone() },
                        rec.timeframe.label().to_string(),
                        rec.conviction.label().to_string(),
                        rec.rationale.clone(),
                    ]
                }),
            )
        };

        doc = doc.section("Key Risks");
        doc = if report.risks.is_empty() {
            doc.paragraph("No risks were flagged.")
        } else {
            doc.bullets(report.risks.iter().cloned())
        };

        if self.config.include_metrics && !report.metrics.is_empty() {
            doc = doc.section("Key Metrics").table(
                ["Metric", "Value"],
                report
                    .metrics
                    .iter()
                    .map(|(k, v)| vec![k.clone(), display_value(v)]),
            );
        }

        doc.when_with(!self.config.disclaimer.trim().is_empty(), |b| {
            b.horizontal_rule().line(format!("*{}*", self.config.disclaimer.trim()))
        })
        .build()
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "n/a".to_string(),
        other => other.to_string(),
    }
}

fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentOutput, Conviction, Timeframe};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 30, 0).unwrap()
    }

    fn sourced(source: AnalysisSource, confidence: f64) -> SourcedOutput {
        SourcedOutput::new(source, AgentOutput::new(format!("{source} view"), "", confidence))
    }

    #[test]
    fn test_weighted_confidence() {
        let outputs = [
            sourced(AnalysisSource::Fundamental, 0.8),
            sourced(AnalysisSource::Technical, 0.4),
        ];
        // (0.30*0.8 + 0.25*0.4) / 0.55
        let expected = (0.24 + 0.10) / 0.55;
        assert_relative_eq!(
            overall_confidence(&outputs, &SourceWeights::default()),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_confidence_edge_cases() {
        assert_eq!(overall_confidence(&[], &SourceWeights::default()), 0.0);

        let zero = SourceWeights {
            fundamental: 0.0,
            technical: 0.0,
            sentiment: 0.0,
            macro_economic: 0.0,
            portfolio: 0.0,
        };
        let outputs = [
            sourced(AnalysisSource::Macro, 0.2),
            sourced(AnalysisSource::Sentiment, 0.6),
        ];
        assert_relative_eq!(overall_confidence(&outputs, &zero), 0.4, epsilon = 1e-12);

        let mut wild = sourced(AnalysisSource::Technical, 0.5);
        wild.output.confidence = 12.0;
        assert_eq!(overall_confidence(&[wild], &SourceWeights::default()), 1.0);
    }

    #[test]
    fn test_risks_deduplicated_in_order() {
        let outputs = [
            SourcedOutput::new(
                AnalysisSource::Macro,
                AgentOutput::default().with_risk("Rate shock").with_risk(" "),
            ),
            SourcedOutput::new(
                AnalysisSource::Technical,
                AgentOutput::default().with_risk("Breakdown below 50DMA").with_risk("Rate shock "),
            ),
        ];
        assert_eq!(merge_risks(&outputs), vec!["Rate shock", "Breakdown below 50DMA"]);
    }

    #[test]
    fn test_metrics_prefixed_by_source() {
        let outputs = [SourcedOutput::new(
            AnalysisSource::Fundamental,
            AgentOutput::default().with_metric("pe_ratio", json!(24.5)),
        )];
        let metrics = merge_metrics(&outputs);
        assert_eq!(metrics.get("fundamental.pe_ratio"), Some(&json!(24.5)));
    }

    #[test]
    fn test_repeated_source_metrics_are_numbered() {
        let outputs = [
            SourcedOutput::new(
                AnalysisSource::Technical,
                AgentOutput::default().with_metric("rsi", json!(72)),
            ),
            SourcedOutput::new(
                AnalysisSource::Technical,
                AgentOutput::default().with_metric("rsi", json!(65)),
            ),
        ];
        let metrics = merge_metrics(&outputs);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.get("technical.rsi"), Some(&json!(72)));
        assert_eq!(metrics.get("technical_2.rsi"), Some(&json!(65)));
    }

    #[test]
    fn test_free_text_rationale_keeps_table_shape() {
        let request = ReportRequest::new("QQQI").with_output(
            AnalysisSource::Technical,
            AgentOutput::new("Stretched", "", 0.6).with_recommendation(
                Recommendation::new(Action::Buy, "QQQI").rationale("RSI 72 | overbought\nbut trend intact"),
            ),
        );
        let md = ReportComposer::default().compose_request(&request, at()).markdown;

        let start = md.find("## Recommendations").unwrap();
        let table: Vec<&str> = md[start..]
            .lines()
            .skip_while(|l| !l.starts_with('|'))
            .take_while(|l| l.starts_with('|'))
            .collect();
        assert_eq!(table.len(), 3, "{md}");
        let columns = |line: &str| line.replace("\\|", "").matches('|').count();
        assert!(table.iter().all(|l| columns(l) == columns(table[0])), "{md}");
        assert!(table[2].contains("overbought but trend intact"));
    }

    #[test]
    fn test_compose_full_report() {
        let request = ReportRequest::new("QQQI")
            .with_output(
                AnalysisSource::Technical,
                AgentOutput::new("Momentum is positive", "Price above both moving averages", 0.7)
                    .with_recommendation(
                        Recommendation::new(Action::Buy, "QQQI")
                            .timeframe(Timeframe::ShortTerm)
                            .conviction(Conviction::High)
                            .rationale("Breakout"),
                    )
                    .with_risk("Overbought RSI"),
            )
            .with_output(
                AnalysisSource::Fundamental,
                AgentOutput::new("Distribution looks sustainable", "", 0.6)
                    .with_recommendation(
                        Recommendation::new(Action::Hold, "QQQI").timeframe(Timeframe::LongTerm),
                    )
                    .with_metric("distribution_yield", json!(0.138)),
            );

        let report = ReportComposer::default().compose_request(&request, at());

        assert_eq!(report.dominant_action, Action::Buy);
        assert_eq!(report.short_term_action, Action::Buy);
        assert_eq!(report.long_term_action, Action::Hold);
        assert_eq!(report.sources, vec![AnalysisSource::Technical, AnalysisSource::Fundamental]);
        assert_eq!(report.recommendations.len(), 2);
        assert!((0.0..=1.0).contains(&report.overall_confidence));

        let md = &report.markdown;
        assert!(md.starts_with("# Investment Report: QQQI"));
        assert!(md.contains("*Generated 2025-03-14 15:30 UTC*"));
        assert!(md.contains("## Executive Summary"));
        assert!(md.contains("### Technical Analysis"));
        assert!(md.contains("Price above both moving averages"));
        assert!(md.contains("Breakout"));
        assert!(md.contains("- Overbought RSI"));
        assert!(md.contains("fundamental.distribution_yield"));
        assert!(md.contains("not investment advice"));

        let order = ["## Executive Summary", "## Analyst Perspectives", "## Recommendations", "## Key Risks", "## Key Metrics"];
        let positions: Vec<usize> = order.iter().map(|h| md.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_compose_empty_defaults_to_hold() {
        let report = ReportComposer::default().compose("SPYI", &[], at());
        assert_eq!(report.dominant_action, Action::Hold);
        assert_eq!(report.overall_confidence, 0.0);
        assert!(report.markdown.contains("defaults to HOLD"));
        assert!(!report.markdown.contains("## Key Metrics"));
    }

    #[test]
    fn test_metrics_section_can_be_disabled() {
        let config = ReportConfig {
            include_metrics: false,
            disclaimer: String::new(),
            ..ReportConfig::default()
        };
        let outputs = [SourcedOutput::new(
            AnalysisSource::Macro,
            AgentOutput::new("Curve steepening", "", 0.5).with_metric("ten_year", json!(4.3)),
        )];
        let report = ReportComposer::new(config).compose("TLT", &outputs, at());
        assert!(!report.markdown.contains("## Key Metrics"));
        assert!(!report.markdown.contains("---"));
        assert_eq!(report.metrics.len(), 1);
    }
}
