//! Natural-language portfolio summary agent
//!
//! Reads a [`PortfolioSnapshot`], computes the target allocation and explains
//! it: market regime, holdings, rotation signals, what to buy or trim, and
//! the risks worth watching.

use agent_core::{Agent, Context, context::keys};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::allocation::{AllocationCalculator, VolatilityRegime};
use crate::config::{PortfolioConfig, SummaryConfig};
use crate::error::PortfolioError;
use crate::model::{
    Action, AgentOutput, AllocationPlan, BucketKind, Conviction, Holding, PortfolioSnapshot,
    Recommendation, RiskLevel, Timeframe, Urgency,
};
use crate::report::{MarkdownBuilder, ReportTemplates, templates::PORTFOLIO_SUMMARY};

const BASE_CONFIDENCE: f64 = 0.85;
const MISSING_VIX_PENALTY: f64 = 0.15;
const NO_HOLDINGS_PENALTY: f64 = 0.10;
const EXTREME_REGIME_PENALTY: f64 = 0.10;

/// Agent turning a portfolio snapshot into a plain-English summary
#[derive(Debug, Default)]
pub struct NaturalLanguageSummaryAgent {
    calculator: AllocationCalculator,
    settings: SummaryConfig,
    templates: ReportTemplates,
}

impl NaturalLanguageSummaryAgent {
    pub fn new(config: &PortfolioConfig) -> Self {
        Self {
            calculator: AllocationCalculator::new(config.allocation.clone()),
            settings: config.summary,
            templates: ReportTemplates::new(),
        }
    }

    pub fn calculator(&self) -> &AllocationCalculator {
        &self.calculator
    }

    /// Compute the plan and summarize the snapshot against it
    pub fn summarize(&self, snapshot: &PortfolioSnapshot) -> (AllocationPlan, AgentOutput) {
        let plan = self.calculator.calculate(snapshot);
        let output = self.summarize_with_plan(snapshot, &plan);
        (plan, output)
    }

    /// Summarize the snapshot against an already computed plan
    pub fn summarize_with_plan(&self, snapshot: &PortfolioSnapshot, plan: &AllocationPlan) -> AgentOutput {
        let mut output = AgentOutput::new(
            self.summary_paragraph(snapshot, plan),
            self.detailed_analysis(snapshot, plan),
            self.confidence(snapshot, plan),
        );
        output.recommendations = self.recommendations(snapshot, plan);
        output.risks = self.risks(snapshot, plan);

        let sharpe = sharpe_or_zero(snapshot);
        output = output
            .with_metric("vix", json!(snapshot.effective_vix()))
            .with_metric("vix_reported", json!(snapshot.has_valid_vix()))
            .with_metric("regime", json!(plan.regime.label()))
            .with_metric("risk_level", json!(snapshot.risk_level.label()))
            .with_metric("sharpe_ratio", json!(sharpe))
            .with_metric("income_pie_total", json!(plan.income_pie.total))
            .with_metric("short_term_treasury_total", json!(plan.short_term_treasury.total))
            .with_metric("long_duration_treasury_total", json!(plan.long_duration_treasury.total));

        debug!(
            regime = plan.regime.label(),
            recommendations = output.recommendations.len(),
            risks = output.risks.len(),
            "portfolio summary built"
        );
        output
    }

    fn confidence(&self, snapshot: &PortfolioSnapshot, plan: &AllocationPlan) -> f64 {
        let mut confidence = BASE_CONFIDENCE;
        if !snapshot.has_valid_vix() {
            confidence -= MISSING_VIX_PENALTY;
        }
        if snapshot.holdings.is_empty() {
            confidence -= NO_HOLDINGS_PENALTY;
        }
        if plan.regime == VolatilityRegime::Extreme {
            confidence -= EXTREME_REGIME_PENALTY;
        }
        confidence
    }

    fn sharpe_commentary(&self, sharpe: f64) -> &'static str {
        if sharpe >= self.settings.strong_sharpe {
            "strong risk-adjusted returns"
        } else if sharpe >= self.settings.weak_sharpe {
            "acceptable risk-adjusted returns"
        } else if sharpe >= 0.0 {
            "weak risk-adjusted returns"
        } else {
            "negative risk-adjusted returns"
        }
    }

    fn summary_paragraph(&self, snapshot: &PortfolioSnapshot, plan: &AllocationPlan) -> String {
        let ctx = json!({
            "vix": snapshot.has_valid_vix().then(|| snapshot.effective_vix()),
            "effective_vix": snapshot.effective_vix(),
            "trend": snapshot.vix_trend.label(),
            "regime": plan.regime.label(),
            "regime_description": plan.regime.description(),
            "income": plan.income_pie.total,
            "short_term": plan.short_term_treasury.total,
            "long_duration": plan.long_duration_treasury.total,
        });
        let market = self.templates.render_or(PORTFOLIO_SUMMARY, ctx, || {
            format!(
                "VIX {:.1} puts the market in the {} regime; target allocation is {} income, {} short-term treasuries and {} long-duration treasuries.",
                snapshot.effective_vix(),
                plan.regime.label(),
                pct(plan.income_pie.total),
                pct(plan.short_term_treasury.total),
                pct(plan.long_duration_treasury.total)
            )
        });

        let sharpe = sharpe_or_zero(snapshot);
        format!(
            "{market} Overall portfolio risk is {} and a Sharpe ratio of {sharpe:.2} points to {}.",
            snapshot.risk_level.label(),
            self.sharpe_commentary(sharpe)
        )
    }

    fn detailed_analysis(&self, snapshot: &PortfolioSnapshot, plan: &AllocationPlan) -> String {
        let mut doc = MarkdownBuilder::new().subsection("Holdings");
        doc = if snapshot.holdings.is_empty() {
            doc.paragraph("No holdings were reported; targets assume a fresh portfolio.")
        } else {
            doc.bullets(snapshot.holdings.iter().map(describe_holding))
        };

        let (best, worst) = best_and_worst(&snapshot.holdings);
        if let (Some((best, best_ret)), Some((worst, worst_ret))) = (best, worst) {
            doc = doc.blank_line().line(format!(
                "Best one-month performer: {best} ({}). Weakest: {worst} ({}).",
                signed_pct(best_ret),
                signed_pct(worst_ret)
            ));
        }

        if !snapshot.rotation_signals.is_empty() {
            let mut signals: Vec<_> = snapshot.rotation_signals.iter().collect();
            signals.sort_by(|a, b| b.urgency.cmp(&a.urgency));
            doc = doc.subsection("Rotation Signals").bullets(signals.into_iter().map(|s| {
                let mut line = format!(
                    "{} urgency: {} {}",
                    capitalize(s.urgency.label()),
                    s.signal_type.label(),
                    s.symbol
                );
                if !s.reason.trim().is_empty() {
                    line.push_str(&format!(" ({})", s.reason.trim()));
                }
                line
            }));
        }

        let rows = plan.buckets().into_iter().flat_map(|(kind, bucket)| {
            bucket.allocations().map(move |(symbol, target)| {
                let current = snapshot.current_allocation(symbol);
                vec![
                    kind.label().to_string(),
                    symbol.to_string(),
                    pct(current),
                    pct(target),
                    signed_pct(target - current),
                ]
            })
        });
        doc = doc
            .subsection(format!("Target Allocation ({} regime)", plan.regime.label()))
            .table(["Bucket", "Symbol", "Current", "Target", "Change"], rows);

        doc.when_with(!plan.adjustments.is_empty(), |b| {
            b.subsection("Adjustments").bullets(plan.adjustments.iter().cloned())
        })
        .build()
        .trim()
        .to_string()
    }

    fn recommendations(&self, snapshot: &PortfolioSnapshot, plan: &AllocationPlan) -> Vec<Recommendation> {
        let timeframe = if plan.regime.is_stressed() {
            Timeframe::ShortTerm
        } else {
            Timeframe::LongTerm
        };

        plan.symbols()
            .into_iter()
            .map(|symbol| {
                let current = snapshot.current_allocation(symbol);
                let target = plan.target_for(symbol);
                let delta = target - current;
                let action = if delta > self.settings.rebalance_band {
                    Action::Buy
                } else if delta < -self.settings.rebalance_band {
                    Action::Sell
                } else {
                    Action::Hold
                };
                let conviction = if delta.abs() >= self.settings.high_conviction_gap {
                    Conviction::High
                } else if delta.abs() >= self.settings.medium_conviction_gap {
                    Conviction::Medium
                } else {
                    Conviction::Low
                };

                Recommendation::new(action, symbol)
                    .timeframe(timeframe)
                    .conviction(conviction)
                    .rationale(format!(
                        "Target {} vs current {} ({})",
                        pct(target),
                        pct(current),
                        signed_pct(delta)
                    ))
            })
            .collect()
    }

    fn risks(&self, snapshot: &PortfolioSnapshot, plan: &AllocationPlan) -> Vec<String> {
        let mut risks = Vec::new();
        let limits = snapshot.effective_limits(&self.calculator.config().default_limits);

        if plan.regime != VolatilityRegime::Calm {
            risks.push(format!(
                "VIX {:.1} ({} regime): {}",
                snapshot.effective_vix(),
                plan.regime.label(),
                plan.regime.description()
            ));
        }
        if !snapshot.has_valid_vix() {
            risks.push("No VIX reading supplied; regime is based on the default level".to_string());
        }
        if snapshot.risk_level == RiskLevel::High {
            risks.push("Dashboard reports a high overall risk level".to_string());
        }

        let income_symbols: Vec<&str> = plan
            .bucket(BucketKind::IncomePie)
            .weights
            .iter()
            .map(|w| w.symbol.as_str())
            .collect();
        let mut combined = 0.0;
        for symbol in &income_symbols {
            let current = snapshot.current_allocation(symbol);
            combined += current;
            if current > limits.max_single_option_etf {
                risks.push(format!(
                    "{symbol} at {} exceeds the {} single option-ETF cap",
                    pct(current),
                    pct(limits.max_single_option_etf)
                ));
            }
        }
        if combined > limits.max_combined_option_etfs {
            risks.push(format!(
                "Option ETFs total {}, above the {} combined cap",
                pct(combined),
                pct(limits.max_combined_option_etfs)
            ));
        }

        for holding in &snapshot.holdings {
            if plan.bucket_of(&holding.symbol).is_none() && holding.effective_allocation() > 0.0 {
                risks.push(format!(
                    "{} ({}) is outside the target allocation",
                    holding.symbol,
                    pct(holding.effective_allocation())
                ));
            }
        }

        let sharpe = sharpe_or_zero(snapshot);
        if sharpe < self.settings.weak_sharpe {
            risks.push(format!("Sharpe ratio of {sharpe:.2} indicates {}", self.sharpe_commentary(sharpe)));
        }

        for signal in snapshot
            .rotation_signals
            .iter()
            .filter(|s| s.urgency == Urgency::High)
        {
            risks.push(format!(
                "High-urgency signal to {} {}",
                signal.signal_type.label(),
                signal.symbol
            ));
        }

        risks
    }
}

#[async_trait]
impl Agent for NaturalLanguageSummaryAgent {
    async fn process(&self, input: String, context: &mut Context) -> agent_core::Result<String> {
        let snapshot: PortfolioSnapshot = if input.trim().is_empty() {
            PortfolioSnapshot::default()
        } else {
            serde_json::from_str(&input)
                .map_err(|e| PortfolioError::InvalidInput(format!("portfolio snapshot: {e}")))?
        };
        info!(
            holdings = snapshot.holdings.len(),
            signals = snapshot.rotation_signals.len(),
            "summarizing portfolio"
        );

        let (plan, output) = self.summarize(&snapshot);
        context.insert_typed(keys::ALLOCATION_PLAN, &plan)?;

        serde_json::to_string(&output).map_err(|e| PortfolioError::JsonError(e).into())
    }

    fn name(&self) -> &str {
        "NaturalLanguageSummaryAgent"
    }

    fn description(&self) -> &str {
        "Explains a portfolio snapshot and its volatility-regime target allocation"
    }
}

fn sharpe_or_zero(snapshot: &PortfolioSnapshot) -> f64 {
    snapshot.sharpe_ratio.filter(|s| s.is_finite()).unwrap_or(0.0)
}

fn describe_holding(holding: &Holding) -> String {
    let mut line = format!("{}: {} of portfolio", holding.symbol, pct(holding.effective_allocation()));
    let perf = &holding.performance;
    let mut extras = Vec::new();
    if let Some(r) = perf.return_1m {
        extras.push(format!("1M {}", signed_pct(r)));
    }
    if let Some(r) = perf.return_ytd {
        extras.push(format!("YTD {}", signed_pct(r)));
    }
    if let Some(y) = perf.yield_pct {
        extras.push(format!("yield {}", pct(y)));
    }
    if !extras.is_empty() {
        line.push_str(&format!(" ({})", extras.join(", ")));
    }
    line
}

/// Holdings with the highest and lowest one-month return
fn best_and_worst(holdings: &[Holding]) -> (Option<(&str, f64)>, Option<(&str, f64)>) {
    let mut best: Option<(&str, f64)> = None;
    let mut worst: Option<(&str, f64)> = None;
    for h in holdings {
        let Some(r) = h.performance.return_1m.filter(|r| r.is_finite()) else {
            continue;
        };
        if best.is_none_or(|(_, b)| r > b) {
            best = Some((h.symbol.as_str(), r));
        }
        if worst.is_none_or(|(_, w)| r < w) {
            worst = Some((h.symbol.as_str(), r));
        }
    }
    (best, worst)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn signed_pct(fraction: f64) -> String {
    format!("{:+.1}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RotationSignal, SignalType, VixTrend};
    use approx::assert_relative_eq;

    fn snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot::new()
            .with_vix(27.4)
            .with_vix_trend(VixTrend::Rising)
            .with_risk_level(RiskLevel::High)
            .with_sharpe_ratio(0.3)
            .with_holding(Holding::new("QQQI", 0.32).with_return_1m(-0.021).with_yield(0.14))
            .with_holding(Holding::new("SPYI", 0.20).with_return_1m(0.012))
            .with_holding(Holding::new("JEPQ", 0.18))
            .with_holding(Holding::new("SGOV", 0.25))
            .with_holding(Holding::new("NVDA", 0.05).with_return_1m(0.08))
            .with_signal(
                RotationSignal::new(SignalType::RotateOut, "QQQI", Urgency::High)
                    .with_reason("premium compression"),
            )
            .with_signal(RotationSignal::new(SignalType::Increase, "JEPQ", Urgency::Low))
    }

    #[test]
    fn test_summary_mentions_regime_and_sharpe() {
        let agent = NaturalLanguageSummaryAgent::default();
        let (plan, output) = agent.summarize(&snapshot());

        assert_eq!(plan.regime, VolatilityRegime::High);
        assert!(output.summary.contains("27.4"));
        assert!(output.summary.contains("rising"));
        assert!(output.summary.contains("weak risk-adjusted returns"));
        assert!(output.summary.contains("risk is high"));
    }

    #[test]
    fn test_detailed_analysis_sections() {
        let agent = NaturalLanguageSummaryAgent::default();
        let (_, output) = agent.summarize(&snapshot());
        let detail = &output.detailed_analysis;

        assert!(detail.contains("### Holdings"));
        assert!(detail.contains("QQQI: 32.0% of portfolio (1M -2.1%, yield 14.0%)"));
        assert!(detail.contains("Best one-month performer: NVDA (+8.0%). Weakest: QQQI (-2.1%)."));
        assert!(detail.contains("### Target Allocation (high regime)"));

        let high = detail.find("High urgency: rotate out QQQI (premium compression)").unwrap();
        let low = detail.find("Low urgency: increase JEPQ").unwrap();
        assert!(high < low);
    }

    #[test]
    fn test_recommendations_follow_allocation_gap() {
        let agent = NaturalLanguageSummaryAgent::default();
        let snapshot = snapshot();
        let (plan, output) = agent.summarize(&snapshot);

        assert_eq!(output.recommendations.len(), plan.symbols().len());
        for rec in &output.recommendations {
            assert_eq!(rec.timeframe, Timeframe::ShortTerm);
            let delta = plan.target_for(&rec.symbol) - snapshot.current_allocation(&rec.symbol);
            let expected = if delta > 0.02 {
                Action::Buy
            } else if delta < -0.02 {
                Action::Sell
            } else {
                Action::Hold
            };
            assert_eq!(rec.action, expected, "{}", rec.symbol);
        }

        // QQQI is held at 32% against a 25% cap, so it must be trimmed
        let qqqi = output.recommendations.iter().find(|r| r.symbol == "QQQI").unwrap();
        assert_eq!(qqqi.action, Action::Sell);
        assert!(!output.recommendations.iter().any(|r| r.symbol == "NVDA"));
    }

    #[test]
    fn test_risks_cover_concentration_and_outsiders() {
        let agent = NaturalLanguageSummaryAgent::default();
        let (_, output) = agent.summarize(&snapshot());

        assert!(output.risks.iter().any(|r| r.contains("QQQI at 32.0% exceeds")));
        assert!(output.risks.iter().any(|r| r.contains("NVDA (5.0%) is outside")));
        assert!(output.risks.iter().any(|r| r.contains("Sharpe ratio of 0.30")));
        assert!(output.risks.iter().any(|r| r.contains("High-urgency signal to rotate out QQQI")));
        assert!(output.risks.iter().any(|r| r.contains("high overall risk level")));
    }

    #[test]
    fn test_confidence_penalties() {
        let agent = NaturalLanguageSummaryAgent::default();

        let (_, full) = agent.summarize(&snapshot());
        assert_relative_eq!(full.confidence, 0.85, epsilon = 1e-12);

        let (_, empty) = agent.summarize(&PortfolioSnapshot::new());
        assert_relative_eq!(empty.confidence, 0.60, epsilon = 1e-12);

        let (_, extreme) = agent.summarize(&PortfolioSnapshot::new().with_vix(45.0));
        assert_relative_eq!(extreme.confidence, 0.65, epsilon = 1e-12);
    }

    #[test]
    fn test_calm_regime_is_long_term() {
        let agent = NaturalLanguageSummaryAgent::default();
        let (_, output) = agent.summarize(&PortfolioSnapshot::new().with_vix(13.0).with_sharpe_ratio(1.4));
        assert!(output.recommendations.iter().all(|r| r.timeframe == Timeframe::LongTerm));
        assert!(output.summary.contains("strong risk-adjusted returns"));
        // Starting from nothing every target above the band is a buy
        assert!(output
            .recommendations
            .iter()
            .filter(|r| r.action == Action::Buy)
            .all(|r| r.conviction >= Conviction::Medium));
    }

    #[test]
    fn test_metrics() {
        let agent = NaturalLanguageSummaryAgent::default();
        let (_, output) = agent.summarize(&PortfolioSnapshot::new());
        assert_eq!(output.metrics["vix"], json!(20.0));
        assert_eq!(output.metrics["vix_reported"], json!(false));
        assert_eq!(output.metrics["regime"], json!("elevated"));
        assert_eq!(output.metrics["sharpe_ratio"], json!(0.0));
    }

    #[tokio::test]
    async fn test_agent_process_roundtrip() {
        let agent = NaturalLanguageSummaryAgent::default();
        let mut ctx = Context::new();
        let input = serde_json::to_string(&snapshot()).unwrap();

        let raw = agent.process(input, &mut ctx).await.unwrap();
        let output: AgentOutput = serde_json::from_str(&raw).unwrap();
        assert!(!output.summary.is_empty());

        let plan: AllocationPlan = ctx.get_typed(keys::ALLOCATION_PLAN).unwrap().unwrap();
        assert!(plan.is_balanced());
    }

    #[test]
    fn test_agent_empty_input_uses_defaults() {
        let agent = NaturalLanguageSummaryAgent::default();
        let raw = tokio_test::block_on(agent.process("  ".to_string(), &mut Context::new())).unwrap();
        let output: AgentOutput = serde_json::from_str(&raw).unwrap();
        assert_eq!(output.metrics["regime"], json!("elevated"));
    }

    #[tokio::test]
    async fn test_agent_rejects_invalid_json() {
        let agent = NaturalLanguageSummaryAgent::default();
        let result = agent.process("not json".to_string(), &mut Context::new()).await;
        assert!(matches!(result, Err(agent_core::Error::InvalidInput(_))));
    }
}
