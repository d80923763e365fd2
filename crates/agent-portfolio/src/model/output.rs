//! Structured output exchanged between analysis agents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Trading action carried by a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizon a recommendation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl Timeframe {
    pub fn is_short_term(&self) -> bool {
        matches!(self, Timeframe::ShortTerm)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::ShortTerm => "short-term",
            Timeframe::MediumTerm => "medium-term",
            Timeframe::LongTerm => "long-term",
        }
    }
}

/// Strength of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Conviction {
    Low,
    #[default]
    Medium,
    High,
}

impl Conviction {
    /// Number of votes a recommendation of this conviction casts
    pub fn weight(&self) -> u32 {
        match self {
            Conviction::Low => 1,
            Conviction::Medium => 2,
            Conviction::High => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Conviction::Low => "low",
            Conviction::Medium => "medium",
            Conviction::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub conviction: Conviction,
    #[serde(default)]
    pub rationale: String,
}

impl Recommendation {
    pub fn new(action: Action, symbol: impl Into<String>) -> Self {
        Self {
            action,
            symbol: symbol.into(),
            timeframe: Timeframe::default(),
            conviction: Conviction::default(),
            rationale: String::new(),
        }
    }

    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    pub fn conviction(mut self, conviction: Conviction) -> Self {
        self.conviction = conviction;
        self
    }

    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }
}

/// Output of any analysis agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentOutput {
    pub summary: String,
    pub detailed_analysis: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    pub recommendations: Vec<Recommendation>,
    pub risks: Vec<String>,
    pub metrics: BTreeMap<String, serde_json::Value>,
}

impl AgentOutput {
    pub fn new(summary: impl Into<String>, detailed_analysis: impl Into<String>, confidence: f64) -> Self {
        Self {
            summary: summary.into(),
            detailed_analysis: detailed_analysis.into(),
            confidence: clamp_confidence(confidence),
            ..Default::default()
        }
    }

    pub fn with_recommendation(mut self, recommendation: Recommendation) -> Self {
        self.recommendations.push(recommendation);
        self
    }

    pub fn with_risk(mut self, risk: impl Into<String>) -> Self {
        self.risks.push(risk.into());
        self
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Copy with the confidence forced back into `[0, 1]`
    ///
    /// Outputs deserialized from upstream agents are not trusted to respect
    /// the range.
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        self
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Upstream analysis producing an [`AgentOutput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Fundamental,
    Technical,
    Sentiment,
    Macro,
    Portfolio,
}

impl AnalysisSource {
    pub fn all() -> [AnalysisSource; 5] {
        [
            AnalysisSource::Fundamental,
            AnalysisSource::Technical,
            AnalysisSource::Sentiment,
            AnalysisSource::Macro,
            AnalysisSource::Portfolio,
        ]
    }

    /// Machine key, used to prefix merged metrics
    pub fn key(&self) -> &'static str {
        match self {
            AnalysisSource::Fundamental => "fundamental",
            AnalysisSource::Technical => "technical",
            AnalysisSource::Sentiment => "sentiment",
            AnalysisSource::Macro => "macro",
            AnalysisSource::Portfolio => "portfolio",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AnalysisSource::Fundamental => "Fundamental Analysis",
            AnalysisSource::Technical => "Technical Analysis",
            AnalysisSource::Sentiment => "Sentiment Analysis",
            AnalysisSource::Macro => "Macro Analysis",
            AnalysisSource::Portfolio => "Portfolio Allocation",
        }
    }
}

impl fmt::Display for AnalysisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An agent output tagged with the analysis that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedOutput {
    pub source: AnalysisSource,
    pub output: AgentOutput,
}

impl SourcedOutput {
    pub fn new(source: AnalysisSource, output: AgentOutput) -> Self {
        Self { source, output }
    }
}

/// Input document of the report generation agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Symbol or portfolio name the report is about
    pub subject: String,
    #[serde(default)]
    pub outputs: Vec<SourcedOutput>,
}

impl ReportRequest {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            outputs: Vec::new(),
        }
    }

    pub fn with_output(mut self, source: AnalysisSource, output: AgentOutput) -> Self {
        self.outputs.push(SourcedOutput::new(source, output));
        self
    }
}
