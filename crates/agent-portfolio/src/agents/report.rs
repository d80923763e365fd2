//! Report generation agent
//!
//! Collects analysis outputs (supplied in the request and/or gathered from
//! registered analyst agents) and composes them into an investment report.

use agent_core::{Agent, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ReportConfig;
use crate::error::{PortfolioError, Result};
use crate::model::{AgentOutput, AnalysisSource, ReportRequest, SourcedOutput};
use crate::report::{InvestmentReport, ReportComposer};

/// Agent producing Markdown investment reports from analyst outputs
#[derive(Default)]
pub struct ReportGenerationAgent {
    composer: ReportComposer,
    analysts: Vec<(AnalysisSource, Arc<dyn Agent>)>,
}

impl std::fmt::Debug for ReportGenerationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerationAgent")
            .field("composer", &self.composer)
            .field(
                "analysts",
                &self.analysts.iter().map(|(s, _)| s.key()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ReportGenerationAgent {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            composer: ReportComposer::new(config),
            analysts: Vec::new(),
        }
    }

    /// Register an upstream analyst queried on every report
    pub fn with_analyst(mut self, source: AnalysisSource, agent: Arc<dyn Agent>) -> Self {
        self.analysts.push((source, agent));
        self
    }

    pub fn analyst_count(&self) -> usize {
        self.analysts.len()
    }

    /// Query every registered analyst concurrently
    ///
    /// Analysts that fail or return something other than an `AgentOutput`
    /// document are logged and left out.
    pub async fn gather(&self, subject: &str, context: &Context) -> Vec<SourcedOutput> {
        let input = serde_json::json!({ "subject": subject }).to_string();

        let futures: Vec<_> = self
            .analysts
            .iter()
            .map(|(source, agent)| {
                let source = *source;
                let agent = Arc::clone(agent);
                let input = input.clone();
                let mut ctx = context.clone().with_subject(subject);
                async move {
                    let result = agent
                        .process(input, &mut ctx)
                        .await
                        .map_err(|e| PortfolioError::AnalystFailed {
                            agent: source.key().to_string(),
                            reason: e.to_string(),
                        })
                        .and_then(|raw| parse_output(source, &raw));
                    (source, result)
                }
            })
            .collect();

        futures::future::join_all(futures)
            .await
            .into_iter()
            .filter_map(|(source, result)| match result {
                Ok(output) => Some(SourcedOutput::new(source, output)),
                Err(e) => {
                    warn!(source = source.key(), error = %e, "skipping analyst output");
                    None
                }
            })
            .collect()
    }

    /// Gather analyst outputs, append them to the request and compose
    pub async fn generate(&self, request: ReportRequest, context: &Context) -> InvestmentReport {
        let mut outputs = request.outputs;
        if !self.analysts.is_empty() {
            outputs.extend(self.gather(&request.subject, context).await);
        }
        self.compose(&request.subject, &outputs, context.as_of_or_now())
    }

    pub fn compose(&self, subject: &str, outputs: &[SourcedOutput], generated_at: DateTime<Utc>) -> InvestmentReport {
        self.composer.compose(subject, outputs, generated_at)
    }
}

fn parse_output(source: AnalysisSource, raw: &str) -> Result<AgentOutput> {
    serde_json::from_str::<AgentOutput>(raw)
        .map(AgentOutput::normalized)
        .map_err(|e| PortfolioError::AnalystFailed {
            agent: source.key().to_string(),
            reason: format!("unparsable output: {e}"),
        })
}

#[async_trait]
impl Agent for ReportGenerationAgent {
    async fn process(&self, input: String, context: &mut Context) -> agent_core::Result<String> {
        let mut request: ReportRequest = serde_json::from_str(&input)
            .map_err(|e| PortfolioError::InvalidInput(format!("report request: {e}")))?;
        if request.subject.trim().is_empty() {
            request.subject = context.subject().unwrap_or("Portfolio").to_string();
        }
        info!(
            subject = %request.subject,
            outputs = request.outputs.len(),
            analysts = self.analysts.len(),
            "generating report"
        );

        let report = self.generate(request, context).await;

        if context.output_format() == Some("json") {
            Ok(serde_json::to_string_pretty(&report).map_err(PortfolioError::from)?)
        } else {
            Ok(report.markdown)
        }
    }

    fn name(&self) -> &str {
        "ReportGenerationAgent"
    }

    fn description(&self) -> &str {
        "Combines analyst outputs into a weighted-confidence investment report"
    }
}
