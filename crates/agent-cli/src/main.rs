//! Command-line interface for the portfolio agents
//!
//! ```bash
//! agent-cli allocate --snapshot snapshot.json
//! agent-cli summarize --snapshot snapshot.json --format json
//! agent-cli report --request request.json --snapshot snapshot.json
//! ```

use agent_core::{Agent, Context};
use agent_portfolio::model::AnalysisSource;
use agent_portfolio::{
    AgentOutput, AllocationCalculator, AllocationPlan, NaturalLanguageSummaryAgent,
    PortfolioConfig, PortfolioSnapshot, ReportGenerationAgent, ReportRequest,
};
use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Table, presets};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "agent-cli")]
#[command(about = "Volatility-regime allocation and investment reports", long_about = None)]
struct Args {
    /// JSON configuration file; PORTFOLIO_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the target allocation for a portfolio snapshot
    Allocate {
        #[arg(short, long)]
        snapshot: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Explain a portfolio snapshot in plain English
    Summarize {
        #[arg(short, long)]
        snapshot: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Compose an investment report from analyst outputs
    Report {
        #[arg(short, long)]
        request: PathBuf,
        /// Adds the portfolio summary as an extra analysis
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = agent_utils::Config::from_env();
    agent_utils::init_from_config(&app_config);

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    info!(environment = %app_config.environment, "starting agent-cli");

    let output = match args.command {
        Command::Allocate { snapshot, format } => {
            let snapshot: PortfolioSnapshot = read_json(&snapshot)?;
            let plan = AllocationCalculator::new(config.allocation).calculate(&snapshot);
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&plan)?,
                OutputFormat::Text => render_plan(&plan),
            }
        }
        Command::Summarize { snapshot, format } => {
            let snapshot: PortfolioSnapshot = read_json(&snapshot)?;
            let output = summarize(&config, &snapshot).await?;
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&output)?,
                OutputFormat::Text => render_summary(&output),
            }
        }
        Command::Report {
            request,
            snapshot,
            format,
        } => {
            let mut request: ReportRequest = read_json(&request)?;
            if let Some(path) = snapshot {
                let snapshot: PortfolioSnapshot = read_json(&path)?;
                let output = summarize(&config, &snapshot).await?;
                request = request.with_output(AnalysisSource::Portfolio, output);
            }

            let agent = ReportGenerationAgent::new(config.report.clone());
            let mut ctx = Context::new().with_subject(request.subject.clone());
            if format == OutputFormat::Json {
                ctx = ctx.with_output_format("json");
            }
            agent.process(serde_json::to_string(&request)?, &mut ctx).await?
        }
    };

    println!("{output}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PortfolioConfig> {
    let config = match path {
        Some(path) => PortfolioConfig::from_file(path)?,
        None => PortfolioConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    debug!(path = %path.display(), "reading input");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

async fn summarize(config: &PortfolioConfig, snapshot: &PortfolioSnapshot) -> anyhow::Result<AgentOutput> {
    let agent = NaturalLanguageSummaryAgent::new(config);
    let raw = agent
        .process(serde_json::to_string(snapshot)?, &mut Context::new())
        .await?;
    Ok(serde_json::from_str(&raw)?)
}

fn render_plan(plan: &AllocationPlan) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_header(vec!["Bucket", "Symbol", "Weight in bucket", "Portfolio target"]);
    for (kind, bucket) in plan.buckets() {
        table.add_row(vec![
            kind.label().to_string(),
            "(total)".to_string(),
            String::new(),
            pct(bucket.total),
        ]);
        for w in &bucket.weights {
            table.add_row(vec![
                String::new(),
                w.symbol.clone(),
                pct(w.weight),
                pct(w.weight * bucket.total),
            ]);
        }
    }

    let mut out = format!("Regime: {} ({})\n{table}\n", plan.regime.label(), plan.regime.description());
    for note in &plan.adjustments {
        out.push_str(&format!("* {note}\n"));
    }
    out
}

fn render_summary(output: &AgentOutput) -> String {
    let mut out = format!(
        "{}\n\n{}\n\nConfidence: {}\n",
        output.summary,
        output.detailed_analysis,
        pct(output.confidence)
    );
    if !output.recommendations.is_empty() {
        out.push_str("\nRecommendations:\n");
        for rec in &output.recommendations {
            out.push_str(&format!(
                "  {} {} [{}, {} conviction] {}\n",
                rec.action,
                rec.symbol,
                rec.timeframe.label(),
                rec.conviction.label(),
                rec.rationale
            ));
        }
    }
    if !output.risks.is_empty() {
        out.push_str("\nRisks:\n");
        for risk in &output.risks {
            out.push_str(&format!("  - {risk}\n"));
        }
    }
    out
}

fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}
