//! Portfolio allocation and report agents
//!
//! Two pieces of pure logic sit at the core of this crate:
//!
//! - the [`AllocationCalculator`], which maps a [`PortfolioSnapshot`] to a
//!   target split between an option-ETF income pie, short-term treasuries and
//!   long-duration treasuries according to the VIX regime, subject to
//!   per-symbol and combined position caps;
//! - the [`ReportComposer`], which merges outputs of several analyses into a
//!   weighted-confidence Markdown report with a conviction-voted dominant
//!   action.
//!
//! They are exposed to the rest of the agent system through two [`Agent`]
//! implementations, [`NaturalLanguageSummaryAgent`] and
//! [`ReportGenerationAgent`].
//!
//! # Example
//!
//! ```
//! use agent_portfolio::{AllocationCalculator, PortfolioSnapshot, VolatilityRegime};
//!
//! let snapshot = PortfolioSnapshot::new().with_vix(32.5);
//! let plan = AllocationCalculator::default().calculate(&snapshot);
//!
//! assert_eq!(plan.regime, VolatilityRegime::Extreme);
//! assert!(plan.is_balanced());
//! ```
//!
//! [`Agent`]: agent_core::Agent

pub mod agents;
pub mod allocation;
pub mod config;
pub mod error;
pub mod model;
pub mod report;

pub use agents::{NaturalLanguageSummaryAgent, ReportGenerationAgent};
pub use allocation::{AllocationCalculator, VolatilityRegime};
pub use config::PortfolioConfig;
pub use error::{PortfolioError, Result};
pub use model::{AgentOutput, AllocationPlan, PortfolioSnapshot, ReportRequest};
pub use report::{InvestmentReport, ReportComposer};
