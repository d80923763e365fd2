//! Data model shared by the calculator, the composer and the agents

pub mod output;
pub mod plan;
pub mod snapshot;

pub use output::{
    Action, AgentOutput, AnalysisSource, Conviction, Recommendation, ReportRequest,
    SourcedOutput, Timeframe,
};
pub use plan::{AllocationPlan, Bucket, BucketKind, SUM_TOLERANCE, SymbolWeight};
pub use snapshot::{
    DEFAULT_VIX, Holding, HoldingPerformance, PortfolioSnapshot, PositionLimits, RiskLevel,
    RotationSignal, SignalType, Urgency, VixTrend,
};
