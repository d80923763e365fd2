//! Portfolio snapshot supplied by the dashboard
//!
//! Every field is optional on the wire. Missing values fall back to the
//! defaults below so that a partially loaded dashboard still gets a plan.

use serde::{Deserialize, Serialize};

/// VIX level assumed when the snapshot carries none (or garbage)
pub const DEFAULT_VIX: f64 = 20.0;

/// Default cap on a single option-ETF position
pub const DEFAULT_MAX_SINGLE_OPTION_ETF: f64 = 0.25;

/// Default cap on all option-ETF positions combined
pub const DEFAULT_MAX_COMBINED_OPTION_ETFS: f64 = 0.70;

/// Direction the VIX has been moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VixTrend {
    Rising,
    Falling,
    #[default]
    Stable,
}

impl VixTrend {
    pub fn label(&self) -> &'static str {
        match self {
            VixTrend::Rising => "rising",
            VixTrend::Falling => "falling",
            VixTrend::Stable => "stable",
        }
    }
}

/// Overall risk level reported by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Moderate,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

/// Performance figures for a holding, all expressed as fractions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldingPerformance {
    pub return_1m: Option<f64>,
    pub return_ytd: Option<f64>,
    pub yield_pct: Option<f64>,
}

/// A single portfolio holding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    /// Fraction of the portfolio held in this symbol
    #[serde(default)]
    pub allocation: f64,
    #[serde(default)]
    pub performance: HoldingPerformance,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, allocation: f64) -> Self {
        Self {
            symbol: symbol.into(),
            allocation,
            performance: HoldingPerformance::default(),
        }
    }

    pub fn with_return_1m(mut self, value: f64) -> Self {
        self.performance.return_1m = Some(value);
        self
    }

    pub fn with_yield(mut self, value: f64) -> Self {
        self.performance.yield_pct = Some(value);
        self
    }

    /// Allocation with negative and non-finite values treated as zero
    pub fn effective_allocation(&self) -> f64 {
        if self.allocation.is_finite() {
            self.allocation.max(0.0)
        } else {
            0.0
        }
    }
}

/// Kind of reallocation a rotation signal suggests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Increase,
    Decrease,
    RotateIn,
    RotateOut,
}

impl SignalType {
    /// +1 for signals that add exposure, -1 for signals that remove it
    pub fn direction(&self) -> f64 {
        match self {
            SignalType::Increase | SignalType::RotateIn => 1.0,
            SignalType::Decrease | SignalType::RotateOut => -1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalType::Increase => "increase",
            SignalType::Decrease => "decrease",
            SignalType::RotateIn => "rotate in",
            SignalType::RotateOut => "rotate out",
        }
    }
}

/// How soon a rotation signal should be acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    /// Weight shift applied to an option-ETF sub-weight
    pub fn tilt(&self) -> f64 {
        match self {
            Urgency::Low => 0.02,
            Urgency::Medium => 0.05,
            Urgency::High => 0.10,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// Suggested reallocation between holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationSignal {
    pub signal_type: SignalType,
    pub symbol: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub reason: String,
}

impl RotationSignal {
    pub fn new(signal_type: SignalType, symbol: impl Into<String>, urgency: Urgency) -> Self {
        Self {
            signal_type,
            symbol: symbol.into(),
            urgency,
            reason: String::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Position caps, expressed as fractions of the portfolio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionLimits {
    pub max_single_option_etf: f64,
    pub max_combined_option_etfs: f64,
}

impl Default for PositionLimits {
    fn default() -> Self {
        Self {
            max_single_option_etf: DEFAULT_MAX_SINGLE_OPTION_ETF,
            max_combined_option_etfs: DEFAULT_MAX_COMBINED_OPTION_ETFS,
        }
    }
}

impl PositionLimits {
    pub fn new(max_single_option_etf: f64, max_combined_option_etfs: f64) -> Self {
        Self {
            max_single_option_etf,
            max_combined_option_etfs,
        }
    }

    /// Limits clamped into `[0, 1]`; non-finite values use the defaults
    pub fn sanitized(&self) -> Self {
        fn clamp_or(value: f64, fallback: f64) -> f64 {
            if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                fallback
            }
        }

        Self {
            max_single_option_etf: clamp_or(
                self.max_single_option_etf,
                DEFAULT_MAX_SINGLE_OPTION_ETF,
            ),
            max_combined_option_etfs: clamp_or(
                self.max_combined_option_etfs,
                DEFAULT_MAX_COMBINED_OPTION_ETFS,
            ),
        }
    }
}

/// Point-in-time view of the portfolio and market conditions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSnapshot {
    pub vix: Option<f64>,
    pub vix_trend: VixTrend,
    pub risk_level: RiskLevel,
    pub sharpe_ratio: Option<f64>,
    pub holdings: Vec<Holding>,
    pub rotation_signals: Vec<RotationSignal>,
    pub position_limits: Option<PositionLimits>,
}

impl PortfolioSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vix(mut self, vix: f64) -> Self {
        self.vix = Some(vix);
        self
    }

    pub fn with_vix_trend(mut self, trend: VixTrend) -> Self {
        self.vix_trend = trend;
        self
    }

    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = level;
        self
    }

    pub fn with_sharpe_ratio(mut self, sharpe: f64) -> Self {
        self.sharpe_ratio = Some(sharpe);
        self
    }

    pub fn with_holding(mut self, holding: Holding) -> Self {
        self.holdings.push(holding);
        self
    }

    pub fn with_signal(mut self, signal: RotationSignal) -> Self {
        self.rotation_signals.push(signal);
        self
    }

    pub fn with_limits(mut self, limits: PositionLimits) -> Self {
        self.position_limits = Some(limits);
        self
    }

    /// Whether the snapshot carries a usable VIX reading
    pub fn has_valid_vix(&self) -> bool {
        self.vix.is_some_and(|v| v.is_finite() && v >= 0.0)
    }

    /// VIX level, falling back to [`DEFAULT_VIX`]
    pub fn effective_vix(&self) -> f64 {
        match self.vix {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => DEFAULT_VIX,
        }
    }

    /// Position limits, falling back to `defaults` when absent
    pub fn effective_limits(&self, defaults: &PositionLimits) -> PositionLimits {
        self.position_limits.unwrap_or(*defaults).sanitized()
    }

    /// Sum of allocations held in `symbol` (case-insensitive)
    pub fn current_allocation(&self, symbol: &str) -> f64 {
        self.holdings
            .iter()
            .filter(|h| h.symbol.eq_ignore_ascii_case(symbol))
            .map(Holding::effective_allocation)
            .sum()
    }
}
