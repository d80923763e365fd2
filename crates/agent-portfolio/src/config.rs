//! Configuration for allocation and report generation

use crate::allocation::{Presets, VixThresholds};
use crate::error::{PortfolioError, Result};
use crate::model::{AnalysisSource, PositionLimits, SymbolWeight};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the single option-ETF cap
pub const ENV_MAX_SINGLE: &str = "PORTFOLIO_MAX_SINGLE_OPTION_ETF";
/// Environment variable overriding the combined option-ETF cap
pub const ENV_MAX_COMBINED: &str = "PORTFOLIO_MAX_COMBINED_OPTION_ETFS";
pub const ENV_VIX_ELEVATED: &str = "PORTFOLIO_VIX_ELEVATED";
pub const ENV_VIX_HIGH: &str = "PORTFOLIO_VIX_HIGH";
pub const ENV_VIX_EXTREME: &str = "PORTFOLIO_VIX_EXTREME";

/// Settings for the allocation calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    pub thresholds: VixThresholds,
    pub presets: Presets,
    /// Limits used when a snapshot carries none
    pub default_limits: PositionLimits,
    /// Option-ETF symbols and their base weights within the income pie
    pub income_symbols: Vec<SymbolWeight>,
    pub short_term_symbols: Vec<SymbolWeight>,
    pub long_duration_symbols: Vec<SymbolWeight>,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            thresholds: VixThresholds::default(),
            presets: Presets::default(),
            default_limits: PositionLimits::default(),
            income_symbols: vec![
                SymbolWeight::new("QQQI", 0.40),
                SymbolWeight::new("SPYI", 0.35),
                SymbolWeight::new("JEPQ", 0.25),
            ],
            short_term_symbols: vec![
                SymbolWeight::new("SGOV", 0.60),
                SymbolWeight::new("BIL", 0.40),
            ],
            long_duration_symbols: vec![
                SymbolWeight::new("TLT", 0.50),
                SymbolWeight::new("EDV", 0.50),
            ],
        }
    }
}

/// Relative weight of each analysis source in the overall confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    pub fundamental: f64,
    pub technical: f64,
    pub sentiment: f64,
    #[serde(rename = "macro")]
    pub macro_economic: f64,
    pub portfolio: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            fundamental: 0.30,
            technical: 0.25,
            sentiment: 0.20,
            macro_economic: 0.25,
            portfolio: 0.20,
        }
    }
}

impl SourceWeights {
    pub fn weight(&self, source: AnalysisSource) -> f64 {
        match source {
            AnalysisSource::Fundamental => self.fundamental,
            AnalysisSource::Technical => self.technical,
            AnalysisSource::Sentiment => self.sentiment,
            AnalysisSource::Macro => self.macro_economic,
            AnalysisSource::Portfolio => self.portfolio,
        }
    }

    pub fn set(&mut self, source: AnalysisSource, weight: f64) {
        match source {
            AnalysisSource::Fundamental => self.fundamental = weight,
            AnalysisSource::Technical => self.technical = weight,
            AnalysisSource::Sentiment => self.sentiment = weight,
            AnalysisSource::Macro => self.macro_economic = weight,
            AnalysisSource::Portfolio => self.portfolio = weight,
        }
    }
}

/// Settings for the report composer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub source_weights: SourceWeights,
    pub title_prefix: String,
    pub include_metrics: bool,
    pub disclaimer: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source_weights: SourceWeights::default(),
            title_prefix: "Investment Report".to_string(),
            include_metrics: true,
            disclaimer: "This report is generated automatically from model outputs and is not investment advice.".to_string(),
        }
    }
}

/// Settings for the natural-language summary agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Allocation gap below which a position is left alone
    pub rebalance_band: f64,
    pub medium_conviction_gap: f64,
    pub high_conviction_gap: f64,
    pub weak_sharpe: f64,
    pub strong_sharpe: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            rebalance_band: 0.02,
            medium_conviction_gap: 0.05,
            high_conviction_gap: 0.10,
            weak_sharpe: 0.5,
            strong_sharpe: 1.0,
        }
    }
}

/// Configuration for the portfolio agents
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub allocation: AllocationConfig,
    pub report: ReportConfig,
    pub summary: SummaryConfig,
}

impl PortfolioConfig {
    /// Create a new configuration builder
    pub fn builder() -> PortfolioConfigBuilder {
        PortfolioConfigBuilder::default()
    }

    /// Load a JSON configuration file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PortfolioError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: PortfolioConfig = serde_json::from_str(&content).map_err(|e| {
            PortfolioError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PORTFOLIO_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| -> Result<Option<f64>> {
            match lookup(key) {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                    PortfolioError::ConfigError(format!("{key} must be a number, got '{raw}'"))
                }),
            }
        };

        if let Some(v) = read(ENV_MAX_SINGLE)? {
            self.allocation.default_limits.max_single_option_etf = v;
        }
        if let Some(v) = read(ENV_MAX_COMBINED)? {
            self.allocation.default_limits.max_combined_option_etfs = v;
        }
        if let Some(v) = read(ENV_VIX_ELEVATED)? {
            self.allocation.thresholds.elevated = v;
        }
        if let Some(v) = read(ENV_VIX_HIGH)? {
            self.allocation.thresholds.high = v;
        }
        if let Some(v) = read(ENV_VIX_EXTREME)? {
            self.allocation.thresholds.extreme = v;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let allocation = &self.allocation;

        if !allocation.thresholds.is_ordered() {
            return Err(PortfolioError::ConfigError(
                "VIX thresholds must be positive and strictly increasing".to_string(),
            ));
        }

        for (regime, preset) in allocation.presets.iter() {
            if !preset.is_valid() {
                return Err(PortfolioError::ConfigError(format!(
                    "{} preset must be non-negative with a positive total",
                    regime.label()
                )));
            }
        }

        let limits = allocation.default_limits;
        for (name, value) in [
            ("max_single_option_etf", limits.max_single_option_etf),
            ("max_combined_option_etfs", limits.max_combined_option_etfs),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PortfolioError::ConfigError(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        for (bucket, symbols) in [
            ("income", &allocation.income_symbols),
            ("short-term treasury", &allocation.short_term_symbols),
            ("long-duration treasury", &allocation.long_duration_symbols),
        ] {
            if symbols.is_empty() {
                return Err(PortfolioError::ConfigError(format!(
                    "{bucket} bucket needs at least one symbol"
                )));
            }
            if symbols.iter().any(|s| !s.weight.is_finite() || s.weight < 0.0) {
                return Err(PortfolioError::ConfigError(format!(
                    "{bucket} bucket weights must be non-negative"
                )));
            }
        }

        let weights = self.report.source_weights;
        if AnalysisSource::all()
            .iter()
            .any(|s| !weights.weight(*s).is_finite() || weights.weight(*s) < 0.0)
        {
            return Err(PortfolioError::ConfigError(
                "source weights must be non-negative".to_string(),
            ));
        }

        let summary = self.summary;
        if !(summary.rebalance_band >= 0.0
            && summary.medium_conviction_gap >= summary.rebalance_band
            && summary.high_conviction_gap >= summary.medium_conviction_gap)
        {
            return Err(PortfolioError::ConfigError(
                "rebalance band and conviction gaps must be non-negative and increasing".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for PortfolioConfig
#[derive(Debug, Default)]
pub struct PortfolioConfigBuilder {
    thresholds: Option<VixThresholds>,
    presets: Option<Presets>,
    max_single_option_etf: Option<f64>,
    max_combined_option_etfs: Option<f64>,
    income_symbols: Option<Vec<SymbolWeight>>,
    short_term_symbols: Option<Vec<SymbolWeight>>,
    long_duration_symbols: Option<Vec<SymbolWeight>>,
    source_weights: Vec<(AnalysisSource, f64)>,
    title_prefix: Option<String>,
    include_metrics: Option<bool>,
    rebalance_band: Option<f64>,
}

impl PortfolioConfigBuilder {
    /// Set the VIX regime thresholds
    pub fn vix_thresholds(mut self, elevated: f64, high: f64, extreme: f64) -> Self {
        self.thresholds = Some(VixThresholds {
            elevated,
            high,
            extreme,
        });
        self
    }

    pub fn presets(mut self, presets: Presets) -> Self {
        self.presets = Some(presets);
        self
    }

    /// Set the default single option-ETF cap
    pub fn max_single_option_etf(mut self, cap: f64) -> Self {
        self.max_single_option_etf = Some(cap);
        self
    }

    /// Set the default combined option-ETF cap
    pub fn max_combined_option_etfs(mut self, cap: f64) -> Self {
        self.max_combined_option_etfs = Some(cap);
        self
    }

    pub fn income_symbols(mut self, symbols: Vec<SymbolWeight>) -> Self {
        self.income_symbols = Some(symbols);
        self
    }

    pub fn short_term_symbols(mut self, symbols: Vec<SymbolWeight>) -> Self {
        self.short_term_symbols = Some(symbols);
        self
    }

    pub fn long_duration_symbols(mut self, symbols: Vec<SymbolWeight>) -> Self {
        self.long_duration_symbols = Some(symbols);
        self
    }

    /// Override the confidence weight of one analysis source
    pub fn source_weight(mut self, source: AnalysisSource, weight: f64) -> Self {
        self.source_weights.push((source, weight));
        self
    }

    pub fn title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = Some(prefix.into());
        self
    }

    pub fn include_metrics(mut self, include: bool) -> Self {
        self.include_metrics = Some(include);
        self
    }

    pub fn rebalance_band(mut self, band: f64) -> Self {
        self.rebalance_band = Some(band);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<PortfolioConfig> {
        let mut config = PortfolioConfig::default();

        let allocation = &mut config.allocation;
        if let Some(thresholds) = self.thresholds {
            allocation.thresholds = thresholds;
        }
        if let Some(presets) = self.presets {
            allocation.presets = presets;
        }
        if let Some(cap) = self.max_single_option_etf {
            allocation.default_limits.max_single_option_etf = cap;
        }
        if let Some(cap) = self.max_combined_option_etfs {
            allocation.default_limits.max_combined_option_etfs = cap;
        }
        if let Some(symbols) = self.income_symbols {
            allocation.income_symbols = symbols;
        }
        if let Some(symbols) = self.short_term_symbols {
            allocation.short_term_symbols = symbols;
        }
        if let Some(symbols) = self.long_duration_symbols {
            allocation.long_duration_symbols = symbols;
        }

        for (source, weight) in self.source_weights {
            config.report.source_weights.set(source, weight);
        }
        if let Some(prefix) = self.title_prefix {
            config.report.title_prefix = prefix;
        }
        if let Some(include) = self.include_metrics {
            config.report.include_metrics = include;
        }
        if let Some(band) = self.rebalance_band {
            config.summary.rebalance_band = band;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PortfolioConfig::default();
        assert_eq!(config.allocation.income_symbols.len(), 3);
        assert_eq!(config.allocation.default_limits.max_single_option_etf, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PortfolioConfig::builder()
            .max_single_option_etf(0.2)
            .vix_thresholds(18.0, 24.0, 32.0)
            .source_weight(AnalysisSource::Macro, 0.5)
            .title_prefix("Weekly Review")
            .build()
            .unwrap();

        assert_eq!(config.allocation.default_limits.max_single_option_etf, 0.2);
        assert_eq!(config.allocation.thresholds.extreme, 32.0);
        assert_eq!(config.report.source_weights.weight(AnalysisSource::Macro), 0.5);
        assert_eq!(config.report.title_prefix, "Weekly Review");
    }

    #[test]
    fn test_validation_rejects_unordered_thresholds() {
        let result = PortfolioConfig::builder()
            .vix_thresholds(25.0, 20.0, 30.0)
            .build();
        assert!(matches!(result, Err(PortfolioError::ConfigError(_))));
    }

    #[test]
    fn test_validation_rejects_out_of_range_cap() {
        let result = PortfolioConfig::builder().max_combined_option_etfs(1.5).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_empty_income_bucket() {
        let result = PortfolioConfig::builder().income_symbols(Vec::new()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(ENV_MAX_SINGLE, "0.2"), (ENV_VIX_EXTREME, " 35 ")]);
        let config = PortfolioConfig::default()
            .with_overrides_from(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.allocation.default_limits.max_single_option_etf, 0.2);
        assert_eq!(config.allocation.thresholds.extreme, 35.0);
        assert_eq!(config.allocation.thresholds.high, 25.0);
    }

    #[test]
    fn test_env_override_not_a_number() {
        let result = PortfolioConfig::default()
            .with_overrides_from(|k| (k == ENV_MAX_COMBINED).then(|| "lots".to_string()));
        assert!(matches!(result, Err(PortfolioError::ConfigError(msg)) if msg.contains(ENV_MAX_COMBINED)));
    }

    #[test]
    fn test_from_file_partial() {
        let mut path = std::env::temp_dir();
        path.push(format!("portfolio-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"allocation": {{"default_limits": {{"max_single_option_etf": 0.3}}}}, "report": {{"include_metrics": false}}}}"#
        )
        .unwrap();

        let config = PortfolioConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.allocation.default_limits.max_single_option_etf, 0.3);
        assert_eq!(config.allocation.default_limits.max_combined_option_etfs, 0.70);
        assert!(!config.report.include_metrics);
        assert_eq!(config.allocation.income_symbols.len(), 3);
    }

    #[test]
    fn test_from_file_missing() {
        let result = PortfolioConfig::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(PortfolioError::ConfigError(_))));
    }
}
