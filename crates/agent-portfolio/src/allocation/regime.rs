//! Volatility regimes and the allocation preset attached to each

use serde::{Deserialize, Serialize};

/// Market volatility regime derived from the VIX
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityRegime {
    Calm,
    Elevated,
    High,
    Extreme,
}

impl VolatilityRegime {
    /// Classify a VIX level
    ///
    /// Bands are `[0, elevated)`, `[elevated, high)`, `[high, extreme]` and
    /// everything above `extreme`.
    pub fn classify(vix: f64, thresholds: &VixThresholds) -> Self {
        if vix > thresholds.extreme {
            VolatilityRegime::Extreme
        } else if vix >= thresholds.high {
            VolatilityRegime::High
        } else if vix >= thresholds.elevated {
            VolatilityRegime::Elevated
        } else {
            VolatilityRegime::Calm
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VolatilityRegime::Calm => "calm",
            VolatilityRegime::Elevated => "elevated",
            VolatilityRegime::High => "high",
            VolatilityRegime::Extreme => "extreme",
        }
    }

    /// Short market description used in narratives
    pub fn description(&self) -> &'static str {
        match self {
            VolatilityRegime::Calm => "volatility is subdued and option premiums are thin but steady",
            VolatilityRegime::Elevated => "volatility is elevated and option premiums are richer",
            VolatilityRegime::High => "volatility is high and downside moves are likely to outrun premium income",
            VolatilityRegime::Extreme => "volatility is extreme and capital preservation takes priority",
        }
    }

    /// Regimes in which recommendations are framed as short-term moves
    pub fn is_stressed(&self) -> bool {
        matches!(self, VolatilityRegime::High | VolatilityRegime::Extreme)
    }
}

/// VIX levels separating the four regimes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VixThresholds {
    pub elevated: f64,
    pub high: f64,
    pub extreme: f64,
}

impl Default for VixThresholds {
    fn default() -> Self {
        Self {
            elevated: 20.0,
            high: 25.0,
            extreme: 30.0,
        }
    }
}

impl VixThresholds {
    pub fn is_ordered(&self) -> bool {
        [self.elevated, self.high, self.extreme]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
            && self.elevated < self.high
            && self.high < self.extreme
    }
}

/// Bucket totals for one regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub income: f64,
    pub short_term: f64,
    pub long_duration: f64,
}

impl Preset {
    pub const fn new(income: f64, short_term: f64, long_duration: f64) -> Self {
        Self {
            income,
            short_term,
            long_duration,
        }
    }

    pub fn sum(&self) -> f64 {
        self.income + self.short_term + self.long_duration
    }

    pub fn is_valid(&self) -> bool {
        [self.income, self.short_term, self.long_duration]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && self.sum() > 0.0
    }
}

/// One preset per regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presets {
    pub calm: Preset,
    pub elevated: Preset,
    pub high: Preset,
    pub extreme: Preset,
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            calm: Preset::new(0.70, 0.20, 0.10),
            elevated: Preset::new(0.60, 0.25, 0.15),
            high: Preset::new(0.45, 0.35, 0.20),
            extreme: Preset::new(0.30, 0.45, 0.25),
        }
    }
}

impl Presets {
    pub fn for_regime(&self, regime: VolatilityRegime) -> Preset {
        match regime {
            VolatilityRegime::Calm => self.calm,
            VolatilityRegime::Elevated => self.elevated,
            VolatilityRegime::High => self.high,
            VolatilityRegime::Extreme => self.extreme,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VolatilityRegime, Preset)> + '_ {
        [
            (VolatilityRegime::Calm, self.calm),
            (VolatilityRegime::Elevated, self.elevated),
            (VolatilityRegime::High, self.high),
            (VolatilityRegime::Extreme, self.extreme),
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let t = VixThresholds::default();
        assert_eq!(VolatilityRegime::classify(0.0, &t), VolatilityRegime::Calm);
        assert_eq!(VolatilityRegime::classify(19.99, &t), VolatilityRegime::Calm);
        assert_eq!(VolatilityRegime::classify(20.0, &t), VolatilityRegime::Elevated);
        assert_eq!(VolatilityRegime::classify(24.9, &t), VolatilityRegime::Elevated);
        assert_eq!(VolatilityRegime::classify(25.0, &t), VolatilityRegime::High);
        assert_eq!(VolatilityRegime::classify(30.0, &t), VolatilityRegime::High);
        assert_eq!(VolatilityRegime::classify(30.01, &t), VolatilityRegime::Extreme);
    }

    #[test]
    fn test_default_presets_sum_to_one() {
        for (regime, preset) in Presets::default().iter() {
            assert!((preset.sum() - 1.0).abs() < 1e-9, "{regime:?}");
            assert!(preset.is_valid());
        }
    }

    #[test]
    fn test_thresholds_ordering() {
        assert!(VixThresholds::default().is_ordered());
        let bad = VixThresholds {
            elevated: 25.0,
            high: 20.0,
            extreme: 30.0,
        };
        assert!(!bad.is_ordered());
    }

    #[test]
    fn test_invalid_preset() {
        assert!(!Preset::new(-0.1, 0.6, 0.5).is_valid());
        assert!(!Preset::new(0.0, 0.0, 0.0).is_valid());
    }
}
