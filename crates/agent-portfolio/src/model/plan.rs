//! Target allocation plan produced by the allocation calculator

use serde::{Deserialize, Serialize};

use crate::allocation::VolatilityRegime;

/// Tolerance within which bucket totals are considered to sum to one
pub const SUM_TOLERANCE: f64 = 0.001;

/// The three allocation buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    IncomePie,
    ShortTermTreasury,
    LongDurationTreasury,
}

impl BucketKind {
    pub fn label(&self) -> &'static str {
        match self {
            BucketKind::IncomePie => "Option-ETF income pie",
            BucketKind::ShortTermTreasury => "Short-term treasury",
            BucketKind::LongDurationTreasury => "Long-duration treasury",
        }
    }
}

/// A symbol and its weight within a bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolWeight {
    pub symbol: String,
    pub weight: f64,
}

impl SymbolWeight {
    pub fn new(symbol: impl Into<String>, weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
        }
    }
}

/// One bucket: a total portfolio fraction split across symbols
///
/// `weights` are fractions of the bucket and sum to one whenever the bucket
/// has any symbols.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bucket {
    pub total: f64,
    pub weights: Vec<SymbolWeight>,
}

impl Bucket {
    pub fn new(total: f64, weights: Vec<SymbolWeight>) -> Self {
        Self { total, weights }
    }

    /// Portfolio fraction allocated to `symbol` through this bucket
    pub fn allocation_of(&self, symbol: &str) -> f64 {
        self.weights
            .iter()
            .filter(|w| w.symbol.eq_ignore_ascii_case(symbol))
            .map(|w| w.weight * self.total)
            .sum()
    }

    /// Per-symbol portfolio fractions, in bucket order
    pub fn allocations(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.weights
            .iter()
            .map(|w| (w.symbol.as_str(), w.weight * self.total))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.weights
            .iter()
            .any(|w| w.symbol.eq_ignore_ascii_case(symbol))
    }
}

/// Target allocation across the three buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub regime: VolatilityRegime,
    pub income_pie: Bucket,
    pub short_term_treasury: Bucket,
    pub long_duration_treasury: Bucket,
    /// Human-readable notes about normalization and caps applied
    #[serde(default)]
    pub adjustments: Vec<String>,
}

impl AllocationPlan {
    pub fn buckets(&self) -> [(BucketKind, &Bucket); 3] {
        [
            (BucketKind::IncomePie, &self.income_pie),
            (BucketKind::ShortTermTreasury, &self.short_term_treasury),
            (BucketKind::LongDurationTreasury, &self.long_duration_treasury),
        ]
    }

    pub fn bucket(&self, kind: BucketKind) -> &Bucket {
        match kind {
            BucketKind::IncomePie => &self.income_pie,
            BucketKind::ShortTermTreasury => &self.short_term_treasury,
            BucketKind::LongDurationTreasury => &self.long_duration_treasury,
        }
    }

    /// Sum of the three bucket totals
    pub fn total(&self) -> f64 {
        self.income_pie.total + self.short_term_treasury.total + self.long_duration_treasury.total
    }

    pub fn is_balanced(&self) -> bool {
        (self.total() - 1.0).abs() <= SUM_TOLERANCE
    }

    /// Target portfolio fraction for `symbol` across all buckets
    pub fn target_for(&self, symbol: &str) -> f64 {
        self.buckets()
            .iter()
            .map(|(_, bucket)| bucket.allocation_of(symbol))
            .sum()
    }

    /// Bucket a symbol belongs to, if any
    pub fn bucket_of(&self, symbol: &str) -> Option<BucketKind> {
        self.buckets()
            .into_iter()
            .find(|(_, bucket)| bucket.contains(symbol))
            .map(|(kind, _)| kind)
    }

    /// Every symbol in the plan, in bucket order
    pub fn symbols(&self) -> Vec<&str> {
        self.buckets()
            .into_iter()
            .flat_map(|(_, bucket)| bucket.weights.iter().map(|w| w.symbol.as_str()))
            .collect()
    }
}
