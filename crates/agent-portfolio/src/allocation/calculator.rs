//! Allocation calculator
//!
//! Turns a [`PortfolioSnapshot`] into an [`AllocationPlan`]:
//!
//! 1. classify the VIX into a [`VolatilityRegime`] and take its preset,
//! 2. rescale the bucket totals when they are off one by more than
//!    [`SUM_TOLERANCE`],
//! 3. hold the income pie under the combined option-ETF cap,
//! 4. derive option-ETF sub-weights from holdings and rotation signals,
//! 5. cap each option-ETF position and spread the excess over the others.
//!
//! Every step preserves the sum of the bucket totals, so the plan always
//! sums to one.

use crate::allocation::{Preset, VolatilityRegime};
use crate::config::AllocationConfig;
use crate::model::{AllocationPlan, Bucket, PortfolioSnapshot, SUM_TOLERANCE, SymbolWeight};
use tracing::debug;

/// Amounts below this are treated as rounding noise
const EPSILON: f64 = 1e-12;

/// Computes target allocations from portfolio snapshots
#[derive(Debug, Clone, Default)]
pub struct AllocationCalculator {
    config: AllocationConfig,
}

impl AllocationCalculator {
    pub fn new(config: AllocationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Compute the target allocation plan for a snapshot
    pub fn calculate(&self, snapshot: &PortfolioSnapshot) -> AllocationPlan {
        let limits = snapshot.effective_limits(&self.config.default_limits);
        let vix = snapshot.effective_vix();
        let regime = VolatilityRegime::classify(vix, &self.config.thresholds);
        let preset = self.config.presets.for_regime(regime);
        debug!(vix, regime = regime.label(), "selected allocation preset");

        let mut adjustments = Vec::new();
        let [mut income, mut short_term, long_duration] =
            self.normalize_totals(preset, &mut adjustments);

        if income > limits.max_combined_option_etfs {
            let excess = income - limits.max_combined_option_etfs;
            income = limits.max_combined_option_etfs;
            short_term += excess;
            adjustments.push(format!(
                "Income pie held at the {} combined option-ETF cap; {} moved to short-term treasuries",
                pct(limits.max_combined_option_etfs),
                pct(excess)
            ));
        }

        let base_weights = self.income_weights(snapshot);
        let capped = cap_single_positions(income, &base_weights, limits.max_single_option_etf);
        for symbol in &capped.capped_symbols {
            adjustments.push(format!(
                "{symbol} capped at the {} single-position limit",
                pct(limits.max_single_option_etf)
            ));
        }
        if capped.spill > EPSILON {
            adjustments.push(if base_weights.is_empty() {
                format!(
                    "No option ETFs configured; {} moved to short-term treasuries",
                    pct(capped.spill)
                )
            } else {
                format!(
                    "Every option ETF is at its cap; {} moved to short-term treasuries",
                    pct(capped.spill)
                )
            });
        }
        income -= capped.spill;
        short_term += capped.spill;

        let income_weights = if income > EPSILON {
            capped
                .allocations
                .iter()
                .map(|(symbol, alloc)| SymbolWeight::new(symbol.clone(), alloc / income))
                .collect()
        } else {
            income = 0.0;
            base_weights
        };

        let plan = AllocationPlan {
            regime,
            income_pie: Bucket::new(income, income_weights),
            short_term_treasury: Bucket::new(
                short_term,
                normalized_weights(&self.config.short_term_symbols),
            ),
            long_duration_treasury: Bucket::new(
                long_duration,
                normalized_weights(&self.config.long_duration_symbols),
            ),
            adjustments,
        };

        debug!(
            income = plan.income_pie.total,
            short_term = plan.short_term_treasury.total,
            long_duration = plan.long_duration_treasury.total,
            "allocation plan computed"
        );
        plan
    }

    /// Scale the preset so the bucket totals sum to one
    fn normalize_totals(&self, mut preset: Preset, adjustments: &mut Vec<String>) -> [f64; 3] {
        if !preset.is_valid() {
            preset = self.config.presets.extreme;
            if !preset.is_valid() {
                adjustments.push("No usable preset; allocated fully to short-term treasuries".to_string());
                return [0.0, 1.0, 0.0];
            }
            adjustments.push("Preset was unusable; fell back to the extreme-volatility preset".to_string());
        }

        let totals = [preset.income, preset.short_term, preset.long_duration];
        let sum = preset.sum();
        if (sum - 1.0).abs() <= SUM_TOLERANCE {
            return totals;
        }

        adjustments.push(format!(
            "Preset totals summed to {}; rescaled proportionally to 100%",
            pct(sum)
        ));
        totals.map(|t| t / sum)
    }

    /// Option-ETF sub-weights before capping
    ///
    /// Current holdings define the mix when any option ETF is held, otherwise
    /// the configured base weights do. Rotation signals then tilt the mix.
    fn income_weights(&self, snapshot: &PortfolioSnapshot) -> Vec<SymbolWeight> {
        let symbols = &self.config.income_symbols;

        let held: Vec<f64> = symbols
            .iter()
            .map(|s| snapshot.current_allocation(&s.symbol))
            .collect();
        let mut weights: Vec<f64> = if held.iter().sum::<f64>() > EPSILON {
            held
        } else {
            symbols.iter().map(|s| s.weight.max(0.0)).collect()
        };
        normalize_in_place(&mut weights);

        for signal in &snapshot.rotation_signals {
            if let Some(idx) = symbols
                .iter()
                .position(|s| s.symbol.eq_ignore_ascii_case(&signal.symbol))
            {
                weights[idx] += signal.signal_type.direction() * signal.urgency.tilt();
                debug!(
                    symbol = %signal.symbol,
                    signal = signal.signal_type.label(),
                    urgency = signal.urgency.label(),
                    "rotation signal tilted income weight"
                );
            }
        }
        for w in &mut weights {
            *w = w.max(0.0);
        }
        normalize_in_place(&mut weights);

        symbols
            .iter()
            .zip(weights)
            .map(|(s, w)| SymbolWeight::new(s.symbol.clone(), w))
            .collect()
    }
}

/// Result of the per-symbol cap pass
#[derive(Debug, Clone, PartialEq)]
pub struct CappedAllocations {
    /// Portfolio fraction per option-ETF symbol
    pub allocations: Vec<(String, f64)>,
    /// Symbols that hit the cap
    pub capped_symbols: Vec<String>,
    /// Amount that could not be placed under any cap
    pub spill: f64,
}

/// Split `total` across `weights`, capping each position at `cap`
///
/// Excess above the cap is spread evenly across the symbols still under it,
/// repeating until nothing exceeds the cap. Whatever cannot be placed is
/// returned as `spill`, including all of `total` when `weights` is empty.
/// `sum(allocations) + spill == total`.
pub fn cap_single_positions(total: f64, weights: &[SymbolWeight], cap: f64) -> CappedAllocations {
    if weights.is_empty() {
        return CappedAllocations {
            allocations: Vec::new(),
            capped_symbols: Vec::new(),
            spill: total,
        };
    }

    let mut allocs: Vec<f64> = weights.iter().map(|w| total * w.weight).collect();
    let mut capped = vec![false; allocs.len()];
    let mut spill = 0.0;

    loop {
        let mut excess = 0.0;
        for (alloc, is_capped) in allocs.iter_mut().zip(capped.iter_mut()) {
            if *alloc > cap {
                excess += *alloc - cap;
                *alloc = cap;
                *is_capped = true;
            }
        }
        if excess <= EPSILON {
            spill += excess;
            break;
        }

        let open: Vec<usize> = (0..allocs.len()).filter(|&i| !capped[i]).collect();
        if open.is_empty() {
            spill += excess;
            break;
        }
        let share = excess / open.len() as f64;
        for i in open {
            allocs[i] += share;
        }
    }

    CappedAllocations {
        allocations: weights
            .iter()
            .zip(&allocs)
            .map(|(w, a)| (w.symbol.clone(), *a))
            .collect(),
        capped_symbols: weights
            .iter()
            .zip(&capped)
            .filter(|(_, c)| **c)
            .map(|(w, _)| w.symbol.clone())
            .collect(),
        spill,
    }
}

/// Weights rescaled to sum to one (equal weights when they sum to zero)
fn normalized_weights(symbols: &[SymbolWeight]) -> Vec<SymbolWeight> {
    let mut weights: Vec<f64> = symbols.iter().map(|s| s.weight.max(0.0)).collect();
    normalize_in_place(&mut weights);
    symbols
        .iter()
        .zip(weights)
        .map(|(s, w)| SymbolWeight::new(s.symbol.clone(), w))
        .collect()
}

fn normalize_in_place(weights: &mut [f64]) {
    if weights.is_empty() {
        return;
    }
    let sum: f64 = weights.iter().sum();
    if sum > EPSILON && sum.is_finite() {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    } else {
        let equal = 1.0 / weights.len() as f64;
        weights.fill(equal);
    }
}

fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}
