//! Volatility-regime allocation

pub mod calculator;
pub mod regime;

pub use calculator::{AllocationCalculator, CappedAllocations, cap_single_positions};
pub use regime::{Preset, Presets, VixThresholds, VolatilityRegime};
