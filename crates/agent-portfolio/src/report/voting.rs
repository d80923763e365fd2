//! Conviction-weighted voting over recommendations

use crate::model::{Action, Recommendation};
use serde::{Deserialize, Serialize};

/// Running vote totals, remembering the order actions first appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    votes: Vec<(Action, u32)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cast(&mut self, action: Action, weight: u32) {
        match self.votes.iter_mut().find(|(a, _)| *a == action) {
            Some((_, total)) => *total += weight,
            None => self.votes.push((action, weight)),
        }
    }

    pub fn add(&mut self, recommendation: &Recommendation) {
        self.cast(recommendation.action, recommendation.conviction.weight());
    }

    pub fn votes_for(&self, action: Action) -> u32 {
        self.votes
            .iter()
            .find(|(a, _)| *a == action)
            .map_or(0, |(_, total)| *total)
    }

    pub fn total(&self) -> u32 {
        self.votes.iter().map(|(_, total)| total).sum()
    }

    /// Action with the most votes; ties go to whichever appeared first
    pub fn winner(&self) -> Option<Action> {
        let mut best: Option<(Action, u32)> = None;
        for &(action, total) in &self.votes {
            if best.is_none_or(|(_, best_total)| total > best_total) {
                best = Some((action, total));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Winner, or HOLD when nothing was cast
    pub fn winner_or_hold(&self) -> Action {
        self.winner().unwrap_or(Action::Hold)
    }
}

/// Result of voting across all recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub short_term: Action,
    pub long_term: Action,
    pub dominant: Action,
    pub short_term_votes: u32,
    pub long_term_votes: u32,
}

impl Default for VoteOutcome {
    fn default() -> Self {
        Self {
            short_term: Action::Hold,
            long_term: Action::Hold,
            dominant: Action::Hold,
            short_term_votes: 0,
            long_term_votes: 0,
        }
    }
}

/// Tally recommendations into short-term, long-term and dominant actions
///
/// Short-term recommendations vote in the short-term tally, medium- and
/// long-term ones in the long-term tally. The dominant action is decided
/// over all votes with short-term recommendations counted first, so a tie
/// goes to the earliest short-term action.
pub fn tally_recommendations<'a, I>(recommendations: I) -> VoteOutcome
where
    I: IntoIterator<Item = &'a Recommendation>,
{
    let mut short = VoteTally::new();
    let mut long = VoteTally::new();
    let mut long_recs = Vec::new();

    for rec in recommendations {
        if rec.timeframe.is_short_term() {
            short.add(rec);
        } else {
            long.add(rec);
            long_recs.push(rec);
        }
    }

    let mut combined = short.clone();
    for rec in long_recs {
        combined.add(rec);
    }

    VoteOutcome {
        short_term: short.winner_or_hold(),
        long_term: long.winner_or_hold(),
        dominant: combined.winner_or_hold(),
        short_term_votes: short.votes_for(short.winner_or_hold()),
        long_term_votes: long.votes_for(long.winner_or_hold()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Conviction, Timeframe};

    fn rec(action: Action, timeframe: Timeframe, conviction: Conviction) -> Recommendation {
        Recommendation::new(action, "QQQI")
            .timeframe(timeframe)
            .conviction(conviction)
    }

    #[test]
    fn test_empty_is_hold() {
        let outcome = tally_recommendations(&Vec::<Recommendation>::new());
        assert_eq!(outcome, VoteOutcome::default());
    }

    #[test]
    fn test_conviction_weights_votes() {
        let recs = [
            rec(Action::Buy, Timeframe::ShortTerm, Conviction::Low),
            rec(Action::Buy, Timeframe::ShortTerm, Conviction::Low),
            rec(Action::Sell, Timeframe::ShortTerm, Conviction::High),
        ];
        let outcome = tally_recommendations(&recs);
        assert_eq!(outcome.short_term, Action::Sell);
        assert_eq!(outcome.short_term_votes, 3);
        assert_eq!(outcome.long_term, Action::Hold);
        assert_eq!(outcome.long_term_votes, 0);
    }

    #[test]
    fn test_tie_goes_to_first_encountered() {
        let recs = [
            rec(Action::Sell, Timeframe::LongTerm, Conviction::Medium),
            rec(Action::Buy, Timeframe::LongTerm, Conviction::Medium),
        ];
        assert_eq!(tally_recommendations(&recs).long_term, Action::Sell);

        let recs = [
            rec(Action::Buy, Timeframe::MediumTerm, Conviction::Medium),
            rec(Action::Sell, Timeframe::LongTerm, Conviction::Medium),
        ];
        assert_eq!(tally_recommendations(&recs).long_term, Action::Buy);
    }

    #[test]
    fn test_dominant_counts_short_term_first() {
        // Long-term SELL listed first, but the short-term BUY is counted
        // first in the combined tally and wins the 3-3 tie.
        let recs = [
            rec(Action::Sell, Timeframe::LongTerm, Conviction::High),
            rec(Action::Buy, Timeframe::ShortTerm, Conviction::High),
        ];
        let outcome = tally_recommendations(&recs);
        assert_eq!(outcome.short_term, Action::Buy);
        assert_eq!(outcome.long_term, Action::Sell);
        assert_eq!(outcome.dominant, Action::Buy);
    }

    #[test]
    fn test_dominant_spans_both_horizons() {
        let recs = [
            rec(Action::Buy, Timeframe::ShortTerm, Conviction::Medium),
            rec(Action::Sell, Timeframe::LongTerm, Conviction::Medium),
            rec(Action::Sell, Timeframe::MediumTerm, Conviction::Low),
        ];
        assert_eq!(tally_recommendations(&recs).dominant, Action::Sell);
    }

    #[test]
    fn test_tally_totals() {
        let mut tally = VoteTally::new();
        tally.cast(Action::Hold, 2);
        tally.cast(Action::Buy, 1);
        tally.cast(Action::Hold, 1);
        assert_eq!(tally.votes_for(Action::Hold), 3);
        assert_eq!(tally.votes_for(Action::Sell), 0);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.winner(), Some(Action::Hold));
    }
}
