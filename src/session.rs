//! Comparative rating session
//!
//! A short-lived state machine that refines a sentiment-tier midpoint
//! into a precise rating through exactly three pairwise judgments
//! against pre-selected comparison titles. Independent of any rendering
//! concern so it can be driven headlessly.

use crate::error::EngineError;
use crate::types::{PendingItem, RatedItem};
use tracing::debug;

/// Number of pairwise rounds per session.
pub const ROUNDS: usize = 3;

const MIN_RATING: f64 = 1.0;
const MAX_RATING: f64 = 10.0;

/// Who won a pairwise round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundWinner {
    /// The item being rated.
    NewItem,
    /// The previously rated comparison item.
    Comparison,
}

/// One recorded pairwise trial.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub comparison_id: u64,
    pub winner: RoundWinner,
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting on the user's choice for the zero-based round index.
    AwaitingRound(usize),
    Complete,
}

/// Result of recording one choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChoiceOutcome {
    /// More rounds remain; the value is the next round index.
    NextRound(usize),
    /// All rounds recorded; the value is the final rating.
    Complete(f64),
}

/// Three-round pairwise comparison session.
///
/// The candidate list is fixed at construction and immutable for the
/// session's lifetime. Abandonment is dropping the value: no outcome is
/// recorded and no rating is written anywhere.
#[derive(Debug, Clone)]
pub struct ComparisonSession {
    new_item: PendingItem,
    comparison_items: Vec<RatedItem>,
    outcomes: Vec<ComparisonOutcome>,
    final_rating: Option<f64>,
}

impl ComparisonSession {
    /// Start a session with exactly three ranked comparison items.
    pub fn new(
        new_item: PendingItem,
        comparison_items: Vec<RatedItem>,
    ) -> Result<Self, EngineError> {
        if comparison_items.len() != ROUNDS {
            return Err(EngineError::InsufficientCandidates {
                expected: ROUNDS,
                got: comparison_items.len(),
            });
        }
        Ok(Self {
            new_item,
            comparison_items,
            outcomes: Vec::with_capacity(ROUNDS),
            final_rating: None,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.final_rating.is_some() {
            SessionState::Complete
        } else {
            SessionState::AwaitingRound(self.outcomes.len())
        }
    }

    /// The pair shown for the current round, or `None` once complete.
    pub fn current_pair(&self) -> Option<(&PendingItem, &RatedItem)> {
        match self.state() {
            SessionState::AwaitingRound(round) => {
                Some((&self.new_item, &self.comparison_items[round]))
            }
            SessionState::Complete => None,
        }
    }

    /// Rounds the new item has won so far.
    pub fn wins(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.winner == RoundWinner::NewItem)
            .count()
    }

    pub fn outcomes(&self) -> &[ComparisonOutcome] {
        &self.outcomes
    }

    /// Final rating once the session is complete.
    pub fn final_rating(&self) -> Option<f64> {
        self.final_rating
    }

    /// Record the user's choice for the current round.
    ///
    /// On the third choice the session becomes terminal and the final
    /// rating is computed. Recording against a complete session returns
    /// the existing final rating unchanged.
    pub fn record_choice(&mut self, winner: RoundWinner) -> ChoiceOutcome {
        if let Some(rating) = self.final_rating {
            return ChoiceOutcome::Complete(rating);
        }

        let round = self.outcomes.len();
        self.outcomes.push(ComparisonOutcome {
            comparison_id: self.comparison_items[round].id,
            winner,
        });

        if self.outcomes.len() < ROUNDS {
            ChoiceOutcome::NextRound(self.outcomes.len())
        } else {
            let rating = self.compute_final_rating();
            debug!(
                title = %self.new_item.title,
                wins = self.wins(),
                rating,
                "comparison session complete"
            );
            self.final_rating = Some(rating);
            ChoiceOutcome::Complete(rating)
        }
    }

    /// Average of the comparison items' ratings, shifted by a win-count
    /// delta and clamped to the valid rating range.
    fn compute_final_rating(&self) -> f64 {
        let avg = self
            .comparison_items
            .iter()
            .map(|i| i.user_rating)
            .sum::<f64>()
            / self.comparison_items.len() as f64;

        let delta = match self.wins() {
            3 => 0.5,
            2 => 0.2,
            1 => -0.2,
            _ => -0.5,
        };

        (avg + delta).clamp(MIN_RATING, MAX_RATING)
    }
}
