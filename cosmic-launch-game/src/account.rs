//! Player account carried across rounds for the life of a session.
use serde::{Deserialize, Serialize};

use crate::money::Credits;
use crate::resolver::RoundOutcome;

/// Balance and score owned by the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAccount {
    balance: Credits,
    score: i64,
}

impl PlayerAccount {
    /// Open an account holding `starting` credits and a zero score.
    #[must_use]
    pub const fn new(starting: Credits) -> Self {
        Self {
            balance: starting.clamp_non_negative(),
            score: 0,
        }
    }

    #[must_use]
    pub const fn balance(&self) -> Credits {
        self.balance
    }

    #[must_use]
    pub const fn score(&self) -> i64 {
        self.score
    }

    #[must_use]
    pub const fn is_bankrupt(&self) -> bool {
        self.balance.is_zero()
    }

    #[must_use]
    pub fn can_cover(&self, wager: Credits) -> bool {
        wager <= self.balance
    }

    /// Apply a resolved round. The balance never drops below zero.
    pub(crate) fn commit(&mut self, outcome: &RoundOutcome, score_step: i64) {
        self.balance = (self.balance + outcome.payout_delta).clamp_non_negative();
        self.score = self.score.saturating_add(outcome.score_delta(score_step));
    }

    /// Restore the starting stake and clear the score.
    pub(crate) const fn refill(&mut self, starting: Credits) {
        self.balance = starting.clamp_non_negative();
        self.score = 0;
    }
}

impl Default for PlayerAccount {
    fn default() -> Self {
        Self::new(Credits::from_cents(crate::constants::STARTING_BALANCE_CENTS))
    }
}
