//! Outcome resolution: decides, once per round, which body the rocket strikes.
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError, DestinationId};
use crate::money::Credits;

/// Resolved result of a single launch, fixed at launch time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub chosen: DestinationId,
    pub impact: DestinationId,
    pub won: bool,
    pub wager: Credits,
    /// `wager * multiplier` on a hit, `-wager` on a miss.
    pub payout_delta: Credits,
    /// Uniform draw that decided the round; `None` for forced outcomes.
    pub roll: Option<f64>,
}

impl RoundOutcome {
    /// Build an outcome for a predetermined impact using the normal payout rules.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if either destination is missing.
    pub fn forced(
        catalog: &Catalog,
        chosen: DestinationId,
        impact: DestinationId,
        wager: Credits,
    ) -> Result<Self, CatalogError> {
        let target = catalog.get(chosen)?;
        catalog.get(impact)?;
        let won = impact == chosen;
        Ok(Self {
            chosen,
            impact,
            won,
            wager,
            payout_delta: payout_delta(wager, target.payout_multiplier, won),
            roll: None,
        })
    }

    /// Score change for this round given the configured step.
    #[must_use]
    pub const fn score_delta(&self, step: i64) -> i64 {
        if self.won { step } else { -step }
    }

    /// Magnitude shown to the player and handed to narration.
    #[must_use]
    pub const fn amount(&self) -> Credits {
        self.payout_delta.abs()
    }
}

/// Sample the outcome of a launch aimed at `chosen`.
///
/// A uniform draw below the destination's strike probability is a hit.
/// On a miss the impact is drawn uniformly from every other destination;
/// their own probabilities play no part in which wrong body is struck.
///
/// # Errors
///
/// Returns [`CatalogError::NotFound`] for an unknown id, and
/// [`CatalogError::NoAlternative`] if a miss is drawn on a single-entry catalog.
pub fn resolve<R: RngCore>(
    catalog: &Catalog,
    chosen: DestinationId,
    wager: Credits,
    rng: &mut R,
) -> Result<RoundOutcome, CatalogError> {
    let target = catalog.get(chosen)?;
    let roll: f64 = rng.r#gen();
    let won = roll < target.strike_probability;

    let impact = if won {
        chosen
    } else {
        let others: Vec<DestinationId> = catalog.others(chosen).map(|dest| dest.id).collect();
        if others.is_empty() {
            return Err(CatalogError::NoAlternative(chosen));
        }
        others[rng.gen_range(0..others.len())]
    };

    Ok(RoundOutcome {
        chosen,
        impact,
        won,
        wager,
        payout_delta: payout_delta(wager, target.payout_multiplier, won),
        roll: Some(roll),
    })
}

fn payout_delta(wager: Credits, multiplier: f64, won: bool) -> Credits {
    if won { wager.scaled(multiplier) } else { -wager }
}
