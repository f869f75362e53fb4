use anyhow::{Result, ensure};
use serde::Serialize;
use std::collections::BTreeMap;

use cosmic_launch_game::{Catalog, Credits, DestinationId, RngBundle, resolve};

use super::SeedInfo;

/// Wager used for every odds trial.
const TRIAL_WAGER_WHOLE: i64 = 10;
/// Minimum width of the acceptance band around an expected rate.
const MIN_BAND: f64 = 0.02;
/// Standard deviations tolerated before a rate is flagged.
const SIGMA_LIMIT: f64 = 4.0;

/// Raw tallies for one destination under one seed.
#[derive(Debug, Clone, Serialize)]
pub struct OddsRecord {
    pub destination: DestinationId,
    pub seed: u64,
    pub trials: usize,
    pub wins: usize,
    pub loss_impacts: BTreeMap<DestinationId, usize>,
    pub net: Credits,
}

impl OddsRecord {
    #[must_use]
    pub fn losses(&self) -> usize {
        self.trials - self.wins
    }
}

/// Per-destination summary across all seeds.
#[derive(Debug, Clone, Serialize)]
pub struct OddsAggregate {
    pub destination: DestinationId,
    pub trials: usize,
    pub strike_probability: f64,
    pub observed_win_rate: f64,
    pub win_rate_band: f64,
    pub expected_return: f64,
    pub observed_return: f64,
    /// Largest gap between any body's share of losses and the uniform share.
    pub max_spread_deviation: f64,
    pub spread_band: f64,
}

impl OddsAggregate {
    #[must_use]
    pub fn win_rate_ok(&self) -> bool {
        (self.observed_win_rate - self.strike_probability).abs() <= self.win_rate_band
    }

    #[must_use]
    pub fn spread_ok(&self) -> bool {
        self.max_spread_deviation <= self.spread_band
    }
}

/// Resolve `trials` rounds per destination for each seed.
pub fn run_odds_analysis(seeds: &[SeedInfo], trials: usize) -> Result<Vec<OddsRecord>> {
    let catalog = Catalog::standard();
    let wager = Credits::from_whole(TRIAL_WAGER_WHOLE);
    let mut records = Vec::with_capacity(seeds.len() * catalog.len());

    for info in seeds {
        let mut rng = RngBundle::from_user_seed(info.seed);
        for dest in catalog.list() {
            let mut record = OddsRecord {
                destination: dest.id,
                seed: info.seed,
                trials,
                wins: 0,
                loss_impacts: BTreeMap::new(),
                net: Credits::ZERO,
            };
            for _ in 0..trials {
                let outcome = resolve(&catalog, dest.id, wager, rng.outcome())?;
                ensure!(
                    outcome.won == (outcome.impact == outcome.chosen),
                    "won flag disagrees with impact for {}",
                    dest.id
                );
                if outcome.won {
                    record.wins += 1;
                } else {
                    *record.loss_impacts.entry(outcome.impact).or_default() += 1;
                }
                record.net += outcome.payout_delta;
            }
            log::debug!(
                "odds seed {} {}: {}/{} hits",
                info.seed,
                dest.id,
                record.wins,
                trials
            );
            records.push(record);
        }
    }

    Ok(records)
}

#[allow(clippy::cast_precision_loss)]
pub fn aggregate_odds(records: &[OddsRecord]) -> Vec<OddsAggregate> {
    let catalog = Catalog::standard();
    let mut merged: BTreeMap<DestinationId, (usize, usize, BTreeMap<DestinationId, usize>, Credits)> =
        BTreeMap::new();

    for record in records {
        let entry = merged.entry(record.destination).or_default();
        entry.0 += record.trials;
        entry.1 += record.wins;
        for (impact, count) in &record.loss_impacts {
            *entry.2.entry(*impact).or_default() += count;
        }
        entry.3 += record.net;
    }

    merged
        .into_iter()
        .filter_map(|(id, (trials, wins, impacts, net))| {
            let dest = catalog.get(id).ok()?;
            let p = dest.strike_probability;
            let n = trials.max(1) as f64;
            let losses = trials - wins;
            let others = catalog.len().saturating_sub(1).max(1) as f64;
            let uniform = 1.0 / others;
            let max_spread_deviation = if losses == 0 {
                0.0
            } else {
                catalog
                    .others(id)
                    .map(|other| {
                        let share = impacts.get(&other.id).copied().unwrap_or(0) as f64
                            / losses as f64;
                        (share - uniform).abs()
                    })
                    .fold(0.0, f64::max)
            };
            let wagered = Credits::from_whole(TRIAL_WAGER_WHOLE).as_major() * n;
            Some(OddsAggregate {
                destination: id,
                trials,
                strike_probability: p,
                observed_win_rate: wins as f64 / n,
                win_rate_band: band(p, n),
                expected_return: p * dest.payout_multiplier - (1.0 - p),
                observed_return: net.as_major() / wagered,
                max_spread_deviation,
                spread_band: band(uniform, (losses.max(1)) as f64),
            })
        })
        .collect()
}

fn band(rate: f64, samples: f64) -> f64 {
    (SIGMA_LIMIT * (rate * (1.0 - rate) / samples).sqrt()).max(MIN_BAND)
}

/// Fail when any destination's empirical odds leave their acceptance band.
pub fn validate_odds_targets(aggregates: &[OddsAggregate]) -> Result<()> {
    for agg in aggregates {
        ensure!(
            agg.win_rate_ok(),
            "{} win rate {:.4} outside {:.4} ± {:.4} over {} trials",
            agg.destination,
            agg.observed_win_rate,
            agg.strike_probability,
            agg.win_rate_band,
            agg.trials
        );
        ensure!(
            agg.spread_ok(),
            "{} loss impacts deviate from uniform by {:.4} (band {:.4})",
            agg.destination,
            agg.max_spread_deviation,
            agg.spread_band
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_covers_every_destination_per_seed() {
        let seeds = vec![SeedInfo::from_numeric(1), SeedInfo::from_numeric(2)];
        let records = run_odds_analysis(&seeds, 50).unwrap();
        assert_eq!(records.len(), 16);
        for record in &records {
            assert_eq!(record.wins + record.loss_impacts.values().sum::<usize>(), 50);
            assert!(!record.loss_impacts.contains_key(&record.destination));
        }
    }

    #[test]
    fn large_sample_passes_validation() {
        let seeds = vec![SeedInfo::from_numeric(1337)];
        let records = run_odds_analysis(&seeds, 4_000).unwrap();
        let aggregates = aggregate_odds(&records);
        assert_eq!(aggregates.len(), 8);
        validate_odds_targets(&aggregates).unwrap();
        let earth = aggregates
            .iter()
            .find(|a| a.destination == DestinationId::Earth)
            .unwrap();
        assert!((earth.expected_return - (-0.4)).abs() < 1e-9);
        assert!((earth.observed_return - earth.expected_return).abs() < 0.1);
    }

    #[test]
    fn skewed_rates_fail_validation() {
        let skewed = OddsAggregate {
            destination: DestinationId::Mars,
            trials: 10_000,
            strike_probability: 0.4,
            observed_win_rate: 0.6,
            win_rate_band: 0.02,
            expected_return: 0.0,
            observed_return: 0.0,
            max_spread_deviation: 0.0,
            spread_band: 0.02,
        };
        assert!(validate_odds_targets(&[skewed]).is_err());
    }
}
